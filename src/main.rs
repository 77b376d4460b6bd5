use clap::{Parser, Subcommand, ValueEnum};
use dropin::application::engine::{DropInEngine, FlowUpdate};
use dropin::application::resume::ExternalResponse;
use dropin::application::sources::FlowSources;
use dropin::domain::outcome::{FlowErrorKind, FlowOutcome};
use dropin::domain::payment_method::{PaymentMethodKind, PaymentMethodReference};
use dropin::domain::ports::KeyValueStoreRef;
use dropin::domain::request::{DropInRequest, SelectionIntent};
use dropin::domain::state::{FlowState, StartHint};
use dropin::infrastructure::in_memory::InMemoryKeyValueStore;
#[cfg(feature = "storage-rocksdb")]
use dropin::infrastructure::rocksdb::RocksDBStore;
use dropin::infrastructure::simulated::{
    ScriptedRedirect, ScriptedTokenizer, StaticDeviceData, StaticVault, StaticWalletReadiness,
};
use dropin::interfaces::config::load_request_file;
use dropin::interfaces::csv::state_writer::StateWriter;
use dropin::interfaces::csv::vault_reader::VaultReader;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with the drop-in request configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs one selection with scripted flow sources
    Checkout {
        #[arg(long)]
        brand: PaymentMethodKind,

        /// What the brand's flow source answers
        #[arg(long, value_enum, default_value_t = Scripted::Success)]
        result: Scripted,

        #[arg(long)]
        token: Option<String>,

        #[arg(long)]
        network_tokenized: bool,

        /// What the step-up challenge answers
        #[arg(long, value_enum, default_value_t = Scripted::Success)]
        step_up: Scripted,
    },
    /// Delivers an external response to a flow left by an earlier `checkout`
    Resume {
        #[arg(long)]
        identity: Uuid,

        #[arg(long)]
        brand: PaymentMethodKind,

        #[arg(long, value_enum, default_value_t = Scripted::Success)]
        result: Scripted,

        #[arg(long)]
        token: Option<String>,
    },
    /// Prints how the selection surface would open
    LastUsed {
        #[arg(long)]
        wallet_ready: bool,
    },
    /// Prints the customer's most recent payment method
    Recent {
        /// Vaulted payment methods CSV
        #[arg(long)]
        vault: Option<PathBuf>,

        #[arg(long)]
        wallet_ready: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scripted {
    Success,
    Cancel,
    Error,
}

impl Scripted {
    fn outcome(self, reference: PaymentMethodReference) -> FlowOutcome {
        match self {
            Scripted::Success => FlowOutcome::success(reference),
            Scripted::Cancel => FlowOutcome::Cancel,
            Scripted::Error => FlowOutcome::error(FlowErrorKind::NetworkError, "scripted failure"),
        }
    }
}

fn scripted_reference(
    brand: PaymentMethodKind,
    token: Option<String>,
    network_tokenized: bool,
) -> PaymentMethodReference {
    let token = token.unwrap_or_else(|| format!("tok_{}", brand));
    match brand {
        PaymentMethodKind::WalletPay => {
            PaymentMethodReference::wallet_pay(token, network_tokenized)
        }
        kind => PaymentMethodReference::new(kind, token),
    }
}

fn open_store(db_path: Option<PathBuf>) -> Result<KeyValueStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => Ok(Arc::new(RocksDBStore::open(db_path).into_diagnostic()?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryKeyValueStore::new()))
        }
        None => Ok(Arc::new(InMemoryKeyValueStore::new())),
    }
}

/// Card and wallet tokenize in-process; PayPal and Venmo leave the process.
fn scripted_sources(
    brand: PaymentMethodKind,
    outcome: FlowOutcome,
    step_up: FlowOutcome,
) -> FlowSources {
    let mut sources = FlowSources::new(Arc::new(ScriptedTokenizer::new(step_up)))
        .redirect(PaymentMethodKind::PayPal, Arc::new(ScriptedRedirect::new()))
        .redirect(PaymentMethodKind::Venmo, Arc::new(ScriptedRedirect::new()));
    if matches!(brand, PaymentMethodKind::Card | PaymentMethodKind::WalletPay) {
        sources = sources.in_process(brand, Arc::new(ScriptedTokenizer::new(outcome)));
    }
    sources
}

fn write_states(states: &[FlowState]) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = StateWriter::new(stdout.lock());
    writer.write_states(states).into_diagnostic()
}

async fn drain(mut updates: mpsc::UnboundedReceiver<FlowUpdate>) -> Vec<FlowState> {
    let mut states = Vec::new();
    while let Some(update) = updates.recv().await {
        if let FlowUpdate::State(state) = update {
            states.push(state);
        }
    }
    states
}

fn hint_label(hint: &StartHint) -> String {
    match hint {
        StartHint::ReissueWalletPay => "reissue_wallet_pay".to_string(),
        StartHint::Preselect(kind) => format!("preselect:{}", kind),
        StartHint::ShowSelection => "show_selection".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let request = match &cli.config {
        Some(path) => load_request_file(path).into_diagnostic()?,
        None => DropInRequest::default(),
    };
    let store = open_store(cli.db_path)?;

    match cli.command {
        Command::Checkout {
            brand,
            result,
            token,
            network_tokenized,
            step_up,
        } => {
            let reference = scripted_reference(brand, token, network_tokenized);
            let assertion = PaymentMethodReference::new(brand, "tok_step_up_assertion");
            let sources =
                scripted_sources(brand, result.outcome(reference), step_up.outcome(assertion));

            let (tx, rx) = mpsc::unbounded_channel();
            let engine = DropInEngine::new(request, sources, store)
                .with_device_data(Arc::new(StaticDeviceData::new(
                    Uuid::new_v4().simple().to_string(),
                )))
                .with_updates(tx);

            let hint = engine.prepare().await.into_diagnostic()?;
            tracing::info!(hint = %hint_label(&hint), "Selection surface ready");

            let Some(intent) = SelectionIntent::for_kind(brand) else {
                return Err(miette::miette!("{} cannot be selected for checkout", brand));
            };
            engine.select(intent).await.into_diagnostic()?;

            drop(engine);
            write_states(&drain(rx).await)?;
        }
        Command::Resume {
            identity,
            brand,
            result,
            token,
        } => {
            let reference = scripted_reference(brand, token, false);
            let response = ExternalResponse {
                request_identity: identity,
                brand,
                outcome: result.outcome(reference),
            };

            let (tx, rx) = mpsc::unbounded_channel();
            let sources = FlowSources::new(Arc::new(ScriptedTokenizer::new(FlowOutcome::Cancel)));
            let engine = DropInEngine::new(request, sources, store)
                .with_updates(tx)
                .restore()
                .await
                .into_diagnostic()?;
            engine.resume(response).await.into_diagnostic()?;

            drop(engine);
            write_states(&drain(rx).await)?;
        }
        Command::LastUsed { wallet_ready } => {
            let sources = FlowSources::new(Arc::new(ScriptedTokenizer::new(FlowOutcome::Cancel)));
            let engine = DropInEngine::new(request, sources, store)
                .with_wallet_readiness(Arc::new(StaticWalletReadiness::new(wallet_ready)));
            let hint = engine.prepare().await.into_diagnostic()?;
            println!("{}", hint_label(&hint));
        }
        Command::Recent {
            vault,
            wallet_ready,
        } => {
            let mut methods = Vec::new();
            if let Some(path) = vault {
                let file = File::open(path).into_diagnostic()?;
                for method in VaultReader::new(file).payment_methods() {
                    match method {
                        Ok(method) => methods.push(method),
                        Err(e) => eprintln!("Error reading payment method: {}", e),
                    }
                }
            }

            let sources = FlowSources::new(Arc::new(ScriptedTokenizer::new(FlowOutcome::Cancel)));
            let engine = DropInEngine::new(request, sources, store)
                .with_wallet_readiness(Arc::new(StaticWalletReadiness::new(wallet_ready)))
                .with_vault(Arc::new(StaticVault::new(methods)));
            let recent = engine
                .most_recent_payment_method()
                .await
                .map_err(|failure| miette::miette!("{}", failure))?;

            let kind = recent.kind.map(|k| k.to_string()).unwrap_or_default();
            let token = recent
                .reference
                .as_ref()
                .map(|r| r.token().to_string())
                .unwrap_or_default();
            println!("kind,token");
            println!("{},{}", kind, token);
        }
    }

    Ok(())
}
