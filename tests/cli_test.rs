use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_card_checkout() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["checkout", "--brand", "card", "--token", "tok_visa"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("step,state,kind,detail"))
        .stdout(predicate::str::contains("1,dispatching,card,"))
        .stdout(predicate::str::contains("2,finalizing,card,tok_visa"))
        .stdout(predicate::str::contains("3,terminal,success:card,tok_visa"));

    Ok(())
}

#[test]
fn test_cli_step_up_from_config() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["--config", "tests/fixtures/request.json"])
        .args(["checkout", "--brand", "card", "--step-up", "cancel"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2,awaiting_step_up,card,tok_card"))
        .stdout(predicate::str::contains("3,terminal,canceled,user_canceled"));

    Ok(())
}

#[test]
fn test_cli_network_tokenized_wallet_skips_step_up() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["--config", "tests/fixtures/request.json"]).args([
        "checkout",
        "--brand",
        "wallet-pay",
        "--network-tokenized",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("awaiting_step_up").not())
        .stdout(predicate::str::contains("terminal,success:wallet_pay,tok_wallet_pay"));

    Ok(())
}

#[test]
fn test_cli_redirect_checkout_waits() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["checkout", "--brand", "paypal"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2,awaiting_external_resume,paypal,"))
        .stdout(predicate::str::contains("terminal").not());

    Ok(())
}

#[test]
fn test_cli_card_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["checkout", "--brand", "card", "--result", "error"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2,terminal,error,network_error"));

    Ok(())
}

#[test]
fn test_cli_recent_from_vault() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["--config", "tests/fixtures/request.json"])
        .args(["recent", "--vault", "tests/fixtures/vault.csv"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("paypal,tok_vaulted_paypal"));

    Ok(())
}

#[test]
fn test_cli_recent_requires_client_token() {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["recent", "--vault", "tests/fixtures/vault.csv"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("client token"));
}

#[test]
fn test_cli_rejects_unknown_brand() {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["checkout", "--brand", "bitcoin"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown payment method kind"));
}

#[test]
fn test_cli_last_used_without_history() {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["last-used"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("show_selection"));
}
