pub mod state_writer;
pub mod vault_reader;
