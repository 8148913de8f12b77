pub mod backend;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod repl;
pub mod simulator;
pub mod utils;

pub use errors::HyperMailError;
