pub mod commands;
pub mod companies;
pub mod context;
pub mod generate;
pub mod send;
pub mod simulate;
pub mod start;
pub mod validate;

pub use commands::{Cli, Commands};
pub use context::AppContext;
