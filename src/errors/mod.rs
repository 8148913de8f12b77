pub mod types;
pub mod classification;

pub use types::HyperMailError;
pub use classification::ErrorClassification;
