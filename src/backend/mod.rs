pub mod client;
pub mod http;
pub mod types;

pub use client::BackendClient;
pub use http::HttpBackend;
pub use types::{Company, CompanyProfile, GeneratedEmail, OutgoingEmail, SendReceipt};
