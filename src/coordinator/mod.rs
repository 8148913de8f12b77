pub mod request;
pub mod workspace;

pub use request::{RequestCoordinator, GENERATE_ABANDONED_MESSAGE};
pub use workspace::{DraftWorkspace, EMAIL_PLACEHOLDER, MISSING_COMPANY_MESSAGE};
