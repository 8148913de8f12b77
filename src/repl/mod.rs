pub mod commands;
pub mod completer;
pub mod events;
pub mod progress;
pub mod renderer;
pub mod session;

pub use events::SimulatorEvent;
pub use progress::GenerationProgress;
pub use session::ReplSession;
