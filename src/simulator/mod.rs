pub mod plan;
pub mod run;
pub mod stage;
pub mod state;
pub mod workflow;

pub use plan::{PacingSettings, RunPlan};
pub use run::RunHandle;
pub use stage::{default_stages, stages_from_config, StageDefinition};
pub use state::{RunPhase, RunSnapshot, RunState, Settlement, Stage, StageStatus};
pub use workflow::WorkflowSimulator;
