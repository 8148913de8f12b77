use uuid::Uuid;

/// Messages sent from the workflow simulator to the terminal for live display.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatorEvent {
    /// A new run was created
    RunStarted {
        run_id: Uuid,
        label: String,
        stage_names: Vec<String>,
    },
    /// A stage began animating
    StageStarted {
        run_id: Uuid,
        index: usize,
        display_name: String,
    },
    /// A status line was appended to a stage
    MessageAppended {
        run_id: Uuid,
        index: usize,
        message: String,
    },
    /// Stage and overall percentages moved
    ProgressUpdated {
        run_id: Uuid,
        index: usize,
        stage_progress: u8,
        overall_progress: u8,
    },
    /// A stage reached 100%
    StageCompleted {
        run_id: Uuid,
        index: usize,
        display_name: String,
        overall_progress: u8,
    },
    /// A stage was stopped by a failed request (freeze policy)
    StageErrored {
        run_id: Uuid,
        index: usize,
        display_name: String,
    },
    /// The real request came back
    RunSettled {
        run_id: Uuid,
        success: bool,
    },
    /// Every stage is done, or the run froze on failure
    RunFinished {
        run_id: Uuid,
        failed: bool,
    },
    /// Informational log message
    Log {
        message: String,
    },
}

impl SimulatorEvent {
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::StageStarted { run_id, .. }
            | Self::MessageAppended { run_id, .. }
            | Self::ProgressUpdated { run_id, .. }
            | Self::StageCompleted { run_id, .. }
            | Self::StageErrored { run_id, .. }
            | Self::RunSettled { run_id, .. }
            | Self::RunFinished { run_id, .. } => Some(*run_id),
            Self::Log { .. } => None,
        }
    }
}
