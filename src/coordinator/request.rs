use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::{BackendClient, Company, CompanyProfile, GeneratedEmail, SendReceipt};
use crate::config::SenderConfig;
use crate::errors::HyperMailError;
use crate::simulator::{RunHandle, StageDefinition, WorkflowSimulator};
use super::workspace::{DraftWorkspace, MISSING_COMPANY_MESSAGE};

pub const GENERATE_FAILED_MESSAGE: &str = "Failed to generate email";
pub const FIND_FAILED_MESSAGE: &str = "Failed to find companies";
pub const SEND_FAILED_MESSAGE: &str = "Failed to send email";
pub const GENERATE_ABANDONED_MESSAGE: &str = "Email generation was cancelled";

/// Runs user actions against the backend and keeps the draft workspace.
///
/// Email generation starts the workflow simulator alongside the real request
/// and settles it once the request comes back.
pub struct RequestCoordinator {
    backend: Arc<dyn BackendClient>,
    simulator: WorkflowSimulator,
    stages: Vec<StageDefinition>,
    sender: Option<SenderConfig>,
    workspace: RwLock<DraftWorkspace>,
    /// Bumped by every generation; only the latest one may touch the draft.
    generation: AtomicU64,
}

impl RequestCoordinator {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        simulator: WorkflowSimulator,
        stages: Vec<StageDefinition>,
        sender: Option<SenderConfig>,
    ) -> Self {
        let workspace = DraftWorkspace::with_sender_defaults(sender.as_ref());
        Self {
            backend,
            simulator,
            stages,
            sender,
            workspace: RwLock::new(workspace),
            generation: AtomicU64::new(0),
        }
    }

    pub fn simulator(&self) -> &WorkflowSimulator {
        &self.simulator
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    pub async fn workspace(&self) -> DraftWorkspace {
        self.workspace.read().await.clone()
    }

    /// Apply a manual edit to the draft.
    pub async fn edit<F: FnOnce(&mut DraftWorkspace)>(&self, f: F) {
        let mut ws = self.workspace.write().await;
        f(&mut ws);
    }

    pub async fn clear(&self) {
        self.workspace.write().await.clear_draft(self.sender.as_ref());
    }

    pub async fn generate_email(&self, company_name: &str) -> Result<GeneratedEmail, HyperMailError> {
        let company = company_name.trim();
        if company.is_empty() {
            self.workspace.write().await.error = Some(MISSING_COMPANY_MESSAGE.to_string());
            return Err(HyperMailError::MissingInput(MISSING_COMPANY_MESSAGE.to_string()));
        }

        let ticket = {
            let mut ws = self.workspace.write().await;
            ws.company_name = company.to_string();
            ws.error = None;
            ws.is_loading = true;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let run = self.simulator.start(company, &self.stages).await;
        info!(company, run_id = %run.run_id(), backend = self.backend.backend_name(), "Generating email");

        let result = self.backend.generate_email(company).await;
        // Settle this request's own run; a superseded run is already torn down
        run.settle(result.is_ok()).await;

        let mut ws = self.workspace.write().await;
        let current = self.generation.load(Ordering::SeqCst) == ticket;
        if current {
            ws.is_loading = false;
        } else {
            debug!(company, run_id = %run.run_id(), "Superseded generation finished, draft left alone");
        }
        match result {
            Ok(generated) => {
                info!(company, chars = generated.email.len(), "Email generated");
                if current {
                    ws.store_generated(&generated.email);
                }
                Ok(generated)
            }
            Err(e) => {
                warn!(company, error = %e, "Email generation failed");
                let err = HyperMailError::request_failed(GENERATE_FAILED_MESSAGE, e);
                if current {
                    ws.error = Some(err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Give up on an in-flight generation whose task was aborted: tear the
    /// run down and release the draft.
    pub async fn abandon_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.simulator.teardown().await;
        let mut ws = self.workspace.write().await;
        ws.is_loading = false;
        ws.error = Some(GENERATE_ABANDONED_MESSAGE.to_string());
        info!(company = %ws.company_name, "Email generation abandoned");
    }

    pub async fn find_companies(&self, profile: CompanyProfile) -> Result<Vec<Company>, HyperMailError> {
        let profile = profile.with_defaults();
        {
            let mut ws = self.workspace.write().await;
            ws.error = None;
            ws.is_loading = true;
        }
        info!(industry = %profile.industry, location = %profile.location, "Finding companies");

        let result = self.backend.find_companies(&profile).await;

        let mut ws = self.workspace.write().await;
        ws.is_loading = false;
        match result {
            Ok(companies) => {
                info!(count = companies.len(), "Companies found");
                ws.companies = companies.clone();
                Ok(companies)
            }
            Err(e) => {
                warn!(error = %e, "Company search failed");
                let err = HyperMailError::request_failed(FIND_FAILED_MESSAGE, e);
                ws.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Use company `index` (0-based) from the last search as the target.
    pub async fn select_company(&self, index: usize) -> Result<Company, HyperMailError> {
        let mut ws = self.workspace.write().await;
        let Some(company) = ws.companies.get(index).cloned() else {
            let err = HyperMailError::InvalidSelection(format!(
                "no company at position {} ({} listed)",
                index + 1,
                ws.companies.len()
            ));
            ws.error = Some(err.to_string());
            return Err(err);
        };
        ws.company_name = company.name.clone();
        if !company.email.trim().is_empty() {
            ws.to = company.email.clone();
        }
        ws.error = None;
        info!(company = %company.name, "Company selected");
        Ok(company)
    }

    pub async fn send_email(&self) -> Result<SendReceipt, HyperMailError> {
        let outgoing = {
            let mut ws = self.workspace.write().await;
            match ws.to_outgoing() {
                Ok(outgoing) => {
                    ws.error = None;
                    ws.is_loading = true;
                    outgoing
                }
                Err(e) => {
                    ws.error = Some(e.to_string());
                    return Err(e);
                }
            }
        };
        info!(to = %outgoing.to_email, subject = %outgoing.subject, "Sending email");

        let result = self.backend.send_email(&outgoing).await;

        let mut ws = self.workspace.write().await;
        ws.is_loading = false;
        match result {
            Ok(receipt) => {
                info!(to = %outgoing.to_email, "Email sent");
                Ok(receipt)
            }
            Err(e) => {
                warn!(to = %outgoing.to_email, error = %e, "Email delivery failed");
                let err = HyperMailError::request_failed(SEND_FAILED_MESSAGE, e);
                ws.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Feedback is only recorded in the log.
    pub fn submit_feedback(&self, text: &str) -> Result<(), HyperMailError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(HyperMailError::MissingInput("Please write some feedback first".into()));
        }
        info!(feedback = text, "Feedback submitted");
        Ok(())
    }

    /// Tear the progress run down; call when the view showing it goes away.
    pub async fn close_progress_view(&self) {
        self.simulator.teardown().await;
    }

    pub async fn active_run(&self) -> Option<RunHandle> {
        self.simulator.active_run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use async_trait::async_trait;
    use crate::backend::OutgoingEmail;
    use crate::simulator::{default_stages, PacingSettings, Settlement, StageStatus};

    #[derive(Default)]
    struct MockBackend {
        fail: bool,
        delay: Duration,
        /// Overrides `delay` for specific companies.
        company_delays: Vec<(&'static str, Duration)>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BackendClient for MockBackend {
        async fn find_companies(&self, _profile: &CompanyProfile) -> Result<Vec<Company>, HyperMailError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(HyperMailError::Network("HTTP 500".into()));
            }
            Ok(vec![
                Company { name: "Acme".into(), email: "hi@acme.io".into(), ..Default::default() },
                Company { name: "Initech".into(), ..Default::default() },
            ])
        }

        async fn generate_email(&self, company_name: &str) -> Result<GeneratedEmail, HyperMailError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self
                .company_delays
                .iter()
                .find(|(name, _)| *name == company_name)
                .map(|(_, d)| *d)
                .unwrap_or(self.delay);
            tokio::time::sleep(delay).await;
            if self.fail {
                return Err(HyperMailError::MalformedResponse("empty body".into()));
            }
            Ok(GeneratedEmail { email: format!("Dear {}", company_name) })
        }

        async fn send_email(&self, _email: &OutgoingEmail) -> Result<SendReceipt, HyperMailError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(HyperMailError::Timeout("60s".into()));
            }
            Ok(SendReceipt { raw: serde_json::json!({"status": "sent"}) })
        }

        fn backend_name(&self) -> &str {
            "mock"
        }
    }

    fn coordinator(backend: Arc<MockBackend>) -> RequestCoordinator {
        let settings = PacingSettings { seed: Some(7), ..Default::default() };
        RequestCoordinator::new(backend, WorkflowSimulator::new(settings), default_stages(), None)
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_company_rejected_before_network() {
        let backend = Arc::new(MockBackend::default());
        let coord = coordinator(backend.clone());
        let err = coord.generate_email("   ").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a company name");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(coord.active_run().await.is_none());
        assert_eq!(coord.workspace().await.error.as_deref(), Some("Please enter a company name"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_fills_body_and_settles_run() {
        let backend = Arc::new(MockBackend { delay: Duration::from_millis(1500), ..Default::default() });
        let coord = coordinator(backend);
        let generated = coord.generate_email(" Acme ").await.unwrap();
        assert_eq!(generated.email, "Dear Acme");

        let ws = coord.workspace().await;
        assert_eq!(ws.body, "Dear Acme");
        assert_eq!(ws.company_name, "Acme");
        assert!(!ws.is_loading);

        let run = coord.active_run().await.unwrap();
        run.wait_finished().await;
        let snap = run.snapshot().await;
        assert_eq!(snap.overall_progress, 100);
        assert!(!snap.failed);
        assert!(snap.stages.iter().all(|s| s.status == StageStatus::Completed));
        coord.close_progress_view().await;
        assert!(run.is_torn_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_failure_stores_generic_message() {
        let backend = Arc::new(MockBackend { fail: true, ..Default::default() });
        let coord = coordinator(backend);
        let err = coord.generate_email("Acme").await.unwrap_err();
        assert_eq!(err.to_string(), GENERATE_FAILED_MESSAGE);

        let ws = coord.workspace().await;
        assert_eq!(ws.error.as_deref(), Some(GENERATE_FAILED_MESSAGE));
        assert!(ws.generated_email.is_none());
        assert!(!ws.is_loading);

        let run = coord.active_run().await.unwrap();
        run.wait_finished().await;
        assert!(run.snapshot().await.failed);
    }

    #[tokio::test]
    async fn test_find_and_select_company() {
        let coord = coordinator(Arc::new(MockBackend::default()));
        let companies = coord.find_companies(CompanyProfile::default()).await.unwrap();
        assert_eq!(companies.len(), 2);

        let picked = coord.select_company(0).await.unwrap();
        assert_eq!(picked.name, "Acme");
        let ws = coord.workspace().await;
        assert_eq!(ws.company_name, "Acme");
        assert_eq!(ws.to, "hi@acme.io");

        let err = coord.select_company(5).await.unwrap_err();
        assert!(matches!(err, HyperMailError::InvalidSelection(_)));
    }

    #[tokio::test]
    async fn test_find_failure_is_generic() {
        let coord = coordinator(Arc::new(MockBackend { fail: true, ..Default::default() }));
        let err = coord.find_companies(CompanyProfile::default()).await.unwrap_err();
        assert_eq!(err.to_string(), FIND_FAILED_MESSAGE);
        assert!(coord.workspace().await.companies.is_empty());
    }

    #[tokio::test]
    async fn test_send_validates_before_network() {
        let backend = Arc::new(MockBackend::default());
        let coord = coordinator(backend.clone());
        coord.edit(|ws| ws.to = "nobody".into()).await;
        assert!(coord.send_email().await.is_err());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

        coord
            .edit(|ws| {
                ws.to = "ceo@acme.io".into();
                ws.subject = "Hello".into();
                ws.body = "Body".into();
            })
            .await;
        let receipt = coord.send_email().await.unwrap();
        assert_eq!(receipt.raw["status"], "sent");
    }

    #[tokio::test]
    async fn test_send_failure_is_generic() {
        let coord = coordinator(Arc::new(MockBackend { fail: true, ..Default::default() }));
        coord
            .edit(|ws| {
                ws.to = "ceo@acme.io".into();
                ws.subject = "Hello".into();
                ws.body = "Body".into();
            })
            .await;
        let err = coord.send_email().await.unwrap_err();
        assert_eq!(err.to_string(), SEND_FAILED_MESSAGE);
        assert_eq!(err.classify().exit_code, 4);
    }

    #[test]
    fn test_feedback_requires_text() {
        let coord = coordinator(Arc::new(MockBackend::default()));
        assert!(coord.submit_feedback("  ").is_err());
        assert!(coord.submit_feedback("Great tone").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_generation_leaves_newer_run_alone() {
        let backend = Arc::new(MockBackend {
            company_delays: vec![
                ("First", Duration::from_secs(2)),
                ("Second", Duration::from_secs(10)),
            ],
            ..Default::default()
        });
        let coord = Arc::new(coordinator(backend));

        let first = tokio::spawn({
            let coord = coord.clone();
            async move { coord.generate_email("First").await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        let second = tokio::spawn({
            let coord = coord.clone();
            async move { coord.generate_email("Second").await }
        });

        let first_email = first.await.unwrap().unwrap();
        assert_eq!(first_email.email, "Dear First");

        let run = coord.active_run().await.unwrap();
        let snapshot = run.snapshot().await;
        assert_eq!(snapshot.label, "Second");
        assert!(snapshot.settlement.is_none());
        assert!(!run.is_finished());

        let ws = coord.workspace().await;
        assert!(ws.is_loading);
        assert_eq!(ws.company_name, "Second");
        assert!(ws.generated_email.is_none());
        assert!(!ws.body.contains("Dear First"));

        second.await.unwrap().unwrap();
        let ws = coord.workspace().await;
        assert!(!ws.is_loading);
        assert_eq!(ws.body, "Dear Second");
        assert_eq!(run.snapshot().await.settlement, Some(Settlement::Success));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_generation_releases_draft() {
        let backend = Arc::new(MockBackend { delay: Duration::from_secs(600), ..Default::default() });
        let coord = Arc::new(coordinator(backend));
        let request = tokio::spawn({
            let coord = coord.clone();
            async move { coord.generate_email("Acme").await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        let run = coord.active_run().await.unwrap();
        assert!(coord.workspace().await.is_loading);

        request.abort();
        coord.abandon_generation().await;

        let ws = coord.workspace().await;
        assert!(!ws.is_loading);
        assert_eq!(ws.error.as_deref(), Some(GENERATE_ABANDONED_MESSAGE));
        assert!(run.is_torn_down());
        assert!(coord.active_run().await.is_none());
    }
}
