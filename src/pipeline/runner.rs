//! Sequential analysis runner.
//!
//! Executes the declared checks strictly in order, awaiting each executor to
//! completion before the next. The runner is the single writer of the shared
//! [`AnalysisState`]; every mutation is followed by a publish on a watch
//! channel so observers can render progress. Cancellation is cooperative:
//! the flag is observed at the top of each iteration, an in-flight check is
//! allowed to finish.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::github::RepoContentProvider;
use crate::pipeline::check::{AnalysisCheck, CheckContext};
use crate::pipeline::checks::canonical_checks;
use crate::pipeline::state::{
    AnalysisState, AnalysisStatus, CheckArtifact, CheckOutcome, CheckResult, CheckStatus,
};

pub struct AnalysisRunner {
    provider: Arc<dyn RepoContentProvider>,
    checks: Vec<Box<dyn AnalysisCheck>>,
    cancel: CancellationToken,
    state_tx: watch::Sender<AnalysisState>,
}

impl AnalysisRunner {
    /// Runner over the canonical check list.
    pub fn new(provider: Arc<dyn RepoContentProvider>) -> Self {
        Self::with_checks(provider, canonical_checks())
    }

    /// Runner over an explicit check list (tests and embedding hosts).
    pub fn with_checks(
        provider: Arc<dyn RepoContentProvider>,
        checks: Vec<Box<dyn AnalysisCheck>>,
    ) -> Self {
        let (state_tx, _) = watch::channel(AnalysisState::new(String::new()));
        Self {
            provider,
            checks,
            cancel: CancellationToken::new(),
            state_tx,
        }
    }

    /// Observe state snapshots as the run progresses.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.state_tx.subscribe()
    }

    /// Token an external party may cancel; observed between checks.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The declared plan: (id, title, required) in execution order.
    pub fn plan(&self) -> Vec<(&'static str, &'static str, bool)> {
        self.checks
            .iter()
            .map(|c| (c.id(), c.title(), c.required()))
            .collect()
    }

    /// Run one full analysis and return the final state.
    pub async fn run(&self, repo_url: &str, release_tag: Option<&str>) -> AnalysisState {
        let mut state = AnalysisState::new(repo_url);
        // Seed the full plan as pending so observers see it immediately.
        for check in &self.checks {
            state.checks.insert(
                check.id().to_string(),
                CheckResult::pending(check.id(), check.title(), check.required()),
            );
        }
        self.publish(&state);

        state.status = AnalysisStatus::Analyzing;
        self.publish(&state);
        tracing::info!(repo = repo_url, checks = self.checks.len(), "analysis started");

        let ctx = CheckContext {
            provider: self.provider.as_ref(),
            repo_url,
            release_tag,
        };

        for check in &self.checks {
            if self.cancel.is_cancelled() {
                tracing::info!(next_check = check.id(), "analysis cancelled");
                state.status = AnalysisStatus::Cancelled;
                self.publish(&state);
                return state;
            }

            let id = check.id();
            if let Some(result) = state.checks.get_mut(id) {
                result.status = CheckStatus::Running;
            }
            self.publish(&state);

            let snapshot = state.clone();
            let started = Instant::now();
            let outcome = check.execute(&ctx, &snapshot).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let success = outcome.success;
            self.apply_outcome(&mut state, check.as_ref(), outcome, duration_ms);
            self.publish(&state);
            tracing::debug!(check = id, success, duration_ms, "check finished");

            if !success && check.required() {
                tracing::error!(check = id, "required check failed, stopping analysis");
                state.status = AnalysisStatus::Error;
                self.publish(&state);
                return state;
            }
        }

        state.status = AnalysisStatus::Completed;
        self.publish(&state);
        tracing::info!(repo = repo_url, "analysis completed");
        state
    }

    // The mutation funnel: the only place check outcomes touch shared state.
    fn apply_outcome(
        &self,
        state: &mut AnalysisState,
        check: &dyn AnalysisCheck,
        outcome: CheckOutcome,
        duration_ms: u64,
    ) {
        let CheckOutcome {
            success,
            errors,
            warnings,
            artifact,
        } = outcome;

        let error_summary = (!errors.is_empty()).then(|| errors.join("; "));
        let warning_summary = (!warnings.is_empty()).then(|| warnings.join("; "));
        state.errors.extend(errors);
        state.warnings.extend(warnings);

        match artifact {
            Some(CheckArtifact::Repo(repo)) => state.repo_info = Some(repo),
            Some(CheckArtifact::ToolYamlPath(path)) => state.tool_yaml_path = Some(path),
            Some(CheckArtifact::ToolSpec(spec)) => state.tool_spec = Some(spec),
            Some(CheckArtifact::Citation(citation)) => state.citation = Some(citation),
            Some(CheckArtifact::License(license)) => state.license = Some(license),
            Some(CheckArtifact::Metadata(metadata)) => state.metadata = Some(*metadata),
            None => {}
        }

        if let Some(result) = state.checks.get_mut(check.id()) {
            result.status = if success {
                CheckStatus::Completed
            } else {
                CheckStatus::Failed
            };
            result.error = error_summary;
            result.warning = warning_summary;
            result.duration_ms = Some(duration_ms);
        }
        state.progress = check.progress();
    }

    fn publish(&self, state: &AnalysisState) {
        self.state_tx.send_replace(state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::github::RepoInfo;
    use async_trait::async_trait;

    // Provider that refuses everything; scripted checks below never call it.
    struct NullProvider;

    #[async_trait]
    impl RepoContentProvider for NullProvider {
        async fn resolve_repo(&self, identifier: &str) -> Result<RepoInfo, ProviderError> {
            Err(ProviderError::NotFound(identifier.to_string()))
        }

        async fn file_exists(&self, _repo: &RepoInfo, path: &str) -> Result<bool, ProviderError> {
            Err(ProviderError::NotFound(path.to_string()))
        }

        async fn fetch_file(&self, _repo: &RepoInfo, path: &str) -> Result<String, ProviderError> {
            Err(ProviderError::NotFound(path.to_string()))
        }
    }

    struct ScriptedCheck {
        id: &'static str,
        required: bool,
        succeed: bool,
    }

    #[async_trait]
    impl AnalysisCheck for ScriptedCheck {
        fn id(&self) -> &'static str {
            self.id
        }

        fn title(&self) -> &'static str {
            "scripted"
        }

        fn required(&self) -> bool {
            self.required
        }

        fn progress(&self) -> u8 {
            50
        }

        async fn execute(
            &self,
            _ctx: &CheckContext<'_>,
            _snapshot: &AnalysisState,
        ) -> CheckOutcome {
            if self.succeed {
                CheckOutcome::ok()
            } else {
                CheckOutcome::failed("scripted failure")
            }
        }
    }

    fn runner(checks: Vec<Box<dyn AnalysisCheck>>) -> AnalysisRunner {
        AnalysisRunner::with_checks(Arc::new(NullProvider), checks)
    }

    #[tokio::test]
    async fn required_failure_short_circuits_and_leaves_rest_pending() {
        let runner = runner(vec![
            Box::new(ScriptedCheck {
                id: "first",
                required: true,
                succeed: false,
            }),
            Box::new(ScriptedCheck {
                id: "second",
                required: true,
                succeed: true,
            }),
        ]);

        let state = runner.run("owner/repo", None).await;
        assert_eq!(state.status, AnalysisStatus::Error);
        assert!(state.can_retry());
        assert_eq!(state.checks["first"].status, CheckStatus::Failed);
        assert_eq!(state.checks["second"].status, CheckStatus::Pending);
        assert_eq!(state.errors, vec!["scripted failure"]);
    }

    #[tokio::test]
    async fn optional_failure_continues_to_completion() {
        let runner = runner(vec![
            Box::new(ScriptedCheck {
                id: "optional",
                required: false,
                succeed: false,
            }),
            Box::new(ScriptedCheck {
                id: "last",
                required: true,
                succeed: true,
            }),
        ]);

        let state = runner.run("owner/repo", None).await;
        assert_eq!(state.status, AnalysisStatus::Completed);
        assert_eq!(state.checks["optional"].status, CheckStatus::Failed);
        assert_eq!(state.checks["last"].status, CheckStatus::Completed);
        // Failure text is retained even though the run completed.
        assert_eq!(state.errors, vec!["scripted failure"]);
    }

    #[tokio::test]
    async fn cancellation_is_observed_between_checks() {
        let runner = runner(vec![Box::new(ScriptedCheck {
            id: "never-runs",
            required: true,
            succeed: true,
        })]);
        runner.cancellation_token().cancel();

        let state = runner.run("owner/repo", None).await;
        assert_eq!(state.status, AnalysisStatus::Cancelled);
        assert!(state.can_retry());
        assert_eq!(state.checks["never-runs"].status, CheckStatus::Pending);
    }

    #[tokio::test]
    async fn watch_subscribers_see_the_final_state() {
        let runner = runner(vec![Box::new(ScriptedCheck {
            id: "only",
            required: true,
            succeed: true,
        })]);
        let rx = runner.subscribe();

        let state = runner.run("owner/repo", None).await;
        assert_eq!(state.status, AnalysisStatus::Completed);
        assert_eq!(rx.borrow().status, AnalysisStatus::Completed);
    }
}
