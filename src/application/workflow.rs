use tracing::{error, info, warn};

use super::{AppError, CountingApi, Diagnostic};
use crate::domain::Session;

/// Suffix appended to a record URL to reach its print trigger.
pub const PRINT_SUFFIX: &str = "print/";

/// Where a submission stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Submitting,
    Submitted { record_url: String },
    Printing { record_url: String },
    Done { record_url: String },
    Failed(FailedStep),
}

/// Which step a failed workflow stopped at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailedStep {
    Submission(Diagnostic),
    Print {
        record_url: String,
        diagnostic: Diagnostic,
    },
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Done { .. } | WorkflowState::Failed(_))
    }

    fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Submitting => "submitting",
            WorkflowState::Submitted { .. } => "submitted",
            WorkflowState::Printing { .. } => "printing",
            WorkflowState::Done { .. } => "done",
            WorkflowState::Failed(_) => "failed",
        }
    }
}

/// Result of a completed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub record_url: String,
    pub print_url: String,
}

/// Print trigger URL for a created record.
/// Example: "https://x/record/1/" -> "https://x/record/1/print/"
pub fn print_url_for(record_url: &str) -> String {
    if record_url.ends_with('/') {
        format!("{}{}", record_url, PRINT_SUFFIX)
    } else {
        format!("{}/{}", record_url, PRINT_SUFFIX)
    }
}

/// Drives one session through count submission and print trigger.
///
/// The session is borrowed for the whole run, so it cannot be edited while
/// a submission is in flight. Nothing is retried: a failed workflow stays
/// failed and a new one has to be started by hand.
pub struct SubmissionWorkflow<A> {
    api: A,
    printer: Option<String>,
    state: WorkflowState,
    history: Vec<WorkflowState>,
}

impl<A: CountingApi> SubmissionWorkflow<A> {
    pub fn new(api: A, printer: Option<String>) -> Self {
        Self {
            api,
            printer,
            state: WorkflowState::Idle,
            history: vec![WorkflowState::Idle],
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Every state visited so far, starting with `Idle`.
    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Submit the session's count, then trigger the receipt print.
    ///
    /// Returns `MissingOperator` without touching the network when the
    /// operator name is blank; the workflow stays `Idle` in that case and may
    /// be run again. Once it has left `Idle` it never runs again.
    pub async fn run(&mut self, session: &Session) -> Result<SubmissionOutcome, AppError> {
        if self.state != WorkflowState::Idle {
            warn!(
                state = self.state.name(),
                terminal = self.state.is_terminal(),
                "refusing to run workflow again"
            );
            return Err(AppError::WorkflowAlreadyRun {
                state: self.state.name(),
            });
        }

        let Some(submission) = session.submission() else {
            return Err(AppError::MissingOperator);
        };

        self.transition(WorkflowState::Submitting);
        let record = match self.api.submit_count(&submission).await {
            Ok(record) => record,
            Err(diagnostic) => {
                error!(%diagnostic, "count submission failed");
                self.transition(WorkflowState::Failed(FailedStep::Submission(
                    diagnostic.clone(),
                )));
                return Err(AppError::Submission(diagnostic));
            }
        };
        let record_url = record.url;
        self.transition(WorkflowState::Submitted {
            record_url: record_url.clone(),
        });

        let print_url = print_url_for(&record_url);
        self.transition(WorkflowState::Printing {
            record_url: record_url.clone(),
        });
        if let Err(diagnostic) = self
            .api
            .trigger_print(&print_url, self.printer.as_deref())
            .await
        {
            error!(
                %diagnostic,
                record_url = %record_url,
                "print trigger failed, count is recorded"
            );
            self.transition(WorkflowState::Failed(FailedStep::Print {
                record_url: record_url.clone(),
                diagnostic: diagnostic.clone(),
            }));
            return Err(AppError::PrintTrigger {
                record_url,
                diagnostic,
            });
        }

        self.transition(WorkflowState::Done {
            record_url: record_url.clone(),
        });
        Ok(SubmissionOutcome {
            record_url,
            print_url,
        })
    }

    fn transition(&mut self, next: WorkflowState) {
        info!(from = self.state.name(), to = next.name(), "workflow transition");
        self.history.push(next.clone());
        self.state = next;
    }
}
