use std::fmt;

use thiserror::Error;

use crate::domain::CatalogError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} not set")]
    MissingVariable(&'static str),

    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid denomination catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Could not create HTTP client: {0}")]
    HttpClient(String),
}

/// Why an outbound call was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The server answered with a status outside 200/201/204.
    UnexpectedStatus,
    /// Connection refused, timeout, TLS error and the like.
    Transport(String),
    /// The server accepted the call but the body broke the contract.
    MalformedResponse(String),
}

/// Everything the operator needs to diagnose or redo a failed call by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub url: String,
    pub payload: Option<serde_json::Value>,
    pub status: Option<u16>,
    pub body: String,
    pub cause: FailureCause,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            FailureCause::UnexpectedStatus => write!(f, "unexpected HTTP status")?,
            FailureCause::Transport(reason) => write!(f, "request failed: {}", reason)?,
            FailureCause::MalformedResponse(reason) => {
                write!(f, "malformed response: {}", reason)?
            }
        }
        write!(f, "\n  URL: {}", self.url)?;
        if let Some(payload) = &self.payload {
            let pretty =
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
            write!(f, "\n  JSON content sent: {}", pretty)?;
        }
        if let Some(status) = self.status {
            write!(f, "\n  HTTP status code: {}", status)?;
        }
        if !self.body.is_empty() {
            write!(f, "\n  HTTP response content: {}", self.body)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Operator name is required before submitting")]
    MissingOperator,

    #[error("This submission already ran ({state}), start a new one to count again")]
    WorkflowAlreadyRun { state: &'static str },

    #[error("Count submission failed, nothing was recorded: {0}")]
    Submission(Diagnostic),

    #[error("Count was recorded at {record_url} but printing failed: {diagnostic}")]
    PrintTrigger {
        record_url: String,
        diagnostic: Diagnostic,
    },
}

impl AppError {
    /// The call diagnostic, for failures that reached the network.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            AppError::Submission(diagnostic) => Some(diagnostic),
            AppError::PrintTrigger { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }

    /// True when the count reached the accounting API despite the error.
    pub fn count_recorded(&self) -> bool {
        matches!(self, AppError::PrintTrigger { .. })
    }
}
