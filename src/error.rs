/// Error types for calls into the host browser
use crate::tab_data::TabId;

/// A capability call that the host could not complete
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("{call} was rejected: {message}")]
    Rejected { call: &'static str, message: String },

    #[error("failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("failed to encode {what}: {message}")]
    Encode { what: &'static str, message: String },

    #[error("{0} is not available in this browser")]
    Unsupported(&'static str),
}

impl HostError {
    pub fn rejected(call: &'static str, message: impl Into<String>) -> Self {
        HostError::Rejected {
            call,
            message: message.into(),
        }
    }
}

/// One tab that failed inside a batch operation
#[derive(Debug, Clone, PartialEq)]
pub struct TabFailure {
    pub tab_id: TabId,
    pub error: HostError,
}

/// Outcome of a batch over all pinned tabs. Failures never stop the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub processed: usize,
    pub failures: Vec<TabFailure>,
}

impl BatchReport {
    pub fn record(&mut self, tab_id: TabId, result: Result<(), HostError>) {
        self.processed += 1;
        if let Err(error) = result {
            log::warn!("Tab {}: {}", tab_id, error);
            self.failures.push(TabFailure { tab_id, error });
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.processed - self.failures.len()
    }
}
