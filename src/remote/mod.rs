//! Remote document store: list, save, load, and delete named XML documents
//!
//! [`RemoteStore`] is the seam between the editor and wherever documents are
//! persisted. [`HttpStore`] talks to the JSON API, [`MemoryStore`] keeps
//! documents in process for offline use. Calls are packaged as
//! [`RemoteRequest`]s so they can run on the [`RemoteWorker`] thread and come
//! back as [`RemoteCompletion`]s.

pub mod http;
pub mod memory;
pub mod worker;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use worker::RemoteWorker;

/// Failure reported by a remote store call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("server rejected request ({status}): {reason}")]
    Rejected { status: u16, reason: String },
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Persistence collaborator for named XML documents
pub trait RemoteStore: Send + Sync {
    /// Names of all stored documents
    fn list(&self) -> RemoteResult<Vec<String>>;

    /// Store `content` under `filename`, replacing any existing document
    fn save(&self, filename: &str, content: &str) -> RemoteResult<()>;

    /// Fetch the text of a stored document
    fn load(&self, filename: &str) -> RemoteResult<String>;

    /// Remove a stored document
    fn delete(&self, filename: &str) -> RemoteResult<()>;
}

/// A remote call to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    List,
    Save { filename: String, content: String },
    Load { filename: String },
    Delete { filename: String },
}

impl RemoteOp {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteOp::List => "list",
            RemoteOp::Save { .. } => "save",
            RemoteOp::Load { .. } => "load",
            RemoteOp::Delete { .. } => "delete",
        }
    }
}

/// A remote call tagged with the id used to match its completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub id: u64,
    pub op: RemoteOp,
}

/// Result of a remote call, per operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    Listed(RemoteResult<Vec<String>>),
    Saved {
        filename: String,
        result: RemoteResult<()>,
    },
    Loaded {
        filename: String,
        result: RemoteResult<String>,
    },
    Deleted {
        filename: String,
        result: RemoteResult<()>,
    },
}

impl RemoteOutcome {
    /// The error carried by this outcome, if the call failed
    #[cfg(test)]
    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            RemoteOutcome::Listed(result) => result.as_ref().err(),
            RemoteOutcome::Saved { result, .. } | RemoteOutcome::Deleted { result, .. } => {
                result.as_ref().err()
            }
            RemoteOutcome::Loaded { result, .. } => result.as_ref().err(),
        }
    }
}

/// A finished remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCompletion {
    pub id: u64,
    pub outcome: RemoteOutcome,
}

impl RemoteRequest {
    /// Perform the call against `store`
    pub fn execute(self, store: &dyn RemoteStore) -> RemoteCompletion {
        tracing::debug!("Remote {} (request {})", self.op.name(), self.id);
        let outcome = match self.op {
            RemoteOp::List => RemoteOutcome::Listed(store.list()),
            RemoteOp::Save { filename, content } => {
                let result = store.save(&filename, &content);
                RemoteOutcome::Saved { filename, result }
            }
            RemoteOp::Load { filename } => {
                let result = store.load(&filename);
                RemoteOutcome::Loaded { filename, result }
            }
            RemoteOp::Delete { filename } => {
                let result = store.delete(&filename);
                RemoteOutcome::Deleted { filename, result }
            }
        };
        RemoteCompletion {
            id: self.id,
            outcome,
        }
    }

    /// Complete the call with `error` without contacting the store
    pub fn fail(self, error: RemoteError) -> RemoteCompletion {
        let outcome = match self.op {
            RemoteOp::List => RemoteOutcome::Listed(Err(error)),
            RemoteOp::Save { filename, .. } => RemoteOutcome::Saved {
                filename,
                result: Err(error),
            },
            RemoteOp::Load { filename } => RemoteOutcome::Loaded {
                filename,
                result: Err(error),
            },
            RemoteOp::Delete { filename } => RemoteOutcome::Deleted {
                filename,
                result: Err(error),
            },
        };
        RemoteCompletion {
            id: self.id,
            outcome,
        }
    }
}
