use std::future::Future;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::ServiceError;
use crate::models::Identity;

/// Per-operation context: who is calling, plus the cancellation token and
/// optional deadline threaded through every store and object-store call.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    pub caller: Option<Identity>,
    pub cancel: CancellationToken,
    pub deadline: Option<Instant>,
}

impl OperationContext {
    pub fn new(caller: Option<Identity>) -> Self {
        Self {
            caller,
            ..Default::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn require_caller(&self) -> Result<&Identity, ServiceError> {
        self.caller.as_ref().ok_or(ServiceError::AuthenticationRequired)
    }

    /// Caller id for log fields
    pub fn caller_label(&self) -> &str {
        self.caller.as_ref().map_or("-", |c| c.as_str())
    }

    /// Run a collaborator call, giving up when the token is cancelled or the
    /// deadline passes.
    pub async fn run<T, E, F>(&self, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ServiceError>,
    {
        if self.cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ServiceError::Cancelled),
                result = call => result.map_err(Into::into),
            }
        };
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or(Err(ServiceError::Cancelled)),
            None => guarded.await,
        }
    }
}
