//! Remote operations of the Expensio backend.
//!
//! One file per endpoint, all issued through the shared [`Gateway`].

pub mod login;
pub mod me;
pub mod register;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::http::{ApiRequest, Gateway};

/// Auth API client. Cheap to clone.
#[derive(Clone)]
pub struct AuthApi {
    gateway: Arc<Gateway>,
    cancel: Option<CancellationToken>,
}

impl AuthApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            cancel: None,
        }
    }

    /// A copy whose requests are abandoned once `cancel` fires.
    ///
    /// Views pass their navigation token here so a response arriving after
    /// the user has moved on is dropped.
    pub fn scoped(&self, cancel: CancellationToken) -> Self {
        Self {
            gateway: self.gateway.clone(),
            cancel: Some(cancel),
        }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    fn prepare(&self, request: ApiRequest) -> ApiRequest {
        match &self.cancel {
            Some(token) => request.cancel_on(token.clone()),
            None => request,
        }
    }
}
