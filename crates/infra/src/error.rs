//! Service-level error: either a compliance rule rejected the request or a store
//! failed underneath it.

use thiserror::Error;
use tracing::{error, warn};

use fueleu_compliance::ComplianceError;
use fueleu_core::DomainError;

use crate::store::StoreError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Compliance(#[from] ComplianceError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        EngineError::Compliance(value.into())
    }
}

impl EngineError {
    /// The underlying compliance error, if this is a rule violation.
    pub fn as_compliance(&self) -> Option<&ComplianceError> {
        match self {
            EngineError::Compliance(e) => Some(e),
            EngineError::Store(_) => None,
        }
    }

    /// True for invariant breaches (engine defects) and store failures, which
    /// are not the caller's fault.
    pub fn is_internal(&self) -> bool {
        match self {
            EngineError::Compliance(e) => e.is_defect(),
            EngineError::Store(_) => true,
        }
    }

    /// Log a failed operation: rejections at `warn`, defects and store
    /// failures at `error`.
    pub(crate) fn trace(&self, operation: &'static str) {
        match self {
            EngineError::Compliance(e) if e.is_defect() => {
                error!(operation, code = e.code(), defect = true, error = %e, "invariant breach");
            }
            EngineError::Compliance(e) => {
                warn!(operation, code = e.code(), error = %e, "request rejected");
            }
            EngineError::Store(e) => {
                error!(operation, error = %e, "store failure");
            }
        }
    }
}

/// Log the error of a failed service result and pass it through unchanged.
pub(crate) fn traced<T>(operation: &'static str, result: EngineResult<T>) -> EngineResult<T> {
    if let Err(e) = &result {
        e.trace(operation);
    }
    result
}
