//! Engine-level error taxonomy.

use thiserror::Error;

use crate::db::DbError;
use crate::lifecycle::TransitionError;
use crate::models::{InvalidBloodType, RequestStatus, ValidationError};

#[derive(Error, Debug)]
pub enum BloodBankError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidBloodType(#[from] InvalidBloodType),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Storage unreachable or corrupt. Reads may be retried; writes should
    /// be re-checked before retrying.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type BloodBankResult<T> = Result<T, BloodBankError>;

impl From<TransitionError> for BloodBankError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::InvalidTransition { from, to } => {
                BloodBankError::InvalidTransition { from, to }
            }
            TransitionError::Forbidden(reason) => BloodBankError::Forbidden(reason),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for BloodBankError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        BloodBankError::Storage(DbError::LockPoisoned(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_poisoned_lock_is_not_a_constraint_violation() {
        let lock = Arc::new(Mutex::new(()));
        let held = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = held.lock().unwrap();
            panic!("worker died holding the lock");
        })
        .join();

        let err = BloodBankError::from(lock.lock().unwrap_err());
        assert!(matches!(err, BloodBankError::Storage(DbError::LockPoisoned(_))));
    }
}
