// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// Typed rejection of a pool operation. Every failure is synchronous and
/// leaves the state untouched, with one deliberate exception: integrity
/// failures during resolution mark the request context resolved before the
/// error is returned, so the same stale context cannot be retried.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("caller is not authorized for this operation")]
    Unauthorized,
    #[error("the pool is paused")]
    SystemPaused,
    #[error("the pool is already paused")]
    AlreadyPaused,
    #[error("a batch is already open")]
    BatchAlreadyOpen,
    #[error("no batch is open")]
    BatchNotOpen,
    #[error("the current batch is still open")]
    BatchStillOpen,
    #[error("cooldown active for another {remaining}s")]
    CooldownActive { remaining: u64 },
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("decryption request was already resolved")]
    ReplayDetected,
    #[error("accumulator no longer matches the state captured at request time")]
    StateMismatch,
    #[error("unknown decryption request")]
    UnknownRequest,
    #[error("decryption result failed verification")]
    DecryptionFailed,
    #[error("caller already contributed to this batch")]
    AlreadyContributed,
    #[error("batch has no contributions")]
    NoData,
    #[error("co-processor failure: {0}")]
    Coprocessor(#[from] anyhow::Error),
}

/// Taxonomy class of a failure. Authorization, Lifecycle and Policy
/// failures are recoverable caller errors; Integrity failures are terminal
/// for the request context they concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Authorization,
    Lifecycle,
    Policy,
    Integrity,
    Data,
    Internal,
}

impl PoolError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PoolError::Unauthorized => ErrorClass::Authorization,
            PoolError::SystemPaused
            | PoolError::AlreadyPaused
            | PoolError::BatchAlreadyOpen
            | PoolError::BatchNotOpen
            | PoolError::BatchStillOpen => ErrorClass::Lifecycle,
            PoolError::CooldownActive { .. } | PoolError::InvalidArgument(_) => ErrorClass::Policy,
            PoolError::ReplayDetected
            | PoolError::StateMismatch
            | PoolError::UnknownRequest
            | PoolError::DecryptionFailed => ErrorClass::Integrity,
            PoolError::AlreadyContributed | PoolError::NoData => ErrorClass::Data,
            PoolError::Coprocessor(_) => ErrorClass::Internal,
        }
    }
}
