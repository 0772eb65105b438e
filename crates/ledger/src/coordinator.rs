// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::PoolError;
use cipherpool_events::{BatchId, RequestId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Context recorded when a decryption is requested: which batch, and a hash
/// binding the request to the exact serialized accumulator at that moment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecryptionRequest {
    pub batch_id: BatchId,
    pub commitment: [u8; 32],
    pub resolved: bool,
}

/// Pending and resolved decryption requests. Contexts are never deleted;
/// they double as the audit trail and the replay guard. Multiple
/// outstanding requests per batch are allowed — the co-processor is treated
/// as unreliable and may need re-querying.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DecryptionCoordinator {
    requests: HashMap<RequestId, DecryptionRequest>,
}

impl DecryptionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commitment over the serialized accumulator, bound to this
    /// deployment's identity so a result cannot be replayed across
    /// instances.
    pub fn commitment(serialized: &[u8], identity: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(serialized);
        hasher.update(identity);
        hasher.finalize().into()
    }

    pub fn insert(&mut self, request_id: RequestId, batch_id: BatchId, commitment: [u8; 32]) {
        self.requests.insert(
            request_id,
            DecryptionRequest {
                batch_id,
                commitment,
                resolved: false,
            },
        );
    }

    pub fn request(&self, request_id: RequestId) -> Option<&DecryptionRequest> {
        self.requests.get(&request_id)
    }

    /// Look up the context for a callback without mutating it. Fails for
    /// unknown ids and for contexts that already reached their terminal
    /// state.
    pub fn begin_resolve(
        &self,
        request_id: RequestId,
    ) -> Result<(BatchId, [u8; 32]), PoolError> {
        let context = self
            .requests
            .get(&request_id)
            .ok_or(PoolError::UnknownRequest)?;
        if context.resolved {
            return Err(PoolError::ReplayDetected);
        }
        Ok((context.batch_id, context.commitment))
    }

    /// One-way transition; nothing ever clears the flag again.
    pub fn mark_resolved(&mut self, request_id: RequestId) {
        if let Some(context) = self.requests.get_mut(&request_id) {
            context.resolved = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_replayed_requests_are_rejected() {
        let mut coordinator = DecryptionCoordinator::new();
        let id = RequestId::new(1);
        assert!(matches!(
            coordinator.begin_resolve(id),
            Err(PoolError::UnknownRequest)
        ));

        coordinator.insert(id, BatchId::new(1), [0u8; 32]);
        assert!(coordinator.begin_resolve(id).is_ok());

        coordinator.mark_resolved(id);
        assert!(matches!(
            coordinator.begin_resolve(id),
            Err(PoolError::ReplayDetected)
        ));
        // contexts are never deleted
        assert!(coordinator.request(id).is_some());
    }

    #[test]
    fn commitment_is_bound_to_the_deployment() {
        let serialized = b"accumulator bytes";
        let a = DecryptionCoordinator::commitment(serialized, &[1u8; 32]);
        let b = DecryptionCoordinator::commitment(serialized, &[2u8; 32]);
        assert_ne!(a, b);
        assert_eq!(a, DecryptionCoordinator::commitment(serialized, &[1u8; 32]));
    }
}
