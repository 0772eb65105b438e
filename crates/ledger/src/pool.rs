// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    AccessRegistry, ActionKind, Batch, BatchLedger, CooldownThrottle, DecryptionCoordinator,
    DecryptionRequest, PoolError,
};
use alloy_primitives::Address;
use cipherpool_coprocessor::{CiphertextHandle, Coprocessor};
use cipherpool_events::{
    BatchClosed, BatchId, BatchOpened, ContributionSubmitted, CooldownChanged,
    DecryptionCompleted, DecryptionRequested, Paused, ProviderAdded, ProviderRemoved, RequestId,
    Unpaused,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one deployment owns: access control, throttle, batch records
/// and pending decryption requests, plus the per-deployment identity that
/// commitments are bound to.
///
/// Every public method runs to completion as one atomic unit: all fallible
/// steps (including co-processor calls) happen before the first mutation,
/// so a rejection leaves every map and counter exactly as it was. The one
/// deliberate exception is resolution, where a failed verification marks
/// the request context resolved before the error is returned.
pub struct PoolState {
    registry: AccessRegistry,
    throttle: CooldownThrottle,
    ledger: BatchLedger,
    coordinator: DecryptionCoordinator,
    identity: [u8; 32],
    coprocessor: Arc<dyn Coprocessor>,
}

impl PoolState {
    pub fn new(
        owner: Address,
        cooldown_secs: u64,
        identity: [u8; 32],
        coprocessor: Arc<dyn Coprocessor>,
    ) -> Result<Self, PoolError> {
        Ok(Self {
            registry: AccessRegistry::new(owner),
            throttle: CooldownThrottle::new(cooldown_secs)?,
            ledger: BatchLedger::new(),
            coordinator: DecryptionCoordinator::new(),
            identity,
            coprocessor,
        })
    }

    //////////////////////////////////////////////////////////////////////
    // Owner operations
    //////////////////////////////////////////////////////////////////////

    pub fn add_provider(
        &mut self,
        caller: Address,
        address: Address,
    ) -> Result<ProviderAdded, PoolError> {
        self.registry.require_owner(caller)?;
        self.registry.add_provider(address);
        info!(provider = %address, "Provider added");
        Ok(ProviderAdded { address })
    }

    pub fn remove_provider(
        &mut self,
        caller: Address,
        address: Address,
    ) -> Result<ProviderRemoved, PoolError> {
        self.registry.require_owner(caller)?;
        self.registry.remove_provider(address);
        info!(provider = %address, "Provider removed");
        Ok(ProviderRemoved { address })
    }

    pub fn set_cooldown(
        &mut self,
        caller: Address,
        cooldown_secs: u64,
    ) -> Result<CooldownChanged, PoolError> {
        self.registry.require_owner(caller)?;
        self.throttle.set_cooldown(cooldown_secs)?;
        Ok(CooldownChanged { cooldown_secs })
    }

    pub fn pause(&mut self, caller: Address) -> Result<Paused, PoolError> {
        self.registry.require_owner(caller)?;
        self.registry.pause()?;
        warn!("Pool paused");
        Ok(Paused)
    }

    pub fn unpause(&mut self, caller: Address) -> Result<Unpaused, PoolError> {
        self.registry.require_owner(caller)?;
        self.registry.unpause();
        info!("Pool unpaused");
        Ok(Unpaused)
    }

    pub fn open_batch(&mut self, caller: Address) -> Result<BatchOpened, PoolError> {
        self.registry.require_owner(caller)?;
        self.registry.require_active()?;
        if self.ledger.is_open() {
            return Err(PoolError::BatchAlreadyOpen);
        }
        let zero = self.coprocessor.encode(0)?;
        let batch_id = self.ledger.open(zero)?;
        info!(batch_id = %batch_id, "Batch opened");
        Ok(BatchOpened { batch_id })
    }

    pub fn close_batch(&mut self, caller: Address) -> Result<BatchClosed, PoolError> {
        self.registry.require_owner(caller)?;
        self.registry.require_active()?;
        let batch_id = self.ledger.close()?;
        info!(batch_id = %batch_id, "Batch closed");
        Ok(BatchClosed { batch_id })
    }

    //////////////////////////////////////////////////////////////////////
    // Provider operations
    //////////////////////////////////////////////////////////////////////

    pub fn submit_contribution(
        &mut self,
        caller: Address,
        ciphertext: CiphertextHandle,
        now: u64,
    ) -> Result<ContributionSubmitted, PoolError> {
        self.registry.require_active()?;
        self.registry.require_provider(caller)?;
        self.ledger.ensure_can_contribute(caller)?;
        self.throttle.check(caller, ActionKind::Submit, now)?;

        // The homomorphic add is the only place ciphertext contents are
        // touched, and it happens before any state mutation.
        let current = self
            .ledger
            .current()
            .ok_or(PoolError::BatchNotOpen)?
            .accumulator
            .clone();
        let folded = self.coprocessor.add(&current, &ciphertext)?;

        let batch_id = self.ledger.record_contribution(caller, folded)?;
        self.throttle.record(caller, ActionKind::Submit, now);
        info!(provider = %caller, batch_id = %batch_id, "Contribution submitted");
        Ok(ContributionSubmitted {
            provider: caller,
            batch_id,
        })
    }

    pub fn request_decryption(
        &mut self,
        caller: Address,
        now: u64,
    ) -> Result<DecryptionRequested, PoolError> {
        self.registry.require_active()?;
        self.registry.require_provider(caller)?;
        if self.ledger.is_open() {
            return Err(PoolError::BatchStillOpen);
        }
        let batch_id = self.ledger.current_id();
        let batch = self.ledger.current().ok_or(PoolError::NoData)?;
        if batch.contributor_count == 0 {
            return Err(PoolError::NoData);
        }
        self.throttle
            .check(caller, ActionKind::RequestDecryption, now)?;

        let serialized = self.coprocessor.serialize(&batch.accumulator)?;
        let commitment = DecryptionCoordinator::commitment(&serialized, &self.identity);
        let request_id = self.coprocessor.request_decryption(serialized)?;

        self.coordinator.insert(request_id, batch_id, commitment);
        self.throttle
            .record(caller, ActionKind::RequestDecryption, now);
        info!(request_id = %request_id, batch_id = %batch_id, "Decryption requested");
        Ok(DecryptionRequested {
            request_id,
            batch_id,
        })
    }

    //////////////////////////////////////////////////////////////////////
    // Co-processor callback
    //////////////////////////////////////////////////////////////////////

    /// Callable by anyone: the callback identity is not authenticated.
    /// Acceptance rests entirely on the commitment recheck and the proof.
    pub fn resolve_decryption(
        &mut self,
        request_id: RequestId,
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<DecryptionCompleted, PoolError> {
        let (batch_id, commitment) = self.coordinator.begin_resolve(request_id)?;

        let Some(batch) = self.ledger.batch(batch_id) else {
            self.coordinator.mark_resolved(request_id);
            return Err(PoolError::StateMismatch);
        };
        let serialized = self.coprocessor.serialize(&batch.accumulator)?;
        let recomputed = DecryptionCoordinator::commitment(&serialized, &self.identity);

        // A failed verification is terminal for this context: retrying
        // against the same stale state cannot succeed, so the caller must
        // issue a fresh request.
        if recomputed != commitment {
            self.coordinator.mark_resolved(request_id);
            warn!(request_id = %request_id, batch_id = %batch_id, "Accumulator drifted since request");
            return Err(PoolError::StateMismatch);
        }

        if !self.coprocessor.verify_proof(request_id, cleartext, proof)? {
            self.coordinator.mark_resolved(request_id);
            warn!(request_id = %request_id, batch_id = %batch_id, "Decryption proof rejected");
            return Err(PoolError::DecryptionFailed);
        }

        let Ok(result_bytes) = <[u8; 8]>::try_from(cleartext) else {
            self.coordinator.mark_resolved(request_id);
            return Err(PoolError::DecryptionFailed);
        };
        let result = u64::from_le_bytes(result_bytes);

        self.coordinator.mark_resolved(request_id);
        info!(request_id = %request_id, batch_id = %batch_id, result, "Decryption completed");
        Ok(DecryptionCompleted {
            request_id,
            batch_id,
            result,
        })
    }

    //////////////////////////////////////////////////////////////////////
    // Read-only accessors
    //////////////////////////////////////////////////////////////////////

    pub fn owner(&self) -> Address {
        self.registry.owner()
    }

    pub fn is_provider(&self, address: Address) -> bool {
        self.registry.is_provider(address)
    }

    pub fn providers(&self) -> Vec<Address> {
        self.registry.providers()
    }

    pub fn is_paused(&self) -> bool {
        self.registry.is_paused()
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.throttle.cooldown_secs()
    }

    pub fn current_batch_id(&self) -> BatchId {
        self.ledger.current_id()
    }

    pub fn is_batch_open(&self) -> bool {
        self.ledger.is_open()
    }

    pub fn batch(&self, id: BatchId) -> Option<&Batch> {
        self.ledger.batch(id)
    }

    pub fn request(&self, request_id: RequestId) -> Option<&DecryptionRequest> {
        self.coordinator.request(request_id)
    }

    pub fn is_resolved(&self, request_id: RequestId) -> Option<bool> {
        self.coordinator
            .request(request_id)
            .map(|context| context.resolved)
    }

    #[cfg(test)]
    pub(crate) fn ledger_mut(&mut self) -> &mut BatchLedger {
        &mut self.ledger
    }
}
