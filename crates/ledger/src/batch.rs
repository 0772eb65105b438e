// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::PoolError;
use alloy_primitives::Address;
use cipherpool_coprocessor::CiphertextHandle;
use cipherpool_events::BatchId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One contribution epoch: the running encrypted accumulator and who has
/// already folded a value into it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Batch {
    pub accumulator: CiphertextHandle,
    pub contributor_count: u64,
    pub contributors: HashSet<Address>,
}

impl Batch {
    fn new(zero: CiphertextHandle) -> Self {
        Self {
            accumulator: zero,
            contributor_count: 0,
            contributors: HashSet::new(),
        }
    }

    pub fn has_contributed(&self, address: Address) -> bool {
        self.contributors.contains(&address)
    }
}

/// Sequential batch records plus the open flag for the current one. Ids
/// only advance on open; closed batches stay readable forever.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchLedger {
    current_id: BatchId,
    open: bool,
    batches: HashMap<BatchId, Batch>,
}

impl BatchLedger {
    pub fn new() -> Self {
        Self {
            current_id: BatchId::GENESIS,
            open: false,
            batches: HashMap::new(),
        }
    }

    pub fn current_id(&self) -> BatchId {
        self.current_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn batch(&self, id: BatchId) -> Option<&Batch> {
        self.batches.get(&id)
    }

    /// The batch at the current id, if one was ever opened.
    pub fn current(&self) -> Option<&Batch> {
        self.batches.get(&self.current_id)
    }

    /// Advance to a fresh batch seeded with the encoded-zero accumulator.
    pub fn open(&mut self, zero: CiphertextHandle) -> Result<BatchId, PoolError> {
        if self.open {
            return Err(PoolError::BatchAlreadyOpen);
        }
        self.current_id = self.current_id.next();
        self.batches.insert(self.current_id, Batch::new(zero));
        self.open = true;
        Ok(self.current_id)
    }

    /// Close the current batch. The id is not advanced here; advancing
    /// happens only on the next open.
    pub fn close(&mut self) -> Result<BatchId, PoolError> {
        if !self.open {
            return Err(PoolError::BatchNotOpen);
        }
        self.open = false;
        Ok(self.current_id)
    }

    /// Everything that must hold before a contribution is folded. Called
    /// before the homomorphic add so a rejection mutates nothing.
    pub fn ensure_can_contribute(&self, provider: Address) -> Result<(), PoolError> {
        if !self.open {
            return Err(PoolError::BatchNotOpen);
        }
        match self.current() {
            Some(batch) if batch.has_contributed(provider) => Err(PoolError::AlreadyContributed),
            Some(_) => Ok(()),
            None => Err(PoolError::BatchNotOpen),
        }
    }

    /// Commit a folded accumulator for `provider`. Re-validates the
    /// preconditions so the commit cannot silently diverge from the check.
    pub fn record_contribution(
        &mut self,
        provider: Address,
        folded: CiphertextHandle,
    ) -> Result<BatchId, PoolError> {
        self.ensure_can_contribute(provider)?;
        let id = self.current_id;
        let batch = self.batches.get_mut(&id).ok_or(PoolError::BatchNotOpen)?;
        batch.accumulator = folded;
        batch.contributor_count += 1;
        batch.contributors.insert(provider);
        Ok(id)
    }

    /// Test hook for simulating accumulator drift under a pending request.
    #[cfg(test)]
    pub(crate) fn overwrite_accumulator(&mut self, id: BatchId, accumulator: CiphertextHandle) {
        if let Some(batch) = self.batches.get_mut(&id) {
            batch.accumulator = accumulator;
        }
    }
}

impl Default for BatchLedger {
    fn default() -> Self {
        Self::new()
    }
}
