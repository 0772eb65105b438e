// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextHandle, Coprocessor};
use anyhow::{anyhow, bail, Context, Result};
use cipherpool_events::RequestId;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

/// Additive co-processor stand-in for tests and local development. The
/// "ciphertext" is the unsafe little-endian plaintext, so it provides no
/// confidentiality whatsoever; proofs are a keyed hash over the request id
/// and cleartext. Tests play the co-processor role through [`fulfil`].
///
/// [`fulfil`]: MockCoprocessor::fulfil
pub struct MockCoprocessor {
    key: [u8; 32],
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    next_request: u64,
    pending: HashMap<RequestId, Vec<u8>>,
}

impl MockCoprocessor {
    pub fn new() -> Self {
        Self {
            key: Sha256::digest(b"cipherpool mock coprocessor").into(),
            state: Mutex::new(MockState::default()),
        }
    }

    fn decode(ciphertext: &[u8]) -> Result<u64> {
        let bytes: [u8; 8] = ciphertext
            .try_into()
            .context("mock ciphertext must be 8 bytes")?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn proof_for(&self, request_id: RequestId, cleartext: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(request_id.value().to_le_bytes());
        hasher.update(cleartext);
        hasher.finalize().to_vec()
    }

    /// Complete a pending request, returning the cleartext and a valid
    /// proof, as the real co-processor would deliver them to the callback.
    pub fn fulfil(&self, request_id: RequestId) -> Result<(Vec<u8>, Vec<u8>)> {
        let cleartext = {
            let state = self.state.lock().map_err(|_| anyhow!("mock lock poisoned"))?;
            state
                .pending
                .get(&request_id)
                .cloned()
                .ok_or_else(|| anyhow!("no pending request {request_id}"))?
        };
        let proof = self.proof_for(request_id, &cleartext);
        Ok((cleartext, proof))
    }
}

impl Default for MockCoprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Coprocessor for MockCoprocessor {
    fn encode(&self, value: u64) -> Result<CiphertextHandle> {
        Ok(CiphertextHandle::from_bytes(value.to_le_bytes().to_vec()))
    }

    fn add(&self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> Result<CiphertextHandle> {
        let sum = Self::decode(lhs)?.wrapping_add(Self::decode(rhs)?);
        Ok(CiphertextHandle::from_bytes(sum.to_le_bytes().to_vec()))
    }

    fn serialize(&self, ciphertext: &CiphertextHandle) -> Result<Vec<u8>> {
        Ok(ciphertext.extract_bytes())
    }

    fn request_decryption(&self, ciphertext: Vec<u8>) -> Result<RequestId> {
        if ciphertext.len() != 8 {
            bail!("mock ciphertext must be 8 bytes");
        }
        let mut state = self.state.lock().map_err(|_| anyhow!("mock lock poisoned"))?;
        state.next_request += 1;
        let request_id = RequestId::new(state.next_request);
        state.pending.insert(request_id, ciphertext);
        Ok(request_id)
    }

    fn verify_proof(&self, request_id: RequestId, cleartext: &[u8], proof: &[u8]) -> Result<bool> {
        Ok(self.proof_for(request_id, cleartext) == proof)
    }
}
