// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CiphertextHandle;
use anyhow::Result;
use cipherpool_events::RequestId;

/// Interface to the external encryption co-processor. The pool core treats
/// every ciphertext as opaque: the only arithmetic is `add`, and decryption
/// is asynchronous — `request_decryption` returns a correlation id and the
/// result arrives later through the pool's resolve entry point, where
/// `verify_proof` gates acceptance.
pub trait Coprocessor: Send + Sync {
    /// Encode a plaintext value as a fresh ciphertext.
    fn encode(&self, value: u64) -> Result<CiphertextHandle>;

    /// Homomorphically add two ciphertexts.
    fn add(&self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> Result<CiphertextHandle>;

    /// Serialize a ciphertext for commitment hashing and transport.
    fn serialize(&self, ciphertext: &CiphertextHandle) -> Result<Vec<u8>>;

    /// Hand a serialized aggregate to the co-processor for decryption.
    /// Returns immediately with the request id; there is no guarantee the
    /// co-processor ever calls back.
    fn request_decryption(&self, ciphertext: Vec<u8>) -> Result<RequestId>;

    /// Verify the proof accompanying a decryption result for `request_id`.
    fn verify_proof(&self, request_id: RequestId, cleartext: &[u8], proof: &[u8]) -> Result<bool>;
}
