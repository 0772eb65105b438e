// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::PoolError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Owner, provider set and pause flag for one deployment. The owner is
/// fixed at construction; only the owner mutates the provider set and the
/// pause flag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessRegistry {
    owner: Address,
    providers: HashSet<Address>,
    paused: bool,
}

impl AccessRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            providers: HashSet::new(),
            paused: false,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_provider(&self, address: Address) -> bool {
        self.providers.contains(&address)
    }

    pub fn providers(&self) -> Vec<Address> {
        let mut providers: Vec<Address> = self.providers.iter().copied().collect();
        providers.sort();
        providers
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn require_owner(&self, caller: Address) -> Result<(), PoolError> {
        if caller != self.owner {
            return Err(PoolError::Unauthorized);
        }
        Ok(())
    }

    pub fn require_provider(&self, caller: Address) -> Result<(), PoolError> {
        if !self.providers.contains(&caller) {
            return Err(PoolError::Unauthorized);
        }
        Ok(())
    }

    /// Gate for every mutating operation outside the registry itself.
    pub fn require_active(&self) -> Result<(), PoolError> {
        if self.paused {
            return Err(PoolError::SystemPaused);
        }
        Ok(())
    }

    /// Idempotent: re-adding an existing provider is not an error.
    pub fn add_provider(&mut self, address: Address) {
        self.providers.insert(address);
    }

    /// Idempotent: removing an unknown provider is not an error.
    pub fn remove_provider(&mut self, address: Address) {
        self.providers.remove(&address);
    }

    pub fn pause(&mut self) -> Result<(), PoolError> {
        if self.paused {
            return Err(PoolError::AlreadyPaused);
        }
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn owner_and_provider_gates() {
        let mut registry = AccessRegistry::new(addr(1));
        assert!(registry.require_owner(addr(1)).is_ok());
        assert!(matches!(
            registry.require_owner(addr(2)),
            Err(PoolError::Unauthorized)
        ));

        registry.add_provider(addr(2));
        assert!(registry.require_provider(addr(2)).is_ok());
        assert!(matches!(
            registry.require_provider(addr(3)),
            Err(PoolError::Unauthorized)
        ));
        // the owner is not implicitly a provider
        assert!(registry.require_provider(addr(1)).is_err());
    }

    #[test]
    fn membership_is_idempotent() {
        let mut registry = AccessRegistry::new(addr(1));
        registry.add_provider(addr(2));
        registry.add_provider(addr(2));
        assert_eq!(registry.providers(), vec![addr(2)]);

        registry.remove_provider(addr(2));
        registry.remove_provider(addr(2));
        assert!(registry.providers().is_empty());
    }

    #[test]
    fn pause_guards_double_pause_only() {
        let mut registry = AccessRegistry::new(addr(1));
        assert!(registry.require_active().is_ok());

        registry.pause().unwrap();
        assert!(matches!(registry.pause(), Err(PoolError::AlreadyPaused)));
        assert!(matches!(
            registry.require_active(),
            Err(PoolError::SystemPaused)
        ));

        registry.unpause();
        registry.unpause(); // no guard on unpause
        assert!(registry.require_active().is_ok());
    }
}
