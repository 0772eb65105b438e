// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::PoolError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Action kinds throttled independently per account, so a submission
/// cooldown does not block a decryption request by the same account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Submit,
    RequestDecryption,
}

/// Per-address, per-action-kind minimum-interval enforcement. One global
/// owner-settable duration is shared by all kinds; timestamps are tracked
/// per (account, kind).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CooldownThrottle {
    cooldown_secs: u64,
    last_action: HashMap<(Address, ActionKind), u64>,
}

impl CooldownThrottle {
    pub fn new(cooldown_secs: u64) -> Result<Self, PoolError> {
        if cooldown_secs == 0 {
            return Err(PoolError::InvalidArgument("cooldown must be positive"));
        }
        Ok(Self {
            cooldown_secs,
            last_action: HashMap::new(),
        })
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown_secs
    }

    pub fn set_cooldown(&mut self, cooldown_secs: u64) -> Result<(), PoolError> {
        if cooldown_secs == 0 {
            return Err(PoolError::InvalidArgument("cooldown must be positive"));
        }
        self.cooldown_secs = cooldown_secs;
        Ok(())
    }

    /// Pure window check; does not consume the slot. Operations call this
    /// before any fallible work so a rejection elsewhere never burns the
    /// caller's cooldown.
    pub fn check(&self, account: Address, kind: ActionKind, now: u64) -> Result<(), PoolError> {
        if let Some(&last) = self.last_action.get(&(account, kind)) {
            let ready_at = last.saturating_add(self.cooldown_secs);
            if now < ready_at {
                return Err(PoolError::CooldownActive {
                    remaining: ready_at - now,
                });
            }
        }
        Ok(())
    }

    /// Record a successful action of `kind` at `now`.
    pub fn record(&mut self, account: Address, kind: ActionKind, now: u64) {
        self.last_action.insert((account, kind), now);
    }

    /// Check and consume in one step. Callers must only invoke this once
    /// the surrounding operation is otherwise guaranteed to succeed.
    pub fn check_and_record(
        &mut self,
        account: Address,
        kind: ActionKind,
        now: u64,
    ) -> Result<(), PoolError> {
        self.check(account, kind, now)?;
        self.record(account, kind, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn rejects_zero_cooldown() {
        assert!(matches!(
            CooldownThrottle::new(0),
            Err(PoolError::InvalidArgument(_))
        ));
        let mut throttle = CooldownThrottle::new(60).unwrap();
        assert!(throttle.set_cooldown(0).is_err());
        assert_eq!(throttle.cooldown_secs(), 60);
    }

    #[test]
    fn window_closes_and_reopens() {
        let mut throttle = CooldownThrottle::new(60).unwrap();
        throttle.check_and_record(addr(1), ActionKind::Submit, 0).unwrap();

        let err = throttle.check(addr(1), ActionKind::Submit, 30).unwrap_err();
        assert!(matches!(err, PoolError::CooldownActive { remaining: 30 }));

        assert!(throttle.check(addr(1), ActionKind::Submit, 61).is_ok());
    }

    #[test]
    fn kinds_are_tracked_independently() {
        let mut throttle = CooldownThrottle::new(60).unwrap();
        throttle.record(addr(1), ActionKind::Submit, 0);
        assert!(throttle
            .check(addr(1), ActionKind::RequestDecryption, 1)
            .is_ok());
        // and so are accounts
        assert!(throttle.check(addr(2), ActionKind::Submit, 1).is_ok());
    }

    #[test]
    fn failed_check_does_not_consume_the_slot() {
        let mut throttle = CooldownThrottle::new(100).unwrap();
        throttle.check_and_record(addr(1), ActionKind::Submit, 0).unwrap();
        assert!(throttle
            .check_and_record(addr(1), ActionKind::Submit, 50)
            .is_err());
        // window still measured from t=0, not t=50
        assert!(throttle.check(addr(1), ActionKind::Submit, 101).is_ok());
    }
}
