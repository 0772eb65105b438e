// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A rejected operation, published for observers. The synchronous typed
/// error returned to the caller remains the source of truth; this is the
/// observability side channel.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct PoolFault {
    pub scope: FaultScope,
    pub message: String,
}

/// Subsystem in which a fault originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultScope {
    Access,
    Throttle,
    Batch,
    Decryption,
    Coprocessor,
}

impl PoolFault {
    pub fn new(scope: FaultScope, message: &str) -> Self {
        Self {
            scope,
            message: message.to_string(),
        }
    }
}

impl Display for PoolFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
