// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod access;
mod actor;
mod batch;
mod clock;
mod coordinator;
mod error;
mod pool;
mod throttle;

pub use access::*;
pub use actor::*;
pub use batch::*;
pub use clock::*;
pub use coordinator::*;
pub use error::*;
pub use pool::*;
pub use throttle::*;
