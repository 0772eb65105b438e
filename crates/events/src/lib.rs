// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod batch_id;
mod event_id;
mod eventbus;
mod pool_event;
mod request_id;
mod traits;

pub use batch_id::*;
pub use event_id::*;
pub use eventbus::*;
pub use pool_event::*;
pub use request_id::*;
pub use traits::*;
