// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod batch_closed;
mod batch_opened;
mod contribution_submitted;
mod cooldown_changed;
mod decryption_completed;
mod decryption_requested;
mod paused;
mod pool_fault;
mod provider_added;
mod provider_removed;
mod unpaused;

pub use batch_closed::*;
pub use batch_opened::*;
pub use contribution_submitted::*;
pub use cooldown_changed::*;
pub use decryption_completed::*;
pub use decryption_requested::*;
pub use paused::*;
pub use pool_fault::*;
pub use provider_added::*;
pub use provider_removed::*;
pub use unpaused::*;

use crate::{BatchId, ErrorEvent, Event, EventId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self};

/// Macro to help define From traits for PoolEvent
macro_rules! impl_from_event {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for PoolEvent {
                fn from(data: $variant) -> Self {
                    PoolEvent::$variant {
                        id: EventId::next(data.clone()),
                        data,
                    }
                }
            }
        )*
    };
}

/// Every state transition of the pool, in the order it committed. Observers
/// subscribe to these on the EventBus; the HistoryCollector keeps the
/// append-only log.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub enum PoolEvent {
    ProviderAdded { id: EventId, data: ProviderAdded },
    ProviderRemoved { id: EventId, data: ProviderRemoved },
    CooldownChanged { id: EventId, data: CooldownChanged },
    Paused { id: EventId, data: Paused },
    Unpaused { id: EventId, data: Unpaused },
    BatchOpened { id: EventId, data: BatchOpened },
    BatchClosed { id: EventId, data: BatchClosed },
    ContributionSubmitted { id: EventId, data: ContributionSubmitted },
    DecryptionRequested { id: EventId, data: DecryptionRequested },
    DecryptionCompleted { id: EventId, data: DecryptionCompleted },
    PoolFault { id: EventId, data: PoolFault },
}

impl PoolEvent {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    pub fn get_id(&self) -> EventId {
        self.clone().into()
    }

    pub fn get_batch_id(&self) -> Option<BatchId> {
        match self {
            PoolEvent::BatchOpened { data, .. } => Some(data.batch_id),
            PoolEvent::BatchClosed { data, .. } => Some(data.batch_id),
            PoolEvent::ContributionSubmitted { data, .. } => Some(data.batch_id),
            PoolEvent::DecryptionRequested { data, .. } => Some(data.batch_id),
            PoolEvent::DecryptionCompleted { data, .. } => Some(data.batch_id),
            _ => None,
        }
    }

    pub fn get_data(&self) -> String {
        match self {
            PoolEvent::ProviderAdded { data, .. } => format!("{}", data),
            PoolEvent::ProviderRemoved { data, .. } => format!("{}", data),
            PoolEvent::CooldownChanged { data, .. } => format!("{}", data),
            PoolEvent::Paused { data, .. } => format!("{}", data),
            PoolEvent::Unpaused { data, .. } => format!("{}", data),
            PoolEvent::BatchOpened { data, .. } => format!("{}", data),
            PoolEvent::BatchClosed { data, .. } => format!("{}", data),
            PoolEvent::ContributionSubmitted { data, .. } => format!("{}", data),
            PoolEvent::DecryptionRequested { data, .. } => format!("{}", data),
            PoolEvent::DecryptionCompleted { data, .. } => format!("{}", data),
            PoolEvent::PoolFault { data, .. } => format!("{}", data),
        }
    }
}

impl Event for PoolEvent {
    type Id = EventId;

    fn event_type(&self) -> String {
        let s = format!("{:?}", self);
        extract_event_name(&s).to_string()
    }

    fn event_id(&self) -> Self::Id {
        self.get_id()
    }
}

impl ErrorEvent for PoolEvent {
    type Error = PoolFault;
    type ErrorType = FaultScope;

    fn as_error(&self) -> Option<&Self::Error> {
        match self {
            PoolEvent::PoolFault { data, .. } => Some(data),
            _ => None,
        }
    }

    fn from_error(err_type: Self::ErrorType, error: anyhow::Error) -> Self {
        PoolEvent::from(PoolFault::new(err_type, error.to_string().as_str()))
    }
}

impl From<PoolEvent> for EventId {
    fn from(value: PoolEvent) -> Self {
        match value {
            PoolEvent::ProviderAdded { id, .. } => id,
            PoolEvent::ProviderRemoved { id, .. } => id,
            PoolEvent::CooldownChanged { id, .. } => id,
            PoolEvent::Paused { id, .. } => id,
            PoolEvent::Unpaused { id, .. } => id,
            PoolEvent::BatchOpened { id, .. } => id,
            PoolEvent::BatchClosed { id, .. } => id,
            PoolEvent::ContributionSubmitted { id, .. } => id,
            PoolEvent::DecryptionRequested { id, .. } => id,
            PoolEvent::DecryptionCompleted { id, .. } => id,
            PoolEvent::PoolFault { id, .. } => id,
        }
    }
}

impl_from_event!(
    ProviderAdded,
    ProviderRemoved,
    CooldownChanged,
    Paused,
    Unpaused,
    BatchOpened,
    BatchClosed,
    ContributionSubmitted,
    DecryptionRequested,
    DecryptionCompleted,
    PoolFault
);

impl fmt::Display for PoolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format!("{}({})", self.event_type(), self.get_data()))
    }
}

fn extract_event_name(s: &str) -> &str {
    let bytes = s.as_bytes();
    for (i, &item) in bytes.iter().enumerate() {
        if item == b' ' || item == b'(' || item == b'{' {
            return &s[..i];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BatchId;

    #[test]
    fn event_type_is_the_variant_name() {
        let event = PoolEvent::from(BatchOpened {
            batch_id: BatchId::new(1),
        });
        assert_eq!(event.event_type(), "BatchOpened");
        assert_eq!(event.get_batch_id(), Some(BatchId::new(1)));
    }

    #[test]
    fn events_round_trip_through_bytes() {
        let event = PoolEvent::from(DecryptionCompleted {
            request_id: crate::RequestId::new(7),
            batch_id: BatchId::new(3),
            result: 42,
        });
        let bytes = event.to_bytes().unwrap();
        assert_eq!(PoolEvent::from_bytes(&bytes).unwrap(), event);
    }

    #[test]
    fn fault_events_surface_through_as_error() {
        let event = PoolEvent::from(PoolFault::new(FaultScope::Batch, "no batch is open"));
        assert!(event.as_error().is_some());
        let event = PoolEvent::from(Paused);
        assert!(event.as_error().is_none());
    }
}
