// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Batch, Clock, DecryptionRequest, PoolError, PoolState};
use actix::prelude::*;
use alloy_primitives::Address;
use cipherpool_coprocessor::{CiphertextHandle, Coprocessor};
use cipherpool_events::{
    BatchClosed, BatchId, BatchOpened, ContributionSubmitted, CooldownChanged,
    DecryptionCompleted, DecryptionRequested, EventBus, FaultScope, Paused, PoolEvent, PoolFault,
    ProviderAdded, ProviderRemoved, RequestId, Unpaused,
};
use std::sync::Arc;
use tracing::warn;

/// Actor wrapper around [`PoolState`]. Serializes all mutations through the
/// actor mailbox and publishes one event on the bus per committed
/// transition; rejections surface as `PoolFault` events instead.
pub struct Pool {
    state: PoolState,
    bus: Addr<EventBus<PoolEvent>>,
    clock: Arc<dyn Clock>,
}

impl Pool {
    pub fn new(state: PoolState, bus: Addr<EventBus<PoolEvent>>, clock: Arc<dyn Clock>) -> Self {
        Self { state, bus, clock }
    }

    /// Build the state and start the actor in one step.
    pub fn attach(
        owner: Address,
        cooldown_secs: u64,
        identity: [u8; 32],
        coprocessor: Arc<dyn Coprocessor>,
        bus: &Addr<EventBus<PoolEvent>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Addr<Pool>, PoolError> {
        let state = PoolState::new(owner, cooldown_secs, identity, coprocessor)?;
        Ok(Pool::new(state, bus.clone(), clock).start())
    }

    /// Publish the committed transition, or a fault for the rejection, and
    /// hand the result back to the caller either way.
    fn finish<T>(&self, result: Result<T, PoolError>) -> Result<T, PoolError>
    where
        T: Clone + Into<PoolEvent>,
    {
        match result {
            Ok(data) => {
                self.bus.do_send(data.clone().into());
                Ok(data)
            }
            Err(err) => {
                warn!(error = %err, "Pool operation rejected");
                self.bus
                    .do_send(PoolEvent::from(PoolFault::new(fault_scope(&err), &err.to_string())));
                Err(err)
            }
        }
    }
}

fn fault_scope(err: &PoolError) -> FaultScope {
    match err {
        PoolError::Unauthorized | PoolError::SystemPaused | PoolError::AlreadyPaused => {
            FaultScope::Access
        }
        PoolError::CooldownActive { .. } | PoolError::InvalidArgument(_) => FaultScope::Throttle,
        PoolError::BatchAlreadyOpen
        | PoolError::BatchNotOpen
        | PoolError::BatchStillOpen
        | PoolError::AlreadyContributed
        | PoolError::NoData => FaultScope::Batch,
        PoolError::ReplayDetected
        | PoolError::StateMismatch
        | PoolError::UnknownRequest
        | PoolError::DecryptionFailed => FaultScope::Decryption,
        PoolError::Coprocessor(_) => FaultScope::Coprocessor,
    }
}

impl Actor for Pool {
    type Context = Context<Self>;
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<ProviderAdded, PoolError>")]
pub struct AddProvider {
    pub caller: Address,
    pub address: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<ProviderRemoved, PoolError>")]
pub struct RemoveProvider {
    pub caller: Address,
    pub address: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<CooldownChanged, PoolError>")]
pub struct SetCooldown {
    pub caller: Address,
    pub cooldown_secs: u64,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Paused, PoolError>")]
pub struct Pause {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Unpaused, PoolError>")]
pub struct Unpause {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<BatchOpened, PoolError>")]
pub struct OpenBatch {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<BatchClosed, PoolError>")]
pub struct CloseBatch {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<ContributionSubmitted, PoolError>")]
pub struct SubmitContribution {
    pub caller: Address,
    pub ciphertext: CiphertextHandle,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<DecryptionRequested, PoolError>")]
pub struct RequestDecryption {
    pub caller: Address,
}

/// Co-processor callback. Deliberately carries no caller: acceptance rests
/// on the stored commitment and the proof alone.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<DecryptionCompleted, PoolError>")]
pub struct ResolveDecryption {
    pub request_id: RequestId,
    pub cleartext: Vec<u8>,
    pub proof: Vec<u8>,
}

impl Handler<AddProvider> for Pool {
    type Result = Result<ProviderAdded, PoolError>;

    fn handle(&mut self, msg: AddProvider, _: &mut Self::Context) -> Self::Result {
        let result = self.state.add_provider(msg.caller, msg.address);
        self.finish(result)
    }
}

impl Handler<RemoveProvider> for Pool {
    type Result = Result<ProviderRemoved, PoolError>;

    fn handle(&mut self, msg: RemoveProvider, _: &mut Self::Context) -> Self::Result {
        let result = self.state.remove_provider(msg.caller, msg.address);
        self.finish(result)
    }
}

impl Handler<SetCooldown> for Pool {
    type Result = Result<CooldownChanged, PoolError>;

    fn handle(&mut self, msg: SetCooldown, _: &mut Self::Context) -> Self::Result {
        let result = self.state.set_cooldown(msg.caller, msg.cooldown_secs);
        self.finish(result)
    }
}

impl Handler<Pause> for Pool {
    type Result = Result<Paused, PoolError>;

    fn handle(&mut self, msg: Pause, _: &mut Self::Context) -> Self::Result {
        let result = self.state.pause(msg.caller);
        self.finish(result)
    }
}

impl Handler<Unpause> for Pool {
    type Result = Result<Unpaused, PoolError>;

    fn handle(&mut self, msg: Unpause, _: &mut Self::Context) -> Self::Result {
        let result = self.state.unpause(msg.caller);
        self.finish(result)
    }
}

impl Handler<OpenBatch> for Pool {
    type Result = Result<BatchOpened, PoolError>;

    fn handle(&mut self, msg: OpenBatch, _: &mut Self::Context) -> Self::Result {
        let result = self.state.open_batch(msg.caller);
        self.finish(result)
    }
}

impl Handler<CloseBatch> for Pool {
    type Result = Result<BatchClosed, PoolError>;

    fn handle(&mut self, msg: CloseBatch, _: &mut Self::Context) -> Self::Result {
        let result = self.state.close_batch(msg.caller);
        self.finish(result)
    }
}

impl Handler<SubmitContribution> for Pool {
    type Result = Result<ContributionSubmitted, PoolError>;

    fn handle(&mut self, msg: SubmitContribution, _: &mut Self::Context) -> Self::Result {
        let now = self.clock.now();
        let result = self
            .state
            .submit_contribution(msg.caller, msg.ciphertext, now);
        self.finish(result)
    }
}

impl Handler<RequestDecryption> for Pool {
    type Result = Result<DecryptionRequested, PoolError>;

    fn handle(&mut self, msg: RequestDecryption, _: &mut Self::Context) -> Self::Result {
        let now = self.clock.now();
        let result = self.state.request_decryption(msg.caller, now);
        self.finish(result)
    }
}

impl Handler<ResolveDecryption> for Pool {
    type Result = Result<DecryptionCompleted, PoolError>;

    fn handle(&mut self, msg: ResolveDecryption, _: &mut Self::Context) -> Self::Result {
        let result = self
            .state
            .resolve_decryption(msg.request_id, &msg.cleartext, &msg.proof);
        self.finish(result)
    }
}

//////////////////////////////////////////////////////////////////////
// Read-only queries
//////////////////////////////////////////////////////////////////////

/// Snapshot of the pool's control surface.
#[derive(Clone, Debug)]
pub struct PoolStatus {
    pub owner: Address,
    pub paused: bool,
    pub cooldown_secs: u64,
    pub current_batch_id: BatchId,
    pub batch_open: bool,
    pub providers: Vec<Address>,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "PoolStatus")]
pub struct GetPoolStatus;

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<Batch>")]
pub struct GetBatch {
    pub batch_id: BatchId,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<DecryptionRequest>")]
pub struct GetRequest {
    pub request_id: RequestId,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Vec<Address>")]
pub struct GetProviders;

impl Handler<GetPoolStatus> for Pool {
    type Result = MessageResult<GetPoolStatus>;

    fn handle(&mut self, _: GetPoolStatus, _: &mut Self::Context) -> Self::Result {
        MessageResult(PoolStatus {
            owner: self.state.owner(),
            paused: self.state.is_paused(),
            cooldown_secs: self.state.cooldown_secs(),
            current_batch_id: self.state.current_batch_id(),
            batch_open: self.state.is_batch_open(),
            providers: self.state.providers(),
        })
    }
}

impl Handler<GetBatch> for Pool {
    type Result = MessageResult<GetBatch>;

    fn handle(&mut self, msg: GetBatch, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.batch(msg.batch_id).cloned())
    }
}

impl Handler<GetProviders> for Pool {
    type Result = MessageResult<GetProviders>;

    fn handle(&mut self, _: GetProviders, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.providers())
    }
}

impl Handler<GetRequest> for Pool {
    type Result = MessageResult<GetRequest>;

    fn handle(&mut self, msg: GetRequest, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.request(msg.request_id).cloned())
    }
}
