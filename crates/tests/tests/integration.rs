// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::prelude::*;
use alloy_primitives::Address;
use anyhow::Result;
use cipherpool_coprocessor::{Coprocessor, MockCoprocessor};
use cipherpool_events::{
    EventBus, FaultScope, GetErrors, GetEvents, HistoryCollector, PoolEvent,
};
use cipherpool_ledger::{
    AddProvider, CloseBatch, GetPoolStatus, ManualClock, OpenBatch, Pause, Pool, PoolError,
    RemoveProvider, SubmitContribution, Unpause,
};
use std::sync::Arc;
use std::time::Duration;

const OWNER: Address = Address::repeat_byte(0x01);
const PROVIDER: Address = Address::repeat_byte(0x0a);

struct Deployment {
    pool: Addr<Pool>,
    history: Addr<HistoryCollector<PoolEvent>>,
    faults: Addr<HistoryCollector<PoolEvent>>,
    coprocessor: Arc<MockCoprocessor>,
    clock: ManualClock,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn setup_pool(cooldown_secs: u64) -> Result<Deployment> {
    init_tracing();
    let bus = EventBus::<PoolEvent>::default().start();
    let history = EventBus::history(&bus);
    let faults = EventBus::<PoolEvent>::faults(&bus);

    let coprocessor = Arc::new(MockCoprocessor::new());
    let clock = ManualClock::new(0);
    let pool = Pool::attach(
        OWNER,
        cooldown_secs,
        [0x42u8; 32],
        coprocessor.clone(),
        &bus,
        Arc::new(clock.clone()),
    )?;

    pool.send(AddProvider {
        caller: OWNER,
        address: PROVIDER,
    })
    .await??;

    Ok(Deployment {
        pool,
        history,
        faults,
        coprocessor,
        clock,
    })
}

async fn settle() {
    actix::clock::sleep(Duration::from_millis(1)).await;
}

#[actix::test]
async fn test_pause_gates_operations_and_emits_faults() -> Result<()> {
    let node = setup_pool(60).await?;

    node.pool.send(OpenBatch { caller: OWNER }).await??;
    node.pool.send(Pause { caller: OWNER }).await??;

    let rejected = node
        .pool
        .send(SubmitContribution {
            caller: PROVIDER,
            ciphertext: node.coprocessor.encode(1)?,
        })
        .await?;
    assert!(matches!(rejected, Err(PoolError::SystemPaused)));

    let rejected = node.pool.send(CloseBatch { caller: OWNER }).await?;
    assert!(matches!(rejected, Err(PoolError::SystemPaused)));

    // membership changes stay available while paused
    node.pool
        .send(RemoveProvider {
            caller: OWNER,
            address: PROVIDER,
        })
        .await??;

    node.pool.send(Unpause { caller: OWNER }).await??;
    let status = node.pool.send(GetPoolStatus).await?;
    assert!(!status.paused);
    assert!(status.providers.is_empty());

    settle().await;
    let faults = node.faults.send(GetErrors::new()).await?;
    assert_eq!(faults.len(), 2);
    assert!(faults.iter().all(|fault| fault.scope == FaultScope::Access));

    Ok(())
}

#[actix::test]
async fn test_repeated_pause_cycles_all_reach_the_log() -> Result<()> {
    let node = setup_pool(60).await?;

    for _ in 0..2 {
        node.pool.send(Pause { caller: OWNER }).await??;
        node.pool.send(Unpause { caller: OWNER }).await??;
    }

    settle().await;
    let history = node.history.send(GetEvents::new()).await?;
    let pauses = history
        .iter()
        .filter(|event| matches!(event, PoolEvent::Paused { .. }))
        .count();
    let unpauses = history
        .iter()
        .filter(|event| matches!(event, PoolEvent::Unpaused { .. }))
        .count();
    // identical payloads must not collapse under bus deduplication
    assert_eq!((pauses, unpauses), (2, 2));

    Ok(())
}

#[actix::test]
async fn test_cooldown_spans_batches_under_a_manual_clock() -> Result<()> {
    let node = setup_pool(60).await?;

    node.pool.send(OpenBatch { caller: OWNER }).await??;
    node.pool
        .send(SubmitContribution {
            caller: PROVIDER,
            ciphertext: node.coprocessor.encode(3)?,
        })
        .await??;

    node.pool.send(CloseBatch { caller: OWNER }).await??;
    node.pool.send(OpenBatch { caller: OWNER }).await??;

    node.clock.set(30);
    let rejected = node
        .pool
        .send(SubmitContribution {
            caller: PROVIDER,
            ciphertext: node.coprocessor.encode(4)?,
        })
        .await?;
    assert!(matches!(
        rejected,
        Err(PoolError::CooldownActive { remaining: 30 })
    ));

    node.clock.set(61);
    node.pool
        .send(SubmitContribution {
            caller: PROVIDER,
            ciphertext: node.coprocessor.encode(4)?,
        })
        .await??;

    Ok(())
}
