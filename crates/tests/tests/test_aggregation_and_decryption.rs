// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::prelude::*;
use alloy_primitives::Address;
use anyhow::Result;
use cipherpool_coprocessor::{Coprocessor, MockCoprocessor};
use cipherpool_events::{EventBus, GetEvents, HistoryCollector, PoolEvent};
use cipherpool_ledger::{
    CloseBatch, ManualClock, OpenBatch, Pool, PoolError, RequestDecryption, ResolveDecryption,
    SubmitContribution,
};
use cipherpool_logger::SimpleLogger;
use std::sync::Arc;
use std::time::Duration;

const OWNER: Address = Address::repeat_byte(0x01);
const PROVIDER_A: Address = Address::repeat_byte(0x0a);
const PROVIDER_B: Address = Address::repeat_byte(0x0b);

struct Deployment {
    pool: Addr<Pool>,
    history: Addr<HistoryCollector<PoolEvent>>,
    coprocessor: Arc<MockCoprocessor>,
    clock: ManualClock,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn setup_pool(cooldown_secs: u64, providers: &[Address]) -> Result<Deployment> {
    init_tracing();
    let bus = EventBus::<PoolEvent>::default().start();
    let history = EventBus::history(&bus);
    SimpleLogger::<PoolEvent>::attach("cn1", bus.clone());

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

    for &provider in providers {
        pool.send(cipherpool_ledger::AddProvider {
            caller: OWNER,
            address: provider,
        })
        .await??;
    }

    Ok(Deployment {
        pool,
        history,
        coprocessor,
        clock,
    })
}

async fn settle() {
    actix::clock::sleep(Duration::from_millis(1)).await;
}

#[actix::test]
async fn test_aggregation_and_decryption() -> Result<()> {
    let node = setup_pool(60, &[PROVIDER_A, PROVIDER_B]).await?;

    node.pool.send(OpenBatch { caller: OWNER }).await??;

    node.pool
        .send(SubmitContribution {
            caller: PROVIDER_A,
            ciphertext: node.coprocessor.encode(10)?,
        })
        .await??;
    node.clock.advance(61);
    node.pool
        .send(SubmitContribution {
            caller: PROVIDER_B,
            ciphertext: node.coprocessor.encode(20)?,
        })
        .await??;

    node.pool.send(CloseBatch { caller: OWNER }).await??;
    let requested = node
        .pool
        .send(RequestDecryption { caller: PROVIDER_A })
        .await??;

    let (cleartext, proof) = node.coprocessor.fulfil(requested.request_id)?;
    let completed = node
        .pool
        .send(ResolveDecryption {
            request_id: requested.request_id,
            cleartext,
            proof,
        })
        .await??;
    assert_eq!(completed.result, 30);

    settle().await;
    let history = node.history.send(GetEvents::new()).await?;
    let results: Vec<u64> = history
        .iter()
        .filter_map(|event| match event {
            PoolEvent::DecryptionCompleted { data, .. } => Some(data.result),
            _ => None,
        })
        .collect();
    assert_eq!(results, vec![30]);

    Ok(())
}

#[actix::test]
async fn test_replay_is_rejected_through_the_public_surface() -> Result<()> {
    let node = setup_pool(60, &[PROVIDER_A]).await?;

    node.pool.send(OpenBatch { caller: OWNER }).await??;
    node.pool
        .send(SubmitContribution {
            caller: PROVIDER_A,
            ciphertext: node.coprocessor.encode(5)?,
        })
        .await??;
    node.pool.send(CloseBatch { caller: OWNER }).await??;
    let requested = node
        .pool
        .send(RequestDecryption { caller: PROVIDER_A })
        .await??;

    let (cleartext, proof) = node.coprocessor.fulfil(requested.request_id)?;
    node.pool
        .send(ResolveDecryption {
            request_id: requested.request_id,
            cleartext: cleartext.clone(),
            proof: proof.clone(),
        })
        .await??;

    let replay = node
        .pool
        .send(ResolveDecryption {
            request_id: requested.request_id,
            cleartext,
            proof,
        })
        .await?;
    assert!(matches!(replay, Err(PoolError::ReplayDetected)));

    settle().await;
    let history = node.history.send(GetEvents::new()).await?;
    let completions = history
        .iter()
        .filter(|event| matches!(event, PoolEvent::DecryptionCompleted { .. }))
        .count();
    assert_eq!(completions, 1);

    Ok(())
}

#[actix::test]
async fn test_multiple_outstanding_requests() -> Result<()> {
    let node = setup_pool(60, &[PROVIDER_A, PROVIDER_B]).await?;

    node.pool.send(OpenBatch { caller: OWNER }).await??;
    node.pool
        .send(SubmitContribution {
            caller: PROVIDER_A,
            ciphertext: node.coprocessor.encode(7)?,
        })
        .await??;
    node.pool.send(CloseBatch { caller: OWNER }).await??;

    let first = node
        .pool
        .send(RequestDecryption { caller: PROVIDER_A })
        .await??;
    let second = node
        .pool
        .send(RequestDecryption { caller: PROVIDER_B })
        .await??;
    assert_ne!(first.request_id, second.request_id);
    assert_eq!(first.batch_id, second.batch_id);

    // fulfil out of order
    for requested in [second, first] {
        let (cleartext, proof) = node.coprocessor.fulfil(requested.request_id)?;
        let completed = node
            .pool
            .send(ResolveDecryption {
                request_id: requested.request_id,
                cleartext,
                proof,
            })
            .await??;
        assert_eq!(completed.result, 7);
    }

    Ok(())
}
