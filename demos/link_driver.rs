//! Link Driver
//!
//! This example drives a small link bring-up protocol on the Tokio runtime.
//!
//! Key concepts:
//! - One shared jump table, states and events declared with `fsm_ids!`
//! - Handlers own every transition and arm their own timeout
//! - Timer expiry is delivered back to the instance as an ordinary event
//! - Trace lines go to `tracing` with an uptime stamp
//!
//! Run with: RUST_LOG=debug cargo run --example link_driver

use jumptable_fsm::builder::TableBuilder;
use jumptable_fsm::diagnostics::{DebugSink, TracingSink};
use jumptable_fsm::engine::{FsmInstance, Handler};
use jumptable_fsm::fsm_ids;
use jumptable_fsm::timer::{Timer, TimerSettings, TokioPlatform};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

fsm_ids! {
    enum LinkState {
        Idle,
        Connecting,
        Up,
    }
}

fsm_ids! {
    enum LinkEvent {
        Connect,
        Timeout,
        PeerAck,
    }
}

const RETRY_AFTER: Duration = Duration::from_millis(400);
const MAX_ATTEMPTS: u32 = 3;

struct Link {
    attempts: u32,
    retry: Timer<Link>,
}

fn start_connect(fsm: &mut FsmInstance<Link>) {
    fsm.context_mut().attempts += 1;
    fsm.transition(LinkState::Connecting);
    fsm.context().retry.rearm(RETRY_AFTER, LinkEvent::Timeout, ());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Link Driver Example ===\n");

    let (engine, errors) = TableBuilder::<Link>::new(LinkState::COUNT, LinkEvent::COUNT)
        .state_names(LinkState::NAMES)
        .event_names(LinkEvent::NAMES)
        .on(
            LinkState::Idle,
            LinkEvent::Connect,
            Handler::new("start_connect", |fsm, _, _| start_connect(fsm)),
        )
        .on(
            LinkState::Connecting,
            LinkEvent::Timeout,
            Handler::new("retry_or_give_up", |fsm: &mut FsmInstance<Link>, _, _| {
                if fsm.context().attempts < MAX_ATTEMPTS {
                    start_connect(fsm);
                } else {
                    fsm.transition(LinkState::Idle);
                }
            }),
        )
        .on(
            LinkState::Connecting,
            LinkEvent::PeerAck,
            Handler::new("link_up", |fsm: &mut FsmInstance<Link>, _, _| {
                fsm.context().retry.cancel();
                fsm.transition(LinkState::Up);
            }),
        )
        .build();
    for err in &errors {
        eprintln!("table error: {err}");
    }

    println!("Routes:");
    for route in engine.summary().routes {
        println!("  {} + {} -> {}", route.state_name, route.event_name, route.handler);
    }

    let platform = Arc::new(TokioPlatform::current(TimerSettings::default())?);
    let sink: Arc<dyn DebugSink> = Arc::new(TracingSink::with_clock(platform.clone()));
    let timers = platform.clone();
    let link = FsmInstance::new_shared(engine, LinkState::Idle, Some(sink), move |handle| Link {
        attempts: 0,
        retry: Timer::new(handle, timers),
    });

    println!("\nConnecting; the peer answers after the second retry fires");
    link.lock()
        .map_err(|_| "link lock poisoned")?
        .dispatch(LinkEvent::Connect, ())?;

    tokio::time::sleep(RETRY_AFTER * 2 + RETRY_AFTER / 2).await;
    link.lock()
        .map_err(|_| "link lock poisoned")?
        .dispatch(LinkEvent::PeerAck, ())?;

    let fsm = link.lock().map_err(|_| "link lock poisoned")?;
    println!(
        "Final state: {} after {} attempt(s), {} timer(s) pending",
        fsm.state_name(),
        fsm.context().attempts,
        platform.pending()
    );

    Ok(())
}
