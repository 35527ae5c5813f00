mod common;

use chatkeeper::chat::{ChatService, Session};
use chatkeeper::config::Config;
use chatkeeper::sched::Scheduler;
use common::{MockChat, clock_at, group};
use std::sync::Arc;
use std::time::Duration;

fn scheduler_at(
    hour: u32,
    minute: u32,
    service: Arc<MockChat>,
    session: Arc<Session>,
) -> Scheduler {
    Scheduler::new(
        Arc::clone(&service) as Arc<dyn ChatService>,
        session,
        Arc::new(Config::default()),
    )
    .with_clock(Arc::new(clock_at(hour, minute)))
}

#[tokio::test(start_paused = true)]
async fn failed_connect_backs_off_after_one_disconnect() {
    let service = Arc::new(MockChat::new());
    let session = Arc::new(Session::new());
    let scheduler = scheduler_at(12, 0, Arc::clone(&service), Arc::clone(&session));

    // Nothing ever flips the session to connected, so the attempt runs
    // into the 180 s ceiling and then sleeps the 300 s backoff.
    let started = tokio::time::Instant::now();
    scheduler.cycle().await;
    let elapsed = started.elapsed();

    assert_eq!(service.connects(), 1);
    assert_eq!(service.disconnects(), 1);
    assert!(elapsed >= Duration::from_secs(480));
    assert!(elapsed < Duration::from_secs(500));
}

#[tokio::test(start_paused = true)]
async fn successful_connect_stabilizes_then_sweeps() {
    let service = Arc::new(MockChat::with_chats(vec![group("g1", "Lab")]));
    let session = Arc::new(Session::new());
    let scheduler = scheduler_at(12, 0, Arc::clone(&service), Arc::clone(&session));

    // The ready event lands while the scheduler is polling.
    let flip = Arc::clone(&session);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(12)).await;
        flip.set_connected(true);
    });

    scheduler.cycle().await;

    assert_eq!(service.connects(), 1);
    assert_eq!(service.disconnects(), 0);
    assert_eq!(service.archived(), vec!["g1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn entering_the_night_clears_the_ledger_once_and_disconnects() {
    let service = Arc::new(MockChat::new());
    let session = Arc::new(Session::new());
    session.set_connected(true);
    session.record_outgoing("d1", 1);
    session.record_outgoing("d2", 2);
    session.record_outgoing("d3", 3);

    let scheduler = scheduler_at(2, 0, Arc::clone(&service), Arc::clone(&session));

    let started = tokio::time::Instant::now();
    scheduler.cycle().await;
    let elapsed = started.elapsed();

    assert_eq!(service.disconnects(), 1);
    assert!(!session.is_connected());
    assert_eq!(session.last_outgoing("d1"), None);
    assert_eq!(session.clear_ledger(), 0, "ledger already empty");

    // Slept until the jittered window end, between 09:30 and 09:45.
    assert!(elapsed >= Duration::from_secs(7 * 3600 + 30 * 60));
    assert!(elapsed <= Duration::from_secs(7 * 3600 + 45 * 60));
}

#[tokio::test(start_paused = true)]
async fn staying_disconnected_at_night_rests_until_morning() {
    let service = Arc::new(MockChat::new());
    let session = Arc::new(Session::new());
    let scheduler = scheduler_at(8, 0, Arc::clone(&service), Arc::clone(&session));

    let started = tokio::time::Instant::now();
    scheduler.cycle().await;
    let elapsed = started.elapsed();

    // No connect attempt during the window, just the rest until the end.
    assert_eq!(service.connects(), 0);
    assert_eq!(service.disconnects(), 0);
    assert!(elapsed >= Duration::from_secs(90 * 60));
    assert!(elapsed <= Duration::from_secs(105 * 60));
}

#[tokio::test(start_paused = true)]
async fn connected_day_holds_with_hourly_sweeps() {
    let service = Arc::new(MockChat::with_chats(vec![group("g1", "Lab")]));
    let session = Arc::new(Session::new());
    session.set_connected(true);

    // 22:30 leaves roughly 2.5 hours until the window opens at 01:0x,
    // so the hold runs two full hourly increments plus a remainder.
    let scheduler = scheduler_at(22, 30, Arc::clone(&service), Arc::clone(&session));

    let started = tokio::time::Instant::now();
    scheduler.cycle().await;
    let elapsed = started.elapsed();

    assert!(service.listings() >= 2, "expected periodic sweeps");
    assert_eq!(service.archived(), vec!["g1".to_string()]);
    assert!(elapsed >= Duration::from_secs(2 * 3600 + 31 * 60));
    assert!(elapsed <= Duration::from_secs(2 * 3600 + 45 * 60 + 60));
}

#[tokio::test(start_paused = true)]
async fn hold_aborts_early_when_the_connection_drops() {
    let service = Arc::new(MockChat::new());
    let session = Arc::new(Session::new());
    session.set_connected(true);

    let scheduler = scheduler_at(18, 0, Arc::clone(&service), Arc::clone(&session));

    let flip = Arc::clone(&session);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(90 * 60)).await;
        flip.set_connected(false);
    });

    let started = tokio::time::Instant::now();
    scheduler.cycle().await;
    let elapsed = started.elapsed();

    // The drop is noticed at the end of the second hourly increment; no
    // sweep runs after it and the final stretch is skipped.
    assert!(elapsed >= Duration::from_secs(2 * 3600));
    assert!(elapsed < Duration::from_secs(2 * 3600 + 10 * 60));
}
