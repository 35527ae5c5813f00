mod clock;
pub mod events;
pub mod night;

pub use clock::{Clock, SystemClock};
pub use events::EventPump;
pub use night::NightWindow;

use crate::chat::{ChatService, Session};
use crate::config::Config;
use crate::policy::sweep_groups;
use crate::util::format_span;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// How long a connect attempt may poll before nagging about the unscanned
/// pairing code.
const PAIRING_NAG_AFTER: Duration = Duration::from_secs(30);

/// Where the control loop stands: day or night, crossed with the
/// connection flag. Classified fresh at the top of every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NightDisconnected,
    NightConnected,
    DayDisconnected,
    DayConnected,
}

impl Phase {
    pub fn of(in_night: bool, connected: bool) -> Self {
        match (in_night, connected) {
            (true, false) => Self::NightDisconnected,
            (true, true) => Self::NightConnected,
            (false, false) => Self::DayDisconnected,
            (false, true) => Self::DayConnected,
        }
    }
}

/// The connection lifecycle loop: offline through a randomized night
/// window, connected with periodic sweeps through the day, with bounded
/// retries in between.
pub struct Scheduler {
    service: Arc<dyn ChatService>,
    session: Arc<Session>,
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(service: Arc<dyn ChatService>, session: Arc<Session>, config: Arc<Config>) -> Self {
        Self {
            service,
            session,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Swap the wall-clock source (tests drive transitions with a fixed
    /// clock; production always runs on the system clock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run forever. Every cycle redraws the night window and re-reads the
    /// clock and connection state; nothing is assumed stable across a
    /// sleep.
    pub async fn run(&self) {
        loop {
            self.cycle().await;
        }
    }

    /// One pass of the control loop.
    pub async fn cycle(&self) {
        let window = NightWindow::draw(&self.config.schedule, &mut rand::rng());
        let now = self.clock.now();

        match Phase::of(window.contains(now.time()), self.session.is_connected()) {
            Phase::NightConnected => self.enter_night(&window, now, true).await,
            Phase::NightDisconnected => self.enter_night(&window, now, false).await,
            Phase::DayDisconnected => self.reconnect().await,
            Phase::DayConnected => self.hold_until_night(&window, now).await,
        }
    }

    /// Clear the ledger, drop the connection if it is up, and rest until
    /// the window ends. Ledger entries must not outlive the night: any
    /// pending decision would be stale by morning.
    async fn enter_night(&self, window: &NightWindow, now: NaiveDateTime, disconnect: bool) {
        let removed = self.session.clear_ledger();
        tracing::info!("night window {window}: cleared outgoing ledger ({removed} entries)");

        if disconnect {
            if let Err(e) = self.service.disconnect().await {
                tracing::warn!("scheduled disconnect failed: {e:#}");
            }
            self.session.set_connected(false);
            tracing::info!("disconnected for the night");
        }

        let rest = window.until_end(now);
        tracing::info!("resting for {}", format_span(rest.as_secs() / 60));
        sleep(rest).await;
    }

    /// Day with no connection: try to connect; on success settle and run a
    /// sweep, on failure disconnect once and back off.
    async fn reconnect(&self) {
        if self.connect_until_ready().await {
            sleep(Duration::from_secs(self.config.reliability.stabilize_secs)).await;
            tracing::info!("checking groups to archive after connect");
            sweep_groups(
                self.service.as_ref(),
                Duration::from_millis(self.config.archive.sweep_pause_ms),
            )
            .await;
        } else {
            tracing::warn!(
                "connection not ready within {}s",
                self.config.reliability.connect_timeout_secs
            );
            if let Err(e) = self.service.disconnect().await {
                tracing::warn!("disconnect after failed connect failed: {e:#}");
            }
            self.session.set_connected(false);
            tracing::info!(
                "waiting {} before trying again",
                format_span(self.config.reliability.connect_backoff_secs / 60)
            );
            sleep(Duration::from_secs(self.config.reliability.connect_backoff_secs)).await;
        }
    }

    /// Kick off a connect and poll until the ready event lands or the
    /// ceiling passes. A connect error counts the same as a timeout.
    async fn connect_until_ready(&self) -> bool {
        tracing::info!("connecting to chat service");
        self.session.set_paired(false);

        if let Err(e) = self.service.connect().await {
            tracing::warn!("connect failed: {e:#}");
            return false;
        }

        let poll = Duration::from_secs(self.config.reliability.connect_poll_secs);
        let ceiling = Duration::from_secs(self.config.reliability.connect_timeout_secs);
        let mut waited = Duration::ZERO;

        while !self.session.is_connected() && waited < ceiling {
            sleep(poll).await;
            waited += poll;
            if waited >= PAIRING_NAG_AFTER && !self.session.is_paired() {
                tracing::info!("still waiting for the pairing code to be entered");
            }
        }

        if self.session.is_connected() {
            tracing::info!("connected");
            true
        } else {
            false
        }
    }

    /// Day with a connection: sleep toward the night window in sweep-sized
    /// increments, sweeping after each one, then sleep the remainder. An
    /// observed disconnect ends the hold early so the next cycle can
    /// reconnect.
    async fn hold_until_night(&self, window: &NightWindow, now: NaiveDateTime) {
        let until_start = window.until_start(now);
        let mut minutes = until_start.as_secs() / 60;
        tracing::info!(
            "staying connected until the night window at {}; {} remaining",
            window.start.format("%H:%M"),
            format_span(minutes)
        );

        let increment = self.config.schedule.sweep_interval_mins;
        if minutes > increment {
            while minutes > increment {
                sleep(Duration::from_secs(increment * 60)).await;
                if !self.session.is_connected() {
                    return;
                }
                tracing::info!("periodic group sweep");
                sweep_groups(
                    self.service.as_ref(),
                    Duration::from_millis(self.config.archive.sweep_pause_ms),
                )
                .await;
                minutes -= increment;
                tracing::info!("{} until the night window", format_span(minutes));
            }
            if self.session.is_connected() && minutes > 0 {
                sleep(Duration::from_secs(minutes * 60)).await;
            }
        } else {
            // Exact remainder, not the floored minute count; a sub-minute
            // stretch must still actually pass before the next cycle.
            sleep(until_start).await;
        }
    }
}
