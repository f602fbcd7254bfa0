use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use log::{debug, warn};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

/// The selected election round. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub round_id: String,
    /// When false every loader short-circuits to all-zero placeholders.
    pub has_data: bool,
    /// When true statistics come from the real-time endpoint and a recurring
    /// poll keeps them fresh.
    pub is_live: bool,
}

impl RoundState {
    pub fn preloaded(round_id: impl Into<String>, has_data: bool) -> Self {
        Self { round_id: round_id.into(), has_data, is_live: false }
    }

    pub fn live(round_id: impl Into<String>) -> Self {
        Self { round_id: round_id.into(), has_data: true, is_live: true }
    }
}

/// Fixed live-polling cadence.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// One poll tick: re-runs the statistics load for the current view. A failed
/// tick leaves the previous statistics displayed; the timer keeps running.
pub type PollTick =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send + Sync>;

/// Owns the process-wide round selection and the single polling task.
///
/// Dependents observe changes through [`RoundManager::subscribe`]; every
/// `select_round` fans out synchronously over the watch channel. The polling
/// task is started and stopped only here, never by callers holding timers.
pub struct RoundManager {
    tx: watch::Sender<RoundState>,
    tick: PollTick,
    poll: Option<JoinHandle<()>>,
}

impl RoundManager {
    pub fn new(initial: RoundState, tick: PollTick) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx, tick, poll: None }
    }

    pub fn current(&self) -> RoundState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RoundState> {
        self.tx.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Installs the round and reconciles polling: any prior timer is always
    /// cancelled first, and a new one starts only for a live round.
    pub fn select_round(&mut self, round: RoundState) {
        self.stop_polling();
        let live = round.is_live;
        self.tx.send_replace(round);

        if live {
            let tick = Arc::clone(&self.tick);
            self.poll = Some(tokio::spawn(async move {
                let mut timer = interval(POLL_INTERVAL);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick of a tokio interval fires immediately; the
                // initial load already ran, so consume it.
                timer.tick().await;
                loop {
                    timer.tick().await;
                    debug!("[round] poll tick");
                    if let Err(err) = tick().await {
                        warn!("[round] poll tick failed: {err:#}");
                    }
                }
            }));
        }
    }

    /// Idempotent; a no-op when polling is already stopped.
    pub fn stop_polling(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.abort();
        }
    }
}

/// Teardown unconditionally cancels polling.
impl Drop for RoundManager {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
