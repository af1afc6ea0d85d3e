//! Background polling of the waitlist count.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::client::WaitlistClient;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Shown until the first fetch completes.
pub const DEFAULT_INITIAL_COUNT: u64 = 18;

#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
    pub initial_count: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            initial_count: DEFAULT_INITIAL_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountState {
    pub count: u64,
    pub is_loading: bool,
    /// Last fetch error. The count keeps its previous value.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Pause,
    Resume,
    Refetch,
    Shutdown,
}

/// One polling task shared by every subscriber.
pub struct CountPoller {
    state: watch::Receiver<CountState>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl CountPoller {
    /// Start polling: one fetch right away, then one per `config.interval`.
    /// A zero interval falls back to [`DEFAULT_POLL_INTERVAL`].
    pub fn spawn(client: WaitlistClient, config: PollerConfig) -> Self {
        let period = if config.interval.is_zero() {
            tracing::warn!(
                fallback = ?DEFAULT_POLL_INTERVAL,
                "Zero poll interval, using the default"
            );
            DEFAULT_POLL_INTERVAL
        } else {
            config.interval
        };
        let (state_tx, state) = watch::channel(CountState {
            count: config.initial_count,
            is_loading: true,
            error: None,
        });
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(client, period, state_tx, command_rx));

        Self {
            state,
            commands,
            task,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CountState> {
        self.state.clone()
    }

    pub fn state(&self) -> CountState {
        self.state.borrow().clone()
    }

    /// Stop polling until `resume`, e.g. while the page is hidden.
    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    /// Fetch immediately and restart the interval.
    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    /// Fetch once now, without touching the schedule.
    pub fn refetch(&self) {
        self.send(Command::Refetch);
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Count poller task panicked");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!(?command, "Count poller already stopped");
        }
    }
}

async fn run(
    client: WaitlistClient,
    period: Duration,
    state: watch::Sender<CountState>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut paused = false;

    loop {
        tokio::select! {
            _ = ticker.tick(), if !paused => fetch(&client, &state).await,
            command = commands.recv() => match command {
                Some(Command::Pause) => paused = true,
                Some(Command::Resume) => {
                    paused = false;
                    fetch(&client, &state).await;
                    ticker.reset();
                }
                Some(Command::Refetch) => fetch(&client, &state).await,
                Some(Command::Shutdown) | None => break,
            },
        }
    }
}

async fn fetch(client: &WaitlistClient, state: &watch::Sender<CountState>) {
    state.send_modify(|s| s.is_loading = true);

    let result = client.fetch_count().await;

    state.send_modify(|s| {
        s.is_loading = false;
        match result {
            Ok(count) => {
                s.count = count;
                s.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch waitlist count");
                s.error = Some(e.to_string());
            }
        }
    });
}
