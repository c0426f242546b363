use crate::models::{WeatherConfig, WeatherState};
use crate::services::WeatherSource;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Holder of the current weather and the only writer to it
///
/// Readers either poll [`WeatherOracle::state`] or subscribe to changes.
/// Subscribers are marked changed inside the write itself, so nobody can
/// observe a new state before the notification has been issued.
pub struct WeatherOracle {
    state_tx: watch::Sender<WeatherState>,
    rng: Mutex<Box<dyn RngCore + Send>>,
    description: Mutex<String>,
    bonus: Mutex<Option<u32>>,
}

impl WeatherOracle {
    /// Oracle drawing from an OS-seeded RNG, starting in the open fallback state
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Oracle with a reproducible RNG
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: RngCore + Send + 'static>(rng: R) -> Self {
        let fallback = WeatherConfig::fallback();
        let (state_tx, _) = watch::channel(fallback.state);

        Self {
            state_tx,
            rng: Mutex::new(Box::new(rng)),
            description: Mutex::new(fallback.description),
            bonus: Mutex::new(fallback.bonus),
        }
    }

    /// Load the initial state from a static source
    ///
    /// Any acquisition error degrades to the open fallback state; nothing is
    /// propagated to the caller.
    pub fn initialize(&self, source: &dyn WeatherSource) -> WeatherState {
        let config = match source.load() {
            Ok(config) => {
                tracing::info!(
                    sunny = config.state.sunny,
                    rainy = config.state.rainy,
                    "Weather initialized from static source"
                );
                config
            }
            Err(e) => {
                tracing::warn!("Weather source unusable ({}), falling back to open gate", e);
                WeatherConfig::fallback()
            }
        };

        *self.description.lock() = config.description;
        *self.bonus.lock() = config.bonus;
        self.replace(config.state);
        config.state
    }

    /// Draw a new state: two independent fair coin flips
    pub fn refresh(&self) -> WeatherState {
        let state = {
            let mut rng = self.rng.lock();
            let sunny = rng.random_bool(0.5);
            let rainy = rng.random_bool(0.5);
            WeatherState::new(sunny, rainy)
        };

        tracing::debug!(sunny = state.sunny, rainy = state.rainy, "Weather refreshed");
        self.replace(state);
        state
    }

    /// Overwrite the current state and notify every subscriber
    pub fn replace(&self, state: WeatherState) {
        self.state_tx.send_replace(state);
    }

    pub fn state(&self) -> WeatherState {
        *self.state_tx.borrow()
    }

    pub fn is_gate_open(&self) -> bool {
        self.state().is_gate_open()
    }

    pub fn description(&self) -> String {
        self.description.lock().clone()
    }

    /// Weather bonus supplied by the static document, if any
    pub fn bonus_override(&self) -> Option<u32> {
        *self.bonus.lock()
    }

    /// Receiver that wakes on every state write
    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state_tx.subscribe()
    }

    /// Start periodic refreshes on the current tokio runtime
    ///
    /// The first refresh happens one full period after the call.
    pub fn start(self: &Arc<Self>, period: Duration) -> WeatherTicker {
        let oracle = Arc::clone(self);
        tracing::info!(period_secs = period.as_secs_f64(), "Starting weather refresh ticker");

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                oracle.refresh();
            }
        });

        WeatherTicker { handle: Some(handle) }
    }
}

impl Default for WeatherOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WeatherOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherOracle")
            .field("state", &self.state())
            .field("bonus", &self.bonus_override())
            .finish_non_exhaustive()
    }
}

/// Handle to the periodic refresh task; stopping or dropping it ends the task
#[derive(Debug)]
pub struct WeatherTicker {
    handle: Option<JoinHandle<()>>,
}

impl WeatherTicker {
    pub fn stop(mut self) {
        self.abort();
        tracing::info!("Weather refresh ticker stopped");
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for WeatherTicker {
    fn drop(&mut self) {
        self.abort();
    }
}
