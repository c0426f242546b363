use crate::core::{matcher::MatchError, Matcher, WeatherOracle};
use crate::models::{MatchResult, MatchSummary, WeatherState};
use crate::services::UserRegistry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use validator::Validate;

/// Visible state of the match screen
#[derive(Debug, Clone, PartialEq)]
pub enum MatchPhase {
    Idle,
    Computing {
        generation: u64,
    },
    Ready {
        generation: u64,
        requester_id: String,
        weather: WeatherState,
        results: Arc<Vec<MatchResult>>,
        summary: MatchSummary,
        computed_at: chrono::DateTime<chrono::Utc>,
    },
}

impl MatchPhase {
    pub fn generation(&self) -> Option<u64> {
        match self {
            MatchPhase::Idle => None,
            MatchPhase::Computing { generation } | MatchPhase::Ready { generation, .. } => {
                Some(*generation)
            }
        }
    }

    pub fn results(&self) -> Option<&[MatchResult]> {
        match self {
            MatchPhase::Ready { results, .. } => Some(results.as_slice()),
            _ => None,
        }
    }
}

/// What a trigger did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A computation was scheduled under this generation
    Scheduled(u64),
    /// The weather gate is closed; the phase went back to idle
    GateClosed(WeatherState),
    /// The requester is no longer registered; the phase went back to idle
    UnknownRequester,
}

/// How a finished computation was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commit {
    Published,
    /// A newer trigger was issued meanwhile
    Superseded,
    /// Still the latest trigger, but weather or pool changed underneath it
    Stale,
}

/// Drives the match engine for one screen
///
/// Every trigger is numbered. A deferred computation only reaches the
/// visible phase if its number is still the latest one issued and the
/// weather and registry revision it was computed from are still current.
/// Otherwise it is dropped; a stale latest computation leaves the phase idle.
pub struct MatchSession {
    matcher: Matcher,
    oracle: Arc<WeatherOracle>,
    registry: Arc<dyn UserRegistry>,
    delay: Duration,
    generation: AtomicU64,
    phase_tx: watch::Sender<MatchPhase>,
}

impl MatchSession {
    pub fn new(
        matcher: Matcher,
        oracle: Arc<WeatherOracle>,
        registry: Arc<dyn UserRegistry>,
        delay: Duration,
    ) -> Self {
        let (phase_tx, _) = watch::channel(MatchPhase::Idle);
        Self {
            matcher,
            oracle,
            registry,
            delay,
            generation: AtomicU64::new(0),
            phase_tx,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MatchPhase> {
        self.phase_tx.subscribe()
    }

    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn oracle(&self) -> &Arc<WeatherOracle> {
        &self.oracle
    }

    /// Re-derive matches for `requester_id` from the current pool and weather
    ///
    /// Must be called from within a tokio runtime; the computation itself
    /// runs after the configured delay.
    ///
    /// # Errors
    /// `MatchError::InvalidRequester` when the registered requester fails
    /// validation. The phase is reset to idle in that case.
    pub fn trigger(self: &Arc<Self>, requester_id: &str) -> Result<TriggerOutcome, MatchError> {
        let weather = self.oracle.state();
        if !weather.is_gate_open() {
            tracing::debug!(
                sunny = weather.sunny,
                rainy = weather.rainy,
                "Weather gate closed, not matching"
            );
            self.reset();
            return Ok(TriggerOutcome::GateClosed(weather));
        }

        let Some(requester) = self.registry.find(requester_id) else {
            tracing::debug!(requester_id, "Requester not registered");
            self.reset();
            return Ok(TriggerOutcome::UnknownRequester);
        };

        if let Err(source) = requester.validate() {
            self.reset();
            return Err(MatchError::InvalidRequester {
                id: requester.id,
                source,
            });
        }

        // Revision first: a write between the two reads then shows up as stale
        let revision = self.registry.revision();
        let pool = self.registry.snapshot();
        let matcher = match self.oracle.bonus_override() {
            Some(bonus) => self.matcher.clone().with_weather_bonus(bonus),
            None => self.matcher.clone(),
        };

        let generation = self.begin();
        tracing::debug!(generation, requester_id, pool = pool.len(), "Scheduled match computation");

        let session = Arc::clone(self);
        let delay = self.delay;
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let phase = match matcher.find_matches(&requester, &pool, Some(&weather)) {
                Ok(results) => MatchPhase::Ready {
                    generation,
                    requester_id: requester.id.clone(),
                    weather,
                    summary: MatchSummary::new(&requester, &results),
                    results: Arc::new(results),
                    computed_at: chrono::Utc::now(),
                },
                Err(e) => {
                    tracing::error!(generation, "Match computation failed: {}", e);
                    MatchPhase::Idle
                }
            };

            match session.commit(generation, weather, revision, phase) {
                Commit::Published => tracing::debug!(generation, "Match results committed"),
                Commit::Superseded => {
                    tracing::debug!(generation, "Discarded superseded match computation")
                }
                Commit::Stale => {
                    tracing::debug!(generation, "Inputs changed during computation, going idle")
                }
            }
        });

        Ok(TriggerOutcome::Scheduled(generation))
    }

    /// Re-trigger for `requester_id` on every weather or registry change
    ///
    /// The returned task runs until aborted.
    pub fn follow(self: &Arc<Self>, requester_id: impl Into<String>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        let requester_id = requester_id.into();
        let mut weather_rx = self.oracle.subscribe();
        let mut pool_rx = self.registry.subscribe();

        tokio::spawn(async move {
            loop {
                match session.trigger(&requester_id) {
                    Ok(TriggerOutcome::UnknownRequester) => {
                        tracing::warn!(requester_id = %requester_id, "Requester is not registered");
                    }
                    Ok(outcome) => tracing::debug!(?outcome, "Match trigger handled"),
                    Err(e) => tracing::error!("Match trigger rejected: {}", e),
                }

                tokio::select! {
                    changed = weather_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = pool_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Issue a new generation and publish `Computing` under the same lock
    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.phase_tx.send_modify(|phase| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *phase = MatchPhase::Computing { generation };
        });
        generation
    }

    /// Invalidate any in-flight computation and go idle
    fn reset(&self) {
        self.phase_tx.send_if_modified(|phase| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            if *phase == MatchPhase::Idle {
                return false;
            }
            *phase = MatchPhase::Idle;
            true
        });
    }

    /// Publish `phase` only if `generation` is still the latest one issued
    /// and the weather and registry revision it was derived from still hold
    fn commit(
        &self,
        generation: u64,
        weather: WeatherState,
        revision: u64,
        phase: MatchPhase,
    ) -> Commit {
        let mut outcome = Commit::Superseded;
        self.phase_tx.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }

            if self.oracle.state() != weather || self.registry.revision() != revision {
                outcome = Commit::Stale;
                *current = MatchPhase::Idle;
                return true;
            }

            outcome = Commit::Published;
            *current = phase;
            true
        });
        outcome
    }
}

impl std::fmt::Debug for MatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSession")
            .field("delay", &self.delay)
            .field("generation", &self.latest_generation())
            .finish_non_exhaustive()
    }
}
