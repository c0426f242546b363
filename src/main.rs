use rainbow_match::config::Settings;
use rainbow_match::core::{Matcher, MatchPhase, MatchSession, WeatherOracle};
use rainbow_match::models::WeatherState;
use rainbow_match::services::{InMemoryRegistry, JsonFileSource, NoSource, UserRegistry, WeatherSource};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn log_weather(state: WeatherState) {
    let condition = state.condition();
    info!(
        sunny = state.sunny,
        rainy = state.rainy,
        condition = condition.headline(),
        status = condition.status(),
        "{}",
        condition.message()
    );
}

fn log_phase(phase: &MatchPhase, oracle: &WeatherOracle, registry: &dyn UserRegistry, requester_id: &str) {
    match phase {
        MatchPhase::Idle => {
            let state = oracle.state();
            if !state.is_gate_open() {
                log_weather(state);
            } else if registry.find(requester_id).is_none() {
                warn!(requester_id, "Requester is not registered, nothing to match");
            } else {
                info!(requester_id, "Waiting for matches");
            }
        }
        MatchPhase::Computing { generation } => {
            info!(generation, "Finding your perfect matches...");
        }
        MatchPhase::Ready { generation, results, summary, .. } => {
            info!(
                generation,
                matches = summary.total_matches,
                interests = summary.interest_count,
                highest = summary.highest_compatibility,
                "Compatible matches found"
            );
            for (rank, m) in results.iter().enumerate() {
                info!(
                    rank = rank + 1,
                    id = %m.person.id,
                    name = %m.person.name,
                    score = m.compatibility_score,
                    shared = ?m.shared_interests,
                    "Match"
                );
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load()?;
    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Rainbow Match...");

    let weights = settings.scoring_weights()?;
    let matcher = Matcher::new(weights).with_limit(settings.matching.limit);
    info!("Matcher initialized with weights: {:?}", matcher.weights());

    let registry = Arc::new(InMemoryRegistry::from_json_file(&settings.data.users_path)?);

    let requester_id = match std::env::args().nth(1) {
        Some(id) => id,
        None => match registry.snapshot().first() {
            Some(person) => person.id.clone(),
            None => {
                error!("User registry is empty, nobody to match for");
                return Ok(());
            }
        },
    };

    // Initialize weather
    let oracle = Arc::new(match settings.weather.seed {
        Some(seed) => WeatherOracle::with_seed(seed),
        None => WeatherOracle::new(),
    });

    let source: Box<dyn WeatherSource> = match &settings.weather.source {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(NoSource),
    };
    oracle.initialize(source.as_ref());
    if settings.weather.refresh_on_start {
        oracle.refresh();
    }
    log_weather(oracle.state());
    let ticker = oracle.start(settings.weather.refresh_interval());

    let session = Arc::new(MatchSession::new(
        matcher,
        Arc::clone(&oracle),
        Arc::clone(&registry) as Arc<dyn UserRegistry>,
        settings.matching.compute_delay(),
    ));

    info!(requester_id = %requester_id, "Following matches");
    let mut phases = session.subscribe();
    let mut weather_rx = oracle.subscribe();
    let follower = session.follow(requester_id.clone());

    loop {
        tokio::select! {
            changed = phases.changed() => {
                if changed.is_err() {
                    warn!("Match session closed");
                    break;
                }
                let phase = phases.borrow_and_update().clone();
                log_phase(&phase, &oracle, registry.as_ref(), &requester_id);
            }
            changed = weather_rx.changed() => {
                if changed.is_err() {
                    warn!("Weather oracle closed");
                    break;
                }
                let state = *weather_rx.borrow_and_update();
                // An idle phase stays idle across closed-gate draws, so no phase change reports them
                if session.phase() == MatchPhase::Idle {
                    log_weather(state);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    follower.abort();
    ticker.stop();
    Ok(())
}
