use axum::{
    extract::{Path, State as AxumState},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use riddle_types::{
    api::{Clue, Completion, ErrorResponse, Leaderboard, PlayerRequest, PlayerSnapshot, Stats},
    Stage, FIRST_CLUE,
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{Any, CorsLayer};

mod clock;
pub mod config;
mod registry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError, RateLimit, ValidatedConfig};
pub use registry::Registry;

/// Failure of a game operation as seen by HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Game(#[from] riddle_types::Error),
    #[error("player registry unavailable")]
    Poisoned,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Game(riddle_types::Error::PlayerNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Game(_) => StatusCode::BAD_REQUEST,
            ApiError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(%status, "Rejected request: {}", self);
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// The riddle hunt: one registry of players plus the clock that stamps them.
///
/// Mutating operations hold the write lock across their whole
/// check-then-update sequence; reads clone out of the read lock so each
/// response reflects a single consistent state.
#[derive(Clone)]
pub struct Game {
    registry: Arc<RwLock<Registry>>,
    clock: Arc<dyn Clock>,
}

impl Game {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::new())),
            clock,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Registry>, ApiError> {
        self.registry.read().map_err(|e| {
            tracing::error!("Failed to acquire registry read lock: {}", e);
            ApiError::Poisoned
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Registry>, ApiError> {
        self.registry.write().map_err(|e| {
            tracing::error!("Failed to acquire registry write lock: {}", e);
            ApiError::Poisoned
        })
    }

    /// Registers a player and hands out the first clue.
    pub fn start(&self, name: &str) -> Result<Clue, ApiError> {
        let mut registry = self.write()?;
        let now = self.clock.now();
        registry.register(name.to_string(), now)?;
        tracing::info!(player = name, players = registry.len(), "Player registered");
        Ok(Clue::from(FIRST_CLUE))
    }

    /// Clears an intermediate stage and hands out the next clue.
    pub fn advance(&self, name: &str, stage: Stage) -> Result<Clue, ApiError> {
        let mut registry = self.write()?;
        let now = self.clock.now();
        let player = registry.find_mut(name)?;
        let clue = player.advance(stage, now)?;
        tracing::debug!(player = name, %stage, progress = player.progress(), "Stage cleared");
        Ok(Clue::from(clue))
    }

    /// Clears the final stage.
    pub fn finish(&self, name: &str) -> Result<Completion, ApiError> {
        let mut registry = self.write()?;
        let now = self.clock.now();
        let completion = registry.find_mut(name)?.complete(now)?;
        tracing::info!(
            player = name,
            seconds = completion.completion_time_seconds,
            "Player completed the hunt"
        );
        Ok(completion)
    }

    pub fn players(&self) -> Result<Vec<PlayerSnapshot>, ApiError> {
        Ok(self.read()?.list())
    }

    pub fn player(&self, name: &str) -> Result<PlayerSnapshot, ApiError> {
        Ok(self.read()?.find(name)?.snapshot())
    }

    pub fn leaderboard(&self) -> Result<Leaderboard, ApiError> {
        Ok(riddle_types::leaderboard(self.read()?.players()))
    }

    pub fn stats(&self) -> Result<Stats, ApiError> {
        Ok(riddle_types::stats(self.read()?.players()))
    }
}

pub struct Api {
    game: Arc<Game>,
    rate_limit: Option<RateLimit>,
}

impl Api {
    pub fn new(game: Arc<Game>) -> Self {
        Self {
            game,
            rate_limit: None,
        }
    }

    /// Throttles requests per client IP.
    ///
    /// The router must then be served with
    /// `into_make_service_with_connect_info::<SocketAddr>()` so the peer
    /// address is available when no forwarding header is present.
    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn router(&self) -> Router {
        // Configure CORS
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        let mut router = Router::new()
            .route("/health", get(health))
            .route("/start", post(start))
            .route("/age", post(age))
            .route("/fire", post(fire))
            .route("/secrets", post(secrets))
            .route("/players", get(players))
            .route("/players/:name", get(player))
            .route("/leaderboard", get(leaderboard))
            .route("/stats", get(stats))
            .layer(cors);

        if let Some(limit) = self.rate_limit {
            match GovernorConfigBuilder::default()
                .per_millisecond(limit.replenish_interval_ms)
                .burst_size(limit.burst_size)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
            {
                Some(config) => {
                    router = router.layer(GovernorLayer {
                        config: Arc::new(config),
                    });
                }
                None => tracing::warn!(?limit, "Ignoring unusable rate limit"),
            }
        }

        router.with_state(self.game.clone())
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn start(
    AxumState(game): AxumState<Arc<Game>>,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<Clue>, ApiError> {
    game.start(&request.name).map(Json)
}

async fn age(
    AxumState(game): AxumState<Arc<Game>>,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<Clue>, ApiError> {
    game.advance(&request.name, Stage::Age).map(Json)
}

async fn fire(
    AxumState(game): AxumState<Arc<Game>>,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<Clue>, ApiError> {
    game.advance(&request.name, Stage::Fire).map(Json)
}

async fn secrets(
    AxumState(game): AxumState<Arc<Game>>,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<Completion>, ApiError> {
    game.finish(&request.name).map(Json)
}

async fn players(
    AxumState(game): AxumState<Arc<Game>>,
) -> Result<Json<Vec<PlayerSnapshot>>, ApiError> {
    game.players().map(Json)
}

async fn player(
    AxumState(game): AxumState<Arc<Game>>,
    Path(name): Path<String>,
) -> Result<Json<PlayerSnapshot>, ApiError> {
    game.player(&name).map(Json)
}

async fn leaderboard(AxumState(game): AxumState<Arc<Game>>) -> Result<Json<Leaderboard>, ApiError> {
    game.leaderboard().map(Json)
}

async fn stats(AxumState(game): AxumState<Arc<Game>>) -> Result<Json<Stats>, ApiError> {
    game.stats().map(Json)
}
