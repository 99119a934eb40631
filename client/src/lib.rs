pub mod client;

pub use client::Client;
pub use client::RetryPolicy;
use thiserror::Error;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("failed: {0}")]
    Failed(reqwest::StatusCode),
    #[error("rejected ({status}): {message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use chrono::{Duration, TimeZone, Utc};
    use riddle_server::{Api, Game, ManualClock};
    use riddle_types::{
        api::{ErrorResponse, Stats},
        Stage, FIRE_CLUE, FIRST_CLUE, SECRETS_CLUE, STAGE_COUNT, WIN_MESSAGE,
    };
    use std::{
        net::SocketAddr,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Instant,
    };
    use tokio::time::{sleep, Duration as TokioDuration};

    struct TestContext {
        clock: ManualClock,
        base_url: String,
        server_handle: tokio::task::JoinHandle<()>,
    }

    impl TestContext {
        async fn new() -> Self {
            let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap());
            let game = Arc::new(Game::new(Arc::new(clock.clone())));
            let api = Api::new(game);

            // Start server on random port
            let addr = SocketAddr::from(([127, 0, 0, 1], 0));
            let router = api.router();
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            let actual_addr = listener.local_addr().unwrap();
            let base_url = format!("http://{actual_addr}");

            let server_handle = tokio::spawn(async move {
                axum::serve(
                    listener,
                    router.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .await
                .unwrap();
            });

            // Give server time to start
            sleep(TokioDuration::from_millis(100)).await;

            Self {
                clock,
                base_url,
                server_handle,
            }
        }

        fn create_client(&self) -> Client {
            Client::new(&self.base_url).unwrap()
        }
    }

    impl Drop for TestContext {
        fn drop(&mut self) {
            self.server_handle.abort();
        }
    }

    #[tokio::test]
    async fn test_client_full_game() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();
        client.health().await.unwrap();

        assert_eq!(client.start("Alice").await.unwrap().clue, FIRST_CLUE);
        assert_eq!(
            client.advance("Alice", Stage::Age).await.unwrap().clue,
            FIRE_CLUE
        );
        assert_eq!(
            client.advance("alice", Stage::Fire).await.unwrap().clue,
            SECRETS_CLUE
        );

        ctx.clock.advance(Duration::seconds(125));
        let completion = client.finish("Alice").await.unwrap();
        assert_eq!(completion.message, WIN_MESSAGE);
        assert_eq!(completion.completion_time_seconds, 125.0);

        let snapshot = client.player("ALICE").await.unwrap().unwrap();
        assert!(snapshot.completed);
        assert_eq!(snapshot.progress, STAGE_COUNT);
        assert_eq!(snapshot.ended, Some(completion.completed_at));

        let board = client.leaderboard().await.unwrap();
        assert_eq!(board.total_completed, 1);
        assert_eq!(board.leaderboard[0].name, "Alice");
        assert_eq!(board.leaderboard[0].time_formatted, "2m 5s");
    }

    #[tokio::test]
    async fn test_client_rejections() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();

        client.start("Bob").await.unwrap();
        let err = client.start("bob").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rejected { status, .. } if status == reqwest::StatusCode::BAD_REQUEST
        ));

        let err = client.advance("Bob", Stage::Fire).await.unwrap_err();
        match err {
            Error::Rejected { status, message } => {
                assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
                assert!(message.starts_with("wrong stage"));
            }
            other => panic!("Expected rejection, got {other:?}"),
        }

        let err = client.finish("Nobody").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rejected { status, .. } if status == reqwest::StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_client_finish_twice() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();

        client.start("Carol").await.unwrap();
        client.advance("Carol", Stage::Age).await.unwrap();
        client.advance("Carol", Stage::Fire).await.unwrap();
        client.finish("Carol").await.unwrap();

        let err = client.finish("Carol").await.unwrap_err();
        match err {
            Error::Rejected { message, .. } => {
                assert_eq!(message, "player already completed the hunt: Carol")
            }
            other => panic!("Expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_listing_and_stats() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();

        let stats = client.stats().await.unwrap();
        assert_eq!(stats.total_players, 0);
        assert_eq!(stats.completion_rate, "0%");
        assert!(client.players().await.unwrap().is_empty());
        assert!(client.player("Ghost").await.unwrap().is_none());

        for name in ["A", "B", "C"] {
            client.start(name).await.unwrap();
        }
        for (name, seconds) in [("A", 10), ("B", 5)] {
            client.advance(name, Stage::Age).await.unwrap();
            client.advance(name, Stage::Fire).await.unwrap();
            ctx.clock.advance(Duration::seconds(seconds));
            client.finish(name).await.unwrap();
        }

        let names = client
            .players()
            .await
            .unwrap()
            .into_iter()
            .map(|player| player.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "B", "C"]);

        // A took 10s, B took 15s since both joined at the same instant.
        let board = client.leaderboard().await.unwrap();
        let ranked = board
            .leaderboard
            .iter()
            .map(|entry| (entry.rank, entry.name.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(ranked, vec![(1, "A"), (2, "B")]);
        assert_eq!(board.total_players, 3);

        let stats = client.stats().await.unwrap();
        assert_eq!(stats.completed_players, 2);
        assert_eq!(stats.active_players, 1);
        assert_eq!(stats.fastest_completion_time, Some(10.0));
        assert_eq!(stats.average_completion_time, Some(12.5));
    }

    #[tokio::test]
    async fn test_client_names_are_path_encoded() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();

        client.start("Ana María/2").await.unwrap();
        let snapshot = client.player("ana maría/2").await.unwrap().unwrap();
        assert_eq!(snapshot.name, "Ana María/2");
    }

    #[test]
    fn test_client_invalid_scheme() {
        let result = Client::new("ftp://example.com");
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(matches!(err, Error::InvalidScheme(_)));
            assert_eq!(
                err.to_string(),
                "invalid URL scheme: ftp (expected http or https)"
            );
        }

        assert!(Client::new("http://localhost:8080").is_ok());
        assert!(Client::new("https://localhost:8080").is_ok());
        assert!(matches!(Client::new("not a url"), Err(Error::Url(_))));
    }

    #[test]
    fn test_retry_policy() {
        let client = Client::new("http://localhost:8080").unwrap();
        assert_eq!(client.retry_policy(), RetryPolicy::default());

        let policy = RetryPolicy {
            max_attempts: 4,
            ..RetryPolicy::default()
        };
        let client = client.with_retry_policy(policy);
        assert_eq!(client.retry_policy().max_attempts, 4);
    }

    /// Server whose endpoints fail on demand, counting every request.
    #[derive(Clone, Default)]
    struct Flaky {
        stats_calls: Arc<AtomicUsize>,
        leaderboard_calls: Arc<AtomicUsize>,
        start_calls: Arc<AtomicUsize>,
    }

    fn empty_stats() -> Stats {
        Stats {
            total_players: 0,
            completed_players: 0,
            active_players: 0,
            completion_rate: "0%".to_string(),
            average_completion_time: None,
            fastest_completion_time: None,
        }
    }

    /// 503 on the first call, stats afterwards.
    async fn flaky_stats(State(flaky): State<Flaky>) -> Response {
        if flaky.stats_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
        }
        Json(empty_stats()).into_response()
    }

    /// Always 400.
    async fn rejecting_leaderboard(State(flaky): State<Flaky>) -> Response {
        flaky.leaderboard_calls.fetch_add(1, Ordering::SeqCst);
        let body = ErrorResponse {
            error: "bad request".to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }

    /// Always 503.
    async fn unavailable_start(State(flaky): State<Flaky>) -> Response {
        flaky.start_calls.fetch_add(1, Ordering::SeqCst);
        (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response()
    }

    struct FlakyContext {
        flaky: Flaky,
        base_url: String,
        server_handle: tokio::task::JoinHandle<()>,
    }

    impl FlakyContext {
        async fn new() -> Self {
            let flaky = Flaky::default();
            let router = Router::new()
                .route("/stats", get(flaky_stats))
                .route("/leaderboard", get(rejecting_leaderboard))
                .route("/start", post(unavailable_start))
                .with_state(flaky.clone());

            let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
                .await
                .unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let server_handle = tokio::spawn(async move {
                axum::serve(listener, router).await.unwrap();
            });
            sleep(TokioDuration::from_millis(100)).await;

            Self {
                flaky,
                base_url,
                server_handle,
            }
        }

        fn create_client(&self, max_attempts: usize) -> Client {
            Client::new(&self.base_url)
                .unwrap()
                .with_retry_policy(RetryPolicy {
                    max_attempts,
                    initial_backoff: TokioDuration::from_millis(10),
                    max_backoff: TokioDuration::from_millis(50),
                })
        }
    }

    impl Drop for FlakyContext {
        fn drop(&mut self) {
            self.server_handle.abort();
        }
    }

    #[tokio::test]
    async fn test_get_retries_unavailable() {
        let ctx = FlakyContext::new().await;
        let client = ctx.create_client(2);

        let stats = client.stats().await.unwrap();
        assert_eq!(stats, empty_stats());
        assert_eq!(ctx.flaky.stats_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_single_attempt_surfaces_unavailable() {
        let ctx = FlakyContext::new().await;
        let client = ctx.create_client(1);

        let err = client.stats().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Failed(status) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
        assert_eq!(ctx.flaky.stats_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_bad_request_not_retried() {
        let ctx = FlakyContext::new().await;
        let client = ctx.create_client(5);

        let err = client.leaderboard().await.unwrap_err();
        match err {
            Error::Rejected { status, message } => {
                assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
                assert_eq!(message, "bad request");
            }
            other => panic!("Expected rejection, got {other:?}"),
        }
        assert_eq!(ctx.flaky.leaderboard_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stage_submission_not_retried() {
        let ctx = FlakyContext::new().await;
        let client = ctx.create_client(5);

        let err = client.start("Alice").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Failed(status) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
        assert_eq!(ctx.flaky.start_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_retries_connect_errors_with_backoff() {
        // Reserve a port, then close it so every connection is refused.
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::new(&format!("http://{addr}"))
            .unwrap()
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                initial_backoff: TokioDuration::from_millis(40),
                max_backoff: TokioDuration::from_millis(200),
            });

        // Two backoffs (40ms, then 80ms) separate the three attempts.
        let started = Instant::now();
        let err = client.stats().await.unwrap_err();
        assert!(started.elapsed() >= TokioDuration::from_millis(120));
        match err {
            Error::Reqwest(err) => assert!(err.is_connect()),
            other => panic!("Expected connect error, got {other:?}"),
        }
    }
}
