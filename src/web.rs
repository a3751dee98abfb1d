use crate::extract::{Comment, CommentExtractor, ListviewExtractor};
use crate::generate::{GenerateError, GenerateOptions, generate_puzzle};
use crate::guess::{GuessError, GuessOutcome, check_guess};
use crate::progress::ProgressTracker;
use crate::puzzle::{ARTICLE_COUNT, Difficulty, Puzzle};
use crate::session::SessionStore;
use crate::source::{Article, FeedSource, FileFeed, PageDir, PageFetcher};
use crate::token::{daily_key, party_token, session_token};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState = Arc<AppState>;

/// Everything the handlers share: the stores plus the collaborator seams the
/// generator pulls from. Built once at startup (or per test fixture) and
/// never mutated except through the stores' own locks.
pub struct AppState {
    pub sessions: SessionStore,
    pub progress: ProgressTracker,
    pub feed: Box<dyn FeedSource>,
    pub fetcher: Box<dyn PageFetcher>,
    pub extractor: Box<dyn CommentExtractor>,
    pub keying: Keying,
    pub expose_solution: bool,
    pub generate: GenerateOptions,
}

impl AppState {
    /// Stored puzzle for `key`, generated on first sight. Single-flight per
    /// key; runs the blocking fetch loop, so call it off the async runtime.
    fn puzzle_for(&self, key: &str) -> Result<Arc<Puzzle>, GenerateError> {
        self.sessions.get_or_create(key, || {
            let candidates = self.feed.fetch().map_err(GenerateError::Feed)?;
            let mut rng = SmallRng::from_entropy();
            let puzzle = generate_puzzle(
                &mut rng,
                &candidates,
                self.fetcher.as_ref(),
                self.extractor.as_ref(),
                &self.generate,
            )?;
            info!(key, answer = ?puzzle.answer_key(), "generated puzzle");
            Ok(puzzle)
        })
    }
}

/// How session keys are minted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Keying {
    /// One shared puzzle per UTC calendar day.
    #[default]
    Daily,
    /// A fresh random key, and so a fresh puzzle, per start-game call.
    Token,
}

impl fmt::Display for Keying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keying::Daily => write!(f, "daily"),
            Keying::Token => write!(f, "token"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub addr: SocketAddr,
    pub feed_path: PathBuf,
    pub pages_dir: PathBuf,
    pub keying: Keying,
    pub expose_solution: bool,
    pub generate_deadline: Option<Duration>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            feed_path: PathBuf::from("feed.json"),
            pages_dir: PathBuf::from("pages"),
            keying: Keying::default(),
            expose_solution: false,
            generate_deadline: None,
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: ServeConfig) -> Result<(), WebError> {
    let state = Arc::new(AppState {
        sessions: SessionStore::new(),
        progress: ProgressTracker::new(),
        feed: Box::new(FileFeed::new(config.feed_path.clone())),
        fetcher: Box::new(PageDir::new(config.pages_dir.clone())),
        extractor: Box::new(ListviewExtractor),
        keying: config.keying,
        expose_solution: config.expose_solution,
        generate: GenerateOptions { deadline: config.generate_deadline },
    });
    let router = build_router(state);
    info!(
        %config.addr,
        keying = %config.keying,
        feed = %config.feed_path.display(),
        pages = %config.pages_dir.display(),
        expose_solution = config.expose_solution,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

impl From<GuessError> for ApiError {
    fn from(value: GuessError) -> Self {
        match value {
            GuessError::UnknownSession => {
                ApiError::not_found("No game found for that session key.")
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<GenerateError> for ApiError {
    fn from(value: GenerateError) -> Self {
        match value {
            GenerateError::Feed(err) => {
                ApiError::bad_gateway(format!("Article feed is unavailable: {err}"))
            }
            other => ApiError::unavailable(other.to_string()),
        }
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/start-game", get(start_game).post(start_game))
        .route("/check-solution", post(check_solution))
        .route("/get-solution", get(get_solution))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn home() -> impl IntoResponse {
    Html(render_home())
}

fn render_home() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Commentions</title>
  </head>
  <body>
    <main>
      <p>commentions v{version}</p>
      <h1>Group sixteen reader comments by the article they answer.</h1>
      <p>Each game hides four articles behind sixteen shuffled comments.
      Guess four tiles at a time; three right earns a one-away hint.</p>
      <ul>
        <li><code>POST /start-game</code> deals today's board</li>
        <li><code>POST /check-solution</code> grades a four-tile guess</li>
        <li><code>GET /healthz</code> liveness</li>
      </ul>
    </main>
  </body>
</html>"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "commentions",
        "sessions": state.sessions.len(),
    }))
}

async fn start_game(State(state): State<SharedState>) -> Result<Json<StartGameResponse>, ApiError> {
    let session_key = match state.keying {
        Keying::Daily => daily_key(),
        Keying::Token => session_token(),
    };
    let puzzle = {
        let state = state.clone();
        let key = session_key.clone();
        tokio::task::spawn_blocking(move || state.puzzle_for(&key))
            .await
            .map_err(|_| ApiError::internal("Puzzle generation task failed."))??
    };
    Ok(Json(StartGameResponse::from_puzzle(
        session_key,
        party_token(),
        &puzzle,
    )))
}

async fn check_solution(
    State(state): State<SharedState>,
    Json(request): Json<CheckSolutionRequest>,
) -> Result<Json<CheckSolutionResponse>, ApiError> {
    let party_key = request
        .party_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ApiError::bad_request("Provide a non-empty `party_key`."))?;
    let outcome = check_guess(
        &state.sessions,
        &state.progress,
        &request.session_key,
        party_key,
        &request.group,
    )?;
    Ok(Json(CheckSolutionResponse::from_outcome(outcome)))
}

async fn get_solution(
    State(state): State<SharedState>,
    Query(params): Query<SolutionParams>,
) -> Result<Json<SolutionResponse>, ApiError> {
    if !state.expose_solution {
        return Err(ApiError::not_found("Not found."));
    }
    let key = params
        .session_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ApiError::bad_request("Provide a `session_key` query parameter."))?;
    let puzzle = state
        .sessions
        .get(key)
        .ok_or_else(|| ApiError::not_found("No game found for that session key."))?;
    Ok(Json(SolutionResponse {
        solution: puzzle.answer_key(),
        colors: *puzzle.colors(),
    }))
}

#[derive(Debug, Deserialize)]
struct SolutionParams {
    session_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TilePayload {
    comment: Comment,
    index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StartGameResponse {
    session_key: String,
    party_key: String,
    articles: Vec<Article>,
    tiles: Vec<TilePayload>,
}

impl StartGameResponse {
    fn from_puzzle(session_key: String, party_key: String, puzzle: &Puzzle) -> Self {
        let tiles = puzzle
            .tiles()
            .iter()
            .enumerate()
            .map(|(index, tile)| TilePayload {
                comment: tile.comment().clone(),
                index,
            })
            .collect();
        Self {
            session_key,
            party_key,
            articles: puzzle.articles().to_vec(),
            tiles,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckSolutionRequest {
    #[serde(default)]
    session_key: String,
    #[serde(default)]
    party_key: Option<String>,
    #[serde(default)]
    group: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CheckSolutionResponse {
    correct: bool,
    finished: bool,
    remaining: usize,
    one_away: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    article_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    article_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<Difficulty>,
}

impl CheckSolutionResponse {
    fn from_outcome(outcome: GuessOutcome) -> Self {
        let (article_title, article_url, color) = match outcome.matched {
            Some(matched) => (Some(matched.title), Some(matched.url), Some(matched.color)),
            None => (None, None, None),
        };
        Self {
            correct: outcome.correct,
            finished: outcome.finished,
            remaining: outcome.remaining,
            one_away: outcome.one_away,
            article_title,
            article_url,
            color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SolutionResponse {
    solution: Vec<usize>,
    colors: [Difficulty; ARTICLE_COUNT],
}
