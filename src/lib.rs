//! Daily comment-connections puzzle service.
//!
//! Sixteen reader comments, four hidden source articles: the generator deals
//! a shuffled board from a news feed, the validator grades four-tile guesses
//! per party, and [`web::serve`] puts both behind an axum JSON surface. The
//! core modules are synchronous and usable without the server.

pub mod extract;
pub mod generate;
pub mod guess;
pub mod normalize;
pub mod progress;
pub mod puzzle;
pub mod session;
pub mod source;
pub mod token;
pub mod web;

pub use extract::{Comment, CommentExtractor, ListviewExtractor};
pub use generate::{GenerateError, GenerateOptions, generate_puzzle};
pub use guess::{GROUP_SIZE, GuessError, GuessOutcome, MatchedArticle, check_guess};
pub use normalize::{count_quoted_spans, strip_quoted_spans};
pub use progress::{PartyProgress, ProgressTracker};
pub use puzzle::{ARTICLE_COUNT, COMMENTS_PER_ARTICLE, Difficulty, Puzzle, TILE_COUNT, Tile};
pub use session::SessionStore;
pub use source::{Article, FeedSource, FetchError, FileFeed, PageDir, PageFetcher};
pub use token::{daily_key, party_token, session_token};
pub use web::{AppState, Keying, ServeConfig, WebError, serve};
