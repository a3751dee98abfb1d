//! Guess validation.
//!
//! A guess names four distinct, unconsumed display indices. Validation
//! rejects malformed guesses before touching any state; only a correct guess
//! consumes its tiles, and only a correct guess reveals which article it
//! matched. A wrong guess with three tiles from one article earns a one-away
//! hint and nothing more.

use std::fmt;

use crate::progress::ProgressTracker;
use crate::puzzle::{ARTICLE_COUNT, COMMENTS_PER_ARTICLE, Difficulty};
use crate::session::SessionStore;

/// Tiles per guess; equals the group size the puzzle hides.
pub const GROUP_SIZE: usize = COMMENTS_PER_ARTICLE;

/// Why a guess was rejected. Rejected guesses mutate nothing.
#[derive(Debug, PartialEq, Eq)]
pub enum GuessError {
    UnknownSession,
    WrongGroupSize { got: usize },
    DuplicateIndex { index: usize },
    IndexOutOfRange { index: usize, tile_count: usize },
    IndexAlreadyUsed { index: usize },
}

impl fmt::Display for GuessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuessError::UnknownSession => write!(f, "unknown game session"),
            GuessError::WrongGroupSize { got } => {
                write!(f, "a guess names exactly {GROUP_SIZE} tiles, got {got}")
            }
            GuessError::DuplicateIndex { index } => {
                write!(f, "tile {index} appears more than once in the guess")
            }
            GuessError::IndexOutOfRange { index, tile_count } => {
                write!(f, "tile {index} is out of range for a {tile_count}-tile board")
            }
            GuessError::IndexAlreadyUsed { index } => {
                write!(f, "tile {index} was already matched")
            }
        }
    }
}

impl std::error::Error for GuessError {}

/// Article revealed by a correct guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedArticle {
    pub title: String,
    pub url: String,
    pub color: Difficulty,
}

/// Result of grading one accepted guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub correct: bool,
    /// True once the party has consumed every tile.
    pub finished: bool,
    /// Unconsumed tiles left for this party.
    pub remaining: usize,
    /// Exactly three of the four tiles share an article.
    pub one_away: bool,
    /// Populated only when `correct`.
    pub matched: Option<MatchedArticle>,
}

/// Grades `group` against the stored puzzle and this party's progress.
///
/// The party record is created on first sight, before the group itself is
/// validated, so even a rejected first guess registers the party.
pub fn check_guess(
    sessions: &SessionStore,
    tracker: &ProgressTracker,
    session_key: &str,
    party_key: &str,
    group: &[usize],
) -> Result<GuessOutcome, GuessError> {
    let puzzle = sessions.get(session_key).ok_or(GuessError::UnknownSession)?;
    let progress = tracker.get_or_create(party_key);

    if group.len() != GROUP_SIZE {
        return Err(GuessError::WrongGroupSize { got: group.len() });
    }
    for (i, &index) in group.iter().enumerate() {
        if group[..i].contains(&index) {
            return Err(GuessError::DuplicateIndex { index });
        }
        if index >= puzzle.tile_count() {
            return Err(GuessError::IndexOutOfRange { index, tile_count: puzzle.tile_count() });
        }
        if progress.is_used(index) {
            return Err(GuessError::IndexAlreadyUsed { index });
        }
    }

    let mut counts = [0usize; ARTICLE_COUNT];
    for &index in group {
        if let Some(article) = puzzle.article_of(index) {
            counts[article] += 1;
        }
    }
    let correct = counts.contains(&GROUP_SIZE);
    let one_away = !correct && counts.contains(&(GROUP_SIZE - 1));

    let matched = if correct {
        tracker.mark_used(party_key, group);
        puzzle.article_of(group[0]).and_then(|article| {
            puzzle.articles().get(article).map(|a| MatchedArticle {
                title: a.title.clone(),
                url: a.link.clone(),
                color: puzzle.color_of(article),
            })
        })
    } else {
        None
    };

    let remaining = tracker.remaining_count(party_key, puzzle.tile_count());
    Ok(GuessOutcome {
        correct,
        finished: remaining == 0,
        remaining,
        one_away,
        matched,
    })
}
