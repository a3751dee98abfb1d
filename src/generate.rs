//! Puzzle generation.
//!
//! One generation run walks the candidate articles in random order, keeps the
//! first four whose discussion pages carry at least four comments, picks four
//! comments from each, and shuffles the sixteen tiles into their permanent
//! display order. Candidates that fail to fetch or parse are skipped without
//! retry; a run either produces a complete puzzle or an error, never a
//! partial one.

use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::extract::CommentExtractor;
use crate::normalize::{count_quoted_spans, strip_quoted_spans};
use crate::puzzle::{ARTICLE_COUNT, COMMENTS_PER_ARTICLE, Puzzle, TILE_COUNT, Tile};
use crate::source::{Article, FetchError, PageFetcher};

/// Knobs for one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Overall budget for the candidate walk. Checked before each fetch;
    /// `None` lets the walk run to candidate exhaustion.
    pub deadline: Option<Duration>,
}

/// Why a generation run produced no puzzle.
#[derive(Debug)]
pub enum GenerateError {
    /// The candidate feed itself could not be read.
    Feed(FetchError),
    /// Candidate exhaustion with fewer than four qualifying articles.
    InsufficientContent { qualified: usize },
    /// The deadline elapsed before four articles qualified.
    DeadlineExceeded { qualified: usize },
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Feed(err) => write!(f, "feed fetch failed: {err}"),
            GenerateError::InsufficientContent { qualified } => {
                write!(f, "only {qualified} of {ARTICLE_COUNT} candidate articles qualified")
            }
            GenerateError::DeadlineExceeded { qualified } => {
                write!(
                    f,
                    "generation deadline spent with {qualified} of {ARTICLE_COUNT} articles"
                )
            }
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerateError::Feed(err) => Some(err),
            _ => None,
        }
    }
}

/// Builds one puzzle from the candidate list.
///
/// Candidates are visited in a uniform random permutation. A candidate
/// qualifies when its page fetches, carries a comment payload, and that
/// payload holds at least [`COMMENTS_PER_ARTICLE`] comments; the walk stops
/// at [`ARTICLE_COUNT`] qualifiers. Span counts are recorded per comment
/// before its body is normalized, which is what the difficulty ranking
/// consumes.
pub fn generate_puzzle<R: Rng>(
    rng: &mut R,
    candidates: &[Article],
    pages: &dyn PageFetcher,
    extractor: &dyn CommentExtractor,
    options: &GenerateOptions,
) -> Result<Puzzle, GenerateError> {
    let started = Instant::now();
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.shuffle(rng);

    let mut picked = Vec::with_capacity(ARTICLE_COUNT);
    for &idx in &order {
        if picked.len() == ARTICLE_COUNT {
            break;
        }
        if let Some(deadline) = options.deadline {
            if started.elapsed() >= deadline {
                warn!(
                    qualified = picked.len(),
                    "generation deadline spent during candidate walk"
                );
                return Err(GenerateError::DeadlineExceeded { qualified: picked.len() });
            }
        }

        let article = &candidates[idx];
        let page = match pages.fetch_page(&article.link) {
            Ok(page) => page,
            Err(err) => {
                warn!(link = %article.link, error = %err, "skipping candidate, page fetch failed");
                continue;
            }
        };
        let Some(comments) = extractor.extract(&page) else {
            debug!(link = %article.link, "skipping candidate, no comment payload");
            continue;
        };
        if comments.len() < COMMENTS_PER_ARTICLE {
            debug!(
                link = %article.link,
                comments = comments.len(),
                "skipping candidate, too few comments"
            );
            continue;
        }
        picked.push((article.clone(), comments));
    }

    if picked.len() < ARTICLE_COUNT {
        warn!(
            qualified = picked.len(),
            candidates = candidates.len(),
            "candidate list exhausted before four articles qualified"
        );
        return Err(GenerateError::InsufficientContent { qualified: picked.len() });
    }

    let mut articles = Vec::with_capacity(ARTICLE_COUNT);
    let mut tiles = Vec::with_capacity(TILE_COUNT);
    for (slot, (article, mut comments)) in picked.into_iter().enumerate() {
        comments.shuffle(rng);
        comments.truncate(COMMENTS_PER_ARTICLE);
        for mut comment in comments {
            let spans = count_quoted_spans(&comment.body);
            comment.body = strip_quoted_spans(&comment.body);
            tiles.push(Tile::new(comment, slot, spans));
        }
        articles.push(article);
    }
    tiles.shuffle(rng);

    Ok(Puzzle::new(articles, tiles))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::extract::ListviewExtractor;
    use crate::puzzle::Difficulty;

    struct MapPages(HashMap<String, Vec<u8>>);

    impl PageFetcher for MapPages {
        fn fetch_page(&self, link: &str) -> Result<Vec<u8>, FetchError> {
            self.0.get(link).cloned().ok_or_else(|| FetchError::Transport {
                target: link.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no snapshot"),
            })
        }
    }

    fn article(n: usize) -> Article {
        Article {
            title: format!("Article {n}"),
            link: format!("https://news.test/{n}"),
            description: format!("summary {n}"),
            pub_date: "Mon, 01 Jan 2024 00:00:00 +0000".to_string(),
            categories: Vec::new(),
        }
    }

    fn listview_page(comments: &[(&str, &str)]) -> Vec<u8> {
        let data: Vec<serde_json::Value> = comments
            .iter()
            .map(|(user, body)| serde_json::json!({ "user": user, "body": body }))
            .collect();
        format!(
            r#"<html><script>new Listview({{"id":"posts","data":{}}})</script></html>"#,
            serde_json::Value::Array(data)
        )
        .into_bytes()
    }

    fn plain_page(n: usize, comments: usize) -> Vec<u8> {
        let rows: Vec<(String, String)> = (0..comments)
            .map(|c| (format!("user{n}_{c}"), format!("comment {n}.{c}")))
            .collect();
        let borrowed: Vec<(&str, &str)> =
            rows.iter().map(|(u, b)| (u.as_str(), b.as_str())).collect();
        listview_page(&borrowed)
    }

    fn pages_for(entries: &[(usize, Vec<u8>)]) -> MapPages {
        MapPages(
            entries
                .iter()
                .map(|(n, page)| (format!("https://news.test/{n}"), page.clone()))
                .collect(),
        )
    }

    #[test]
    fn builds_a_full_puzzle_from_qualifying_candidates() {
        let candidates: Vec<Article> = (0..5).map(article).collect();
        let pages = pages_for(&[
            (0, plain_page(0, 4)),
            (1, plain_page(1, 6)),
            (2, plain_page(2, 2)), // too few, never qualifies
            (3, plain_page(3, 5)),
            (4, plain_page(4, 4)),
        ]);
        let mut rng = SmallRng::seed_from_u64(7);

        let puzzle = generate_puzzle(
            &mut rng,
            &candidates,
            &pages,
            &ListviewExtractor,
            &GenerateOptions::default(),
        )
        .expect("four candidates qualify");

        assert_eq!(puzzle.articles().len(), ARTICLE_COUNT);
        assert_eq!(puzzle.tile_count(), TILE_COUNT);
        for a in 0..ARTICLE_COUNT {
            assert_eq!(
                puzzle.answer_key().iter().filter(|&&x| x == a).count(),
                COMMENTS_PER_ARTICLE
            );
        }
        assert!(puzzle.articles().iter().all(|a| a.title != "Article 2"));
    }

    #[test]
    fn skips_unfetchable_and_markerless_pages() {
        let candidates: Vec<Article> = (0..6).map(article).collect();
        let pages = pages_for(&[
            // candidate 0 has no page at all
            (1, b"<html>no comments here</html>".to_vec()),
            (2, plain_page(2, 4)),
            (3, plain_page(3, 4)),
            (4, plain_page(4, 4)),
            (5, plain_page(5, 4)),
        ]);
        let mut rng = SmallRng::seed_from_u64(11);

        let puzzle = generate_puzzle(
            &mut rng,
            &candidates,
            &pages,
            &ListviewExtractor,
            &GenerateOptions::default(),
        )
        .expect("still four qualifiers left");

        let titles: Vec<&str> =
            puzzle.articles().iter().map(|a| a.title.as_str()).collect();
        assert!(!titles.contains(&"Article 0"));
        assert!(!titles.contains(&"Article 1"));
    }

    #[test]
    fn fewer_than_four_qualifiers_is_an_error() {
        let candidates: Vec<Article> = (0..3).map(article).collect();
        let pages = pages_for(&[
            (0, plain_page(0, 4)),
            (1, plain_page(1, 4)),
            (2, plain_page(2, 4)),
        ]);
        let mut rng = SmallRng::seed_from_u64(3);

        let err = generate_puzzle(
            &mut rng,
            &candidates,
            &pages,
            &ListviewExtractor,
            &GenerateOptions::default(),
        )
        .expect_err("three candidates cannot fill four groups");
        assert!(matches!(err, GenerateError::InsufficientContent { qualified: 3 }));
    }

    #[test]
    fn zero_deadline_aborts_before_any_fetch() {
        let candidates: Vec<Article> = (0..8).map(article).collect();
        let pages = pages_for(&[]);
        let mut rng = SmallRng::seed_from_u64(1);

        let err = generate_puzzle(
            &mut rng,
            &candidates,
            &pages,
            &ListviewExtractor,
            &GenerateOptions { deadline: Some(Duration::ZERO) },
        )
        .expect_err("no budget at all");
        assert!(matches!(err, GenerateError::DeadlineExceeded { qualified: 0 }));
    }

    #[test]
    fn span_counts_survive_normalization_and_drive_tiers() {
        let candidates: Vec<Article> = (0..4).map(article).collect();
        let quoty: Vec<(String, String)> = (0..4)
            .map(|c| {
                (
                    format!("q{c}"),
                    format!("[quote=carl]old take[/quote]\nfresh take {c}"),
                )
            })
            .collect();
        let borrowed: Vec<(&str, &str)> =
            quoty.iter().map(|(u, b)| (u.as_str(), b.as_str())).collect();
        let pages = pages_for(&[
            (0, plain_page(0, 4)),
            (1, plain_page(1, 4)),
            (2, listview_page(&borrowed)),
            (3, plain_page(3, 4)),
        ]);
        let mut rng = SmallRng::seed_from_u64(21);

        let puzzle = generate_puzzle(
            &mut rng,
            &candidates,
            &pages,
            &ListviewExtractor,
            &GenerateOptions::default(),
        )
        .expect("all four qualify");

        let quoty_slot = puzzle
            .articles()
            .iter()
            .position(|a| a.title == "Article 2")
            .expect("quoty article selected");
        for tile in puzzle.tiles().iter().filter(|t| t.article() == quoty_slot) {
            assert_eq!(tile.quote_spans(), 1);
            assert!(!tile.comment().body.contains("[quote"));
            assert!(tile.comment().body.starts_with("fresh take"));
        }
        // Highest quotation density lands on the hardest tier.
        assert_eq!(puzzle.color_of(quoty_slot), Difficulty::Purple);
    }

    #[test]
    fn exactly_four_comments_survive_per_article() {
        let candidates: Vec<Article> = (0..4).map(article).collect();
        let pages = pages_for(&[
            (0, plain_page(0, 9)),
            (1, plain_page(1, 4)),
            (2, plain_page(2, 4)),
            (3, plain_page(3, 4)),
        ]);
        let mut rng = SmallRng::seed_from_u64(5);

        let puzzle = generate_puzzle(
            &mut rng,
            &candidates,
            &pages,
            &ListviewExtractor,
            &GenerateOptions::default(),
        )
        .expect("all four qualify");

        let slot = puzzle
            .articles()
            .iter()
            .position(|a| a.title == "Article 0")
            .expect("selected");
        assert_eq!(
            puzzle.tiles().iter().filter(|t| t.article() == slot).count(),
            COMMENTS_PER_ARTICLE
        );
    }
}
