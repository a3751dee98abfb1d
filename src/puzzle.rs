//! Puzzle model and difficulty ranking.
//!
//! A [`Puzzle`] is the immutable product of one generation run: four source
//! articles, sixteen tiles in their permanent display order, and one
//! difficulty tier per article. The display order is the answer key; nothing
//! here mutates after construction, so the web layer shares puzzles behind
//! `Arc` without further locking.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extract::Comment;
use crate::source::Article;

pub const ARTICLE_COUNT: usize = 4;
pub const COMMENTS_PER_ARTICLE: usize = 4;
pub const TILE_COUNT: usize = ARTICLE_COUNT * COMMENTS_PER_ARTICLE;

/// Difficulty tier of one article group, easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Yellow,
    Green,
    Blue,
    Purple,
}

impl Difficulty {
    /// Tiers in rank order; index 0 is assigned to the lowest-density group.
    pub const TIERS: [Difficulty; ARTICLE_COUNT] = [
        Difficulty::Yellow,
        Difficulty::Green,
        Difficulty::Blue,
        Difficulty::Purple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Yellow => "yellow",
            Difficulty::Green => "green",
            Difficulty::Blue => "blue",
            Difficulty::Purple => "purple",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One display cell: a normalized comment tagged with its source article and
/// the quotation-span count of its body before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    comment: Comment,
    article: usize,
    quote_spans: usize,
}

impl Tile {
    pub fn new(comment: Comment, article: usize, quote_spans: usize) -> Self {
        Self { comment, article, quote_spans }
    }

    pub fn comment(&self) -> &Comment {
        &self.comment
    }

    /// Index of the owning article, 0 through 3.
    pub fn article(&self) -> usize {
        self.article
    }

    /// Quotation spans the body carried before they were stripped.
    pub fn quote_spans(&self) -> usize {
        self.quote_spans
    }
}

/// An assembled puzzle: articles, shuffled tiles, and per-article tiers.
#[derive(Debug, Clone)]
pub struct Puzzle {
    articles: Vec<Article>,
    tiles: Vec<Tile>,
    colors: [Difficulty; ARTICLE_COUNT],
}

impl Puzzle {
    /// Builds a puzzle from generator output and ranks the article groups.
    ///
    /// # Panics
    ///
    /// Panics unless handed exactly [`ARTICLE_COUNT`] articles and
    /// [`TILE_COUNT`] tiles with [`COMMENTS_PER_ARTICLE`] tiles per article.
    /// The generator upholds this by construction.
    pub fn new(articles: Vec<Article>, tiles: Vec<Tile>) -> Self {
        assert_eq!(articles.len(), ARTICLE_COUNT, "puzzle needs {ARTICLE_COUNT} articles");
        assert_eq!(tiles.len(), TILE_COUNT, "puzzle needs {TILE_COUNT} tiles");

        let mut per_article = [0usize; ARTICLE_COUNT];
        let mut totals = [0usize; ARTICLE_COUNT];
        for tile in &tiles {
            assert!(tile.article < ARTICLE_COUNT, "tile references article {}", tile.article);
            per_article[tile.article] += 1;
            totals[tile.article] += tile.quote_spans;
        }
        for (article, &count) in per_article.iter().enumerate() {
            assert_eq!(count, COMMENTS_PER_ARTICLE, "article {article} has {count} tiles");
        }

        let colors = assign_difficulty(totals);
        Self { articles, tiles, colors }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Article index behind a display index, or `None` when out of range.
    pub fn article_of(&self, index: usize) -> Option<usize> {
        self.tiles.get(index).map(Tile::article)
    }

    /// Display index to article index, one entry per tile.
    pub fn answer_key(&self) -> Vec<usize> {
        self.tiles.iter().map(Tile::article).collect()
    }

    pub fn colors(&self) -> &[Difficulty; ARTICLE_COUNT] {
        &self.colors
    }

    pub fn color_of(&self, article: usize) -> Difficulty {
        self.colors[article]
    }
}

/// Maps per-article quotation totals onto tiers: rank the totals ascending
/// (stable, so ties keep article order) and hand out tiers by rank.
pub fn assign_difficulty(totals: [usize; ARTICLE_COUNT]) -> [Difficulty; ARTICLE_COUNT] {
    let mut order = [0usize; ARTICLE_COUNT];
    for (slot, article) in order.iter_mut().enumerate() {
        *article = slot;
    }
    order.sort_by_key(|&article| totals[article]);

    let mut colors = [Difficulty::Yellow; ARTICLE_COUNT];
    for (rank, &article) in order.iter().enumerate() {
        colors[article] = Difficulty::TIERS[rank];
    }
    colors
}

#[cfg(test)]
pub(crate) fn fixture_puzzle() -> Puzzle {
    // Block layout: tiles 0-3 belong to article 0, 4-7 to article 1, and so
    // on. Span counts rise with the article index so the tier assignment is
    // the identity (article 0 yellow .. article 3 purple).
    let articles = (0..ARTICLE_COUNT)
        .map(|a| Article {
            title: format!("Article {a}"),
            link: format!("https://news.test/{a}"),
            description: format!("summary {a}"),
            pub_date: "Mon, 01 Jan 2024 00:00:00 +0000".to_string(),
            categories: Vec::new(),
        })
        .collect();
    let tiles = (0..TILE_COUNT)
        .map(|i| {
            let article = i / COMMENTS_PER_ARTICLE;
            Tile::new(
                Comment {
                    body: format!("comment {i}"),
                    user: format!("user{i}"),
                },
                article,
                article,
            )
        })
        .collect();
    Puzzle::new(articles, tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_ascending_totals() {
        let colors = assign_difficulty([5, 0, 9, 2]);
        assert_eq!(
            colors,
            [Difficulty::Blue, Difficulty::Yellow, Difficulty::Purple, Difficulty::Green]
        );
    }

    #[test]
    fn tied_totals_keep_article_order() {
        let colors = assign_difficulty([1, 1, 0, 1]);
        assert_eq!(
            colors,
            [Difficulty::Green, Difficulty::Blue, Difficulty::Yellow, Difficulty::Purple]
        );
    }

    #[test]
    fn every_tier_is_handed_out_once() {
        let colors = assign_difficulty([3, 3, 3, 3]);
        for tier in Difficulty::TIERS {
            assert_eq!(colors.iter().filter(|&&c| c == tier).count(), 1);
        }
    }

    #[test]
    fn answer_key_holds_each_article_four_times() {
        let puzzle = fixture_puzzle();
        let key = puzzle.answer_key();
        assert_eq!(key.len(), TILE_COUNT);
        for article in 0..ARTICLE_COUNT {
            assert_eq!(key.iter().filter(|&&a| a == article).count(), COMMENTS_PER_ARTICLE);
        }
    }

    #[test]
    fn fixture_ranks_articles_in_index_order() {
        let puzzle = fixture_puzzle();
        assert_eq!(puzzle.colors(), &Difficulty::TIERS);
        assert_eq!(puzzle.color_of(3), Difficulty::Purple);
    }

    #[test]
    fn article_of_bounds() {
        let puzzle = fixture_puzzle();
        assert_eq!(puzzle.article_of(0), Some(0));
        assert_eq!(puzzle.article_of(TILE_COUNT - 1), Some(ARTICLE_COUNT - 1));
        assert_eq!(puzzle.article_of(TILE_COUNT), None);
    }

    #[test]
    fn difficulty_serializes_lowercase() {
        let json = serde_json::to_value(Difficulty::TIERS).expect("serialize tiers");
        assert_eq!(json, serde_json::json!(["yellow", "green", "blue", "purple"]));
    }

    #[test]
    fn difficulty_display_matches_wire_name() {
        assert_eq!(Difficulty::Purple.to_string(), "purple");
    }

    #[test]
    #[should_panic(expected = "16 tiles")]
    fn rejects_short_tile_list() {
        let fixture = fixture_puzzle();
        let articles = fixture.articles().to_vec();
        let tiles = fixture.tiles()[..TILE_COUNT - 1].to_vec();
        Puzzle::new(articles, tiles);
    }
}
