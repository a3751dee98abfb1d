//! Article feed and page transport.
//!
//! Puzzle generation needs two inputs from the outside world: the candidate
//! article list and the discussion page behind each article link. Both sit
//! behind traits so the web layer can serve from snapshot files, a test can
//! serve from fixtures, and a future live transport can slot in without
//! touching the generator.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One candidate article from the news feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Canonical article URL; also the key a [`PageFetcher`] resolves.
    pub link: String,
    pub description: String,
    pub pub_date: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Transport or decode failure while reading the feed or a page.
#[derive(Debug)]
pub enum FetchError {
    /// The underlying read failed (missing snapshot, I/O error).
    Transport { target: String, source: io::Error },
    /// The bytes were read but did not decode as the expected format.
    Parse { target: String, detail: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport { target, source } => {
                write!(f, "fetch {target}: {source}")
            }
            FetchError::Parse { target, detail } => {
                write!(f, "parse {target}: {detail}")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport { source, .. } => Some(source),
            FetchError::Parse { .. } => None,
        }
    }
}

/// Source of candidate articles.
pub trait FeedSource: Send + Sync {
    fn fetch(&self) -> Result<Vec<Article>, FetchError>;
}

/// Resolver from an article link to the raw bytes of its discussion page.
///
/// Any per-fetch timeout belongs to the implementation; the puzzle generator
/// only budgets the walk as a whole, between fetches.
pub trait PageFetcher: Send + Sync {
    fn fetch_page(&self, link: &str) -> Result<Vec<u8>, FetchError>;
}

/// Feed backed by a JSON snapshot file: `{"articles": [...]}`.
#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct FeedDocument {
    articles: Vec<Article>,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeedSource for FileFeed {
    fn fetch(&self) -> Result<Vec<Article>, FetchError> {
        let target = self.path.display().to_string();
        let bytes = fs::read(&self.path).map_err(|source| FetchError::Transport {
            target: target.clone(),
            source,
        })?;
        let doc: FeedDocument =
            serde_json::from_slice(&bytes).map_err(|err| FetchError::Parse {
                target,
                detail: err.to_string(),
            })?;
        Ok(doc.articles)
    }
}

/// Page store keyed by link digest: each page lives at
/// `<dir>/<sha256(link) as hex>.html`.
#[derive(Debug, Clone)]
pub struct PageDir {
    dir: PathBuf,
}

impl PageDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File name a link resolves to, without the directory prefix.
    pub fn page_name(link: &str) -> String {
        format!("{}.html", hex::encode(Sha256::digest(link.as_bytes())))
    }
}

impl PageFetcher for PageDir {
    fn fetch_page(&self, link: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.dir.join(Self::page_name(link));
        fs::read(&path).map_err(|source| FetchError::Transport {
            target: path.display().to_string(),
            source,
        })
    }
}
