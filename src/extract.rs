//! Comment extraction from article discussion pages.
//!
//! Discussion pages embed their comment feed as a JavaScript `Listview`
//! constructor call whose argument is a JSON object literal. [`ListviewExtractor`]
//! locates that call, slices out the object between the call's parentheses, and
//! deserializes the comment list. Pages without the marker, or with a payload
//! that is not valid JSON, yield `None` so the generator can skip the article.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches the opening of the posts Listview call, through the closing `})` of
/// its object argument. `.*?` keeps the match lazy so trailing script text on
/// the same line is not swallowed.
static LISTVIEW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"new Listview\(\{"id":"posts".*?\}\)"#).expect("listview marker regex")
});

/// A single user comment lifted from a discussion page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Raw comment markup, including any quotation spans.
    pub body: String,
    /// Display name of the comment author.
    pub user: String,
}

/// Wire shape of the Listview object argument. Fields other than `data` are
/// ignored; a missing `data` key reads as an empty comment list.
#[derive(Debug, Deserialize)]
struct Listview {
    #[serde(default)]
    data: Vec<Comment>,
}

/// Pulls the comment list out of a fetched page body.
///
/// Implementations return `None` when the page carries no recognizable comment
/// feed; the caller treats that the same as an empty feed.
pub trait CommentExtractor: Send + Sync {
    fn extract(&self, page: &[u8]) -> Option<Vec<Comment>>;
}

/// Extractor for the embedded `new Listview({"id":"posts", ...})` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListviewExtractor;

impl CommentExtractor for ListviewExtractor {
    fn extract(&self, page: &[u8]) -> Option<Vec<Comment>> {
        let page = String::from_utf8_lossy(page);
        let call = LISTVIEW_RE.find(&page)?.as_str();
        let json = object_argument(call)?;
        let listview: Listview = serde_json::from_str(json).ok()?;
        Some(listview.data)
    }
}

/// Slices the JSON object out of a `new Listview(...)` call: everything after
/// the first `(` and before the last `)`.
fn object_argument(call: &str) -> Option<&str> {
    let open = call.find('(')?;
    let close = call.rfind(')')?;
    if close <= open + 1 {
        return None;
    }
    Some(&call[open + 1..close])
}
