//! Source adapter contracts, placeholder adapters and the source registry.

use std::sync::Arc;

use async_trait::async_trait;
use nls_core::SourceRecord;
use nls_storage::ProxyList;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod registry;

pub use registry::{default_registry, RegistryError, SourceRegistry};

pub const CRATE_NAME: &str = "nls-adapters";

pub const PREVIEW_NOTE: &str = "Preview mode: replace stub with live scraping";
pub const PREVIEW_URL: &str = "https://example.com";

/// Static description of a source, shown by `nls sources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceProfile {
    pub display_name: String,
    pub description: String,
    pub recommended_tools: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub keywords: &'a [String],
    pub limit: usize,
    pub proxies: Option<&'a ProxyList>,
}

/// One line of output from the niche-config pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicFinding {
    pub source: String,
    pub query: String,
    pub summary: String,
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Lower-case registry key, also used for output file names.
    fn source_id(&self) -> &str;

    fn profile(&self) -> SourceProfile;

    /// Fetch at most `request.limit` contact records for the keywords.
    async fn fetch_contacts(&self, request: &FetchRequest<'_>) -> Result<Vec<SourceRecord>, AdapterError>;

    async fn scan_topic(&self, query: &str) -> Result<Vec<TopicFinding>, AdapterError> {
        Ok(vec![TopicFinding {
            source: self.profile().display_name,
            query: query.to_string(),
            summary: "Placeholder result. Replace with real API or scraper call.".to_string(),
        }])
    }
}

/// Records standing in for a source in preview mode: one per keyword,
/// capped at `limit`, each carrying the preview marker.
pub fn preview_records(source_id: &str, keywords: &[String], limit: usize) -> Vec<SourceRecord> {
    keywords
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, keyword)| {
            SourceRecord::new(source_id)
                .with_keyword(keyword.clone())
                .with_handle(format!("preview_user_{}", idx + 1))
                .with_url(PREVIEW_URL)
                .with_note(PREVIEW_NOTE)
                .marked_preview()
        })
        .collect()
}

/// `title:<kw> OR title:<kw>` search string for Reddit-style engines.
pub fn build_title_query(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|kw| format!("title:{kw}"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoteStyle {
    /// `<prefix> <keyword>`
    Keyword(&'static str),
    /// `Matched query: kw OR kw`
    OrQuery,
}

/// Person-centric placeholder: one contact per keyword.
#[derive(Debug, Clone, Copy)]
struct ContactStubAdapter {
    source_id: &'static str,
    display_name: &'static str,
    description: &'static str,
    recommended_tools: &'static [&'static str],
    handle_prefix: &'static str,
    url: &'static str,
    note: NoteStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Thread,
    VideoComment,
}

/// Content-centric placeholder (threads, comments) mapped into contact shape.
#[derive(Debug, Clone, Copy)]
struct ContentStubAdapter {
    source_id: &'static str,
    display_name: &'static str,
    description: &'static str,
    recommended_tools: &'static [&'static str],
    kind: ContentKind,
}

fn profile_of(display_name: &str, description: &str, tools: &[&str]) -> SourceProfile {
    SourceProfile {
        display_name: display_name.to_string(),
        description: description.to_string(),
        recommended_tools: tools.iter().map(ToString::to_string).collect(),
    }
}

#[async_trait]
impl SourceAdapter for ContactStubAdapter {
    fn source_id(&self) -> &str {
        self.source_id
    }

    fn profile(&self) -> SourceProfile {
        profile_of(self.display_name, self.description, self.recommended_tools)
    }

    async fn fetch_contacts(&self, request: &FetchRequest<'_>) -> Result<Vec<SourceRecord>, AdapterError> {
        let query = request.keywords.join(" OR ");
        Ok(request
            .keywords
            .iter()
            .take(request.limit)
            .enumerate()
            .map(|(idx, keyword)| {
                let note = match self.note {
                    NoteStyle::Keyword(prefix) => format!("{prefix} {keyword}"),
                    NoteStyle::OrQuery => format!("Matched query: {query}"),
                };
                SourceRecord::new(self.source_id)
                    .with_keyword(keyword.clone())
                    .with_handle(format!("{}_{}", self.handle_prefix, idx + 1))
                    .with_url(self.url)
                    .with_note(note)
            })
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for ContentStubAdapter {
    fn source_id(&self) -> &str {
        self.source_id
    }

    fn profile(&self) -> SourceProfile {
        profile_of(self.display_name, self.description, self.recommended_tools)
    }

    async fn fetch_contacts(&self, request: &FetchRequest<'_>) -> Result<Vec<SourceRecord>, AdapterError> {
        let records = match self.kind {
            ContentKind::Thread => {
                let query = build_title_query(request.keywords);
                let title = format!(
                    "Example Reddit thread about {}",
                    request.keywords.join(", ")
                );
                request
                    .keywords
                    .iter()
                    .take(request.limit)
                    .enumerate()
                    .map(|(idx, keyword)| {
                        SourceRecord::new(self.source_id)
                            .with_keyword(keyword.clone())
                            .with_handle(format!("redditor_{}", idx + 1))
                            .with_url("https://reddit.com/example")
                            .with_note(format!("Thread author discussing {keyword}"))
                            .with_extra("query", query.clone())
                            .with_extra("title", title.clone())
                            .with_extra("score", 123)
                            .with_extra("comments", 42)
                    })
                    .collect()
            }
            ContentKind::VideoComment => request
                .keywords
                .iter()
                .take(request.limit)
                .enumerate()
                .map(|(idx, keyword)| {
                    SourceRecord::new(self.source_id)
                        .with_keyword(keyword.clone())
                        .with_handle(format!("yt_commenter_{}", idx + 1))
                        .with_url("https://youtube.com/watch?v=example")
                        .with_note(format!("Commented on a video about {keyword}"))
                        .with_extra("video_title", format!("{keyword} deep dive"))
                        .with_extra("comment", "Informative content!")
                })
                .collect(),
        };
        Ok(records)
    }
}

pub fn reddit_adapter() -> impl SourceAdapter {
    ContentStubAdapter {
        source_id: "reddit",
        display_name: "Reddit",
        description: "Niche threads and pain points",
        recommended_tools: &["praw", "pushshift", "snoowrap"],
        kind: ContentKind::Thread,
    }
}

pub fn quora_adapter() -> impl SourceAdapter {
    ContactStubAdapter {
        source_id: "quora",
        display_name: "Quora",
        description: "Long-tail Q&A and reviews",
        recommended_tools: &["selenium", "quora-scraper"],
        handle_prefix: "quora_user",
        url: "https://www.quora.com/profile/example",
        note: NoteStyle::Keyword("Answered a question about"),
    }
}

pub fn twitter_adapter() -> impl SourceAdapter {
    ContactStubAdapter {
        source_id: "twitter",
        display_name: "Twitter/X",
        description: "Trends and keyword intelligence",
        recommended_tools: &["tweepy", "snscrape"],
        handle_prefix: "tweet_user",
        url: "https://twitter.com/example/status/123",
        note: NoteStyle::OrQuery,
    }
}

pub fn amazon_adapter() -> impl SourceAdapter {
    ContactStubAdapter {
        source_id: "amazon",
        display_name: "Amazon",
        description: "Product mentions and reviews",
        recommended_tools: &["reqwest", "scraper", "official Amazon APIs"],
        handle_prefix: "seller",
        url: "https://amazon.com/example",
        note: NoteStyle::Keyword("Seller or reviewer mentioning"),
    }
}

pub fn youtube_adapter() -> impl SourceAdapter {
    ContentStubAdapter {
        source_id: "youtube",
        display_name: "YouTube",
        description: "Comments and video metadata",
        recommended_tools: &["youtube-dl", "youtube-data-api"],
        kind: ContentKind::VideoComment,
    }
}

pub fn forums_adapter() -> impl SourceAdapter {
    ContactStubAdapter {
        source_id: "forums",
        display_name: "Forums",
        description: "Deep niche complaints",
        recommended_tools: &["scraper", "spider"],
        handle_prefix: "forum_user",
        url: "https://forum.example.com/thread/123",
        note: NoteStyle::Keyword("Posted about"),
    }
}

/// The six built-in placeholder adapters in dispatch order.
pub fn builtin_adapters() -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(reddit_adapter()),
        Arc::new(quora_adapter()),
        Arc::new(twitter_adapter()),
        Arc::new(amazon_adapter()),
        Arc::new(youtube_adapter()),
        Arc::new(forums_adapter()),
    ]
}
