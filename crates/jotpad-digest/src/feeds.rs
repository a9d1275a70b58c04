//! News collection from RSS and Atom feeds.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{DigestError, DigestResult};

const SUMMARY_MAX_CHARS: usize = 500;
const FEED_TIMEOUT: Duration = Duration::from_secs(20);

/// A feed the job can read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feed {
    /// Key used in the `active_sources` setting
    pub key: &'static str,
    pub name: &'static str,
    pub url: &'static str,
}

pub const BUILTIN_FEEDS: &[Feed] = &[
    Feed {
        key: "bbc",
        name: "BBC News",
        url: "http://feeds.bbci.co.uk/news/rss.xml",
    },
    Feed {
        key: "reuters",
        name: "Reuters",
        url: "https://feeds.reuters.com/reuters/topNews",
    },
    Feed {
        key: "ap",
        name: "AP News",
        url: "https://feeds.apnews.com/rss/apf-topnews",
    },
];

/// Built-in feeds selected by `keys`, in catalogue order
pub fn active_feeds(keys: &[String]) -> Vec<Feed> {
    for key in keys {
        if !BUILTIN_FEEDS.iter().any(|feed| feed.key.eq_ignore_ascii_case(key)) {
            tracing::warn!("Ignoring unknown news source '{}'", key);
        }
    }
    BUILTIN_FEEDS
        .iter()
        .filter(|feed| keys.iter().any(|key| feed.key.eq_ignore_ascii_case(key)))
        .copied()
        .collect()
}

/// One headline handed to the model and stored with the idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: String,
    pub title: String,
    pub summary: String,
    pub link: String,
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("Invalid regex"))
}

/// Strip markup and cap the length of a feed summary
pub fn clean_summary(raw: &str) -> String {
    let stripped = tag_pattern().replace_all(raw, "");
    let stripped = stripped.trim();
    if stripped.chars().count() > SUMMARY_MAX_CHARS {
        let cut: String = stripped.chars().take(SUMMARY_MAX_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        stripped.to_string()
    }
}

fn child_text<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|child| child.has_tag_name(name))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// Read the newest entry of an RSS `<item>` or Atom `<entry>` document
pub fn parse_first_item(source: &str, xml: &str) -> DigestResult<Option<NewsItem>> {
    let doc = roxmltree::Document::parse(xml)?;
    let Some(entry) = doc
        .descendants()
        .find(|node| node.has_tag_name("item") || node.has_tag_name("entry"))
    else {
        return Ok(None);
    };

    let title = child_text(entry, "title").unwrap_or_default().to_string();
    let summary = child_text(entry, "summary")
        .or_else(|| child_text(entry, "description"))
        .or_else(|| child_text(entry, "content"))
        .unwrap_or(title.as_str());
    let link = child_text(entry, "link")
        .map(str::to_string)
        .or_else(|| {
            // Atom puts the URL in an attribute
            entry
                .children()
                .find(|child| child.has_tag_name("link"))
                .and_then(|child| child.attribute("href"))
                .map(str::to_string)
        })
        .unwrap_or_default();

    Ok(Some(NewsItem {
        source: source.to_string(),
        summary: clean_summary(summary),
        title,
        link,
    }))
}

/// Fetches feeds over HTTP
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    pub fn new() -> DigestResult<Self> {
        Ok(Self {
            client: Client::builder().timeout(FEED_TIMEOUT).build()?,
        })
    }

    async fn fetch(&self, feed: &Feed) -> DigestResult<Option<NewsItem>> {
        let response = self.client.get(feed.url).send().await?;
        if !response.status().is_success() {
            return Err(DigestError::Api {
                service: "feed",
                message: format!("{} returned HTTP {}", feed.url, response.status().as_u16()),
            });
        }
        let body = response.text().await?;
        parse_first_item(feed.name, &body)
    }

    /// First item of each feed until `count` items are collected.
    ///
    /// A feed that fails or has no entries is logged and skipped.
    pub async fn collect(&self, feeds: &[Feed], count: usize) -> Vec<NewsItem> {
        let mut items = Vec::with_capacity(count);
        for feed in feeds {
            if items.len() >= count {
                break;
            }
            match self.fetch(feed).await {
                Ok(Some(item)) => {
                    tracing::info!("[{}] {}", feed.name, item.title);
                    items.push(item);
                }
                Ok(None) => tracing::warn!("[{}] feed has no entries, skipping", feed.name),
                Err(e) => tracing::warn!("[{}] failed to fetch feed: {}", feed.name, e),
            }
        }
        if items.len() < count {
            tracing::warn!("Collected {} of {} news items", items.len(), count);
        }
        items
    }
}
