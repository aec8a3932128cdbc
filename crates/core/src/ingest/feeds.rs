use crate::config::Settings;
use crate::error::Result;
use crate::ingest::provider::{truncate, JsonHttp, NewsProvider};
use crate::ingest::types::{Article, JsonFeed};
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

pub const MAX_ARTICLES_PER_FEED: usize = 20;
pub const MAX_SUMMARY_CHARS: usize = 500;

/// News provider reading JSON Feed 1.1 documents.
#[derive(Debug, Clone)]
pub struct JsonFeedProvider {
    http: JsonHttp,
}

impl JsonFeedProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: JsonHttp::from_settings(settings)?,
        })
    }
}

#[async_trait::async_trait]
impl NewsProvider for JsonFeedProvider {
    fn provider_name(&self) -> &'static str {
        "json_feed"
    }

    async fn fetch_articles(&self, feed_url: &str) -> Result<Vec<Article>> {
        let feed: JsonFeed = self.http.get(feed_url, &[], HeaderMap::new()).await?;
        let articles = articles_from_feed(feed, feed_url, Utc::now());
        tracing::debug!(feed_url, articles = articles.len(), "fetched news feed");
        Ok(articles)
    }
}

/// Newest-first articles, capped per feed. Items without a title are skipped and
/// items without a parseable date are stamped with `fetched_at`.
pub fn articles_from_feed(feed: JsonFeed, feed_url: &str, fetched_at: DateTime<Utc>) -> Vec<Article> {
    let source = feed
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| feed_url.to_string());

    let mut out: Vec<Article> = feed
        .items
        .into_iter()
        .filter_map(|item| {
            let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let summary = item
                .summary
                .or(item.content_text)
                .map(|s| truncate(s.trim(), MAX_SUMMARY_CHARS))
                .unwrap_or_default();
            let published_at = item
                .date_published
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or(fetched_at);

            Some(Article {
                title,
                summary,
                link: item.url.unwrap_or_default(),
                published_at,
                source: source.clone(),
            })
        })
        .collect();

    out.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    out.truncate(MAX_ARTICLES_PER_FEED);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn sorts_newest_first_and_caps() {
        let items: Vec<_> = (0..25)
            .map(|i| {
                json!({
                    "title": format!("headline {i}"),
                    "url": format!("https://news.example/{i}"),
                    "date_published": format!("2026-03-01T{:02}:00:00+01:00", i % 24)
                })
            })
            .collect();
        let feed: JsonFeed = serde_json::from_value(json!({"title": "Wire", "items": items})).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();

        let articles = articles_from_feed(feed, "https://news.example/feed.json", now);
        assert_eq!(articles.len(), MAX_ARTICLES_PER_FEED);
        assert!(articles
            .windows(2)
            .all(|w| w[0].published_at >= w[1].published_at));
        assert_eq!(articles[0].source, "Wire");
    }

    #[test]
    fn skips_untitled_and_truncates_summary() {
        let long = "x".repeat(800);
        let feed: JsonFeed = serde_json::from_value(json!({
            "items": [
                {"summary": "no title"},
                {"title": "Volvo beats estimates", "content_text": long}
            ]
        }))
        .unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();

        let articles = articles_from_feed(feed, "https://news.example/feed.json", now);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].summary.chars().count(), MAX_SUMMARY_CHARS);
        assert_eq!(articles[0].published_at, now);
        assert_eq!(articles[0].source, "https://news.example/feed.json");
    }
}
