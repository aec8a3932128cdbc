use crate::error::{Error, Result};
use crate::rocket::selector::RocketWeights;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// Instruments traded on the home exchange during the briefing day.
    Home,
    /// Foreign watchlist, tracked mainly for disclosure activity.
    Foreign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapSize {
    Large,
    Mid,
    Small,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    pub market: Market,
    #[serde(default)]
    pub cap_size: Option<CapSize>,
}

impl Instrument {
    pub fn is_home(&self) -> bool {
        self.market == Market::Home
    }

    /// Ticker as it appears in disclosure filings (`VOLV-B.ST` -> `VOLV`).
    pub fn disclosure_ticker(&self) -> String {
        clean_symbol(&self.symbol).to_ascii_uppercase()
    }

    /// Lowercased terms an article must contain to count as company news.
    pub fn news_keywords(&self) -> Vec<String> {
        let name = self.name.trim().to_lowercase();
        let mut out = vec![name.clone()];
        if name.contains(' ') {
            if let Some(first) = name.split_whitespace().next() {
                out.push(first.to_string());
            }
        }
        let symbol = clean_symbol(&self.symbol).to_lowercase();
        if !symbol.is_empty() {
            out.push(symbol);
        }
        out.dedup();
        out
    }
}

/// Strips exchange and share-class suffixes from a listing symbol.
pub fn clean_symbol(symbol: &str) -> String {
    symbol
        .trim()
        .replace(".ST", "")
        .replace("-B", "")
        .replace("-A", "")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsFeed {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentKeywords {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

/// Reference data loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Universe {
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub news_feeds: Vec<NewsFeed>,
    #[serde(default)]
    pub sentiment_keywords: SentimentKeywords,
    #[serde(default)]
    pub rocket_weights: Option<RocketWeights>,
}

impl Universe {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read universe file {}: {e}", path.display()))
        })?;
        let universe = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.display(),
            instruments = universe.instruments.len(),
            feeds = universe.news_feeds.len(),
            "loaded instrument universe"
        );
        Ok(universe)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let universe: Universe = serde_json::from_str(text)
            .map_err(|e| Error::config(format!("malformed universe file: {e}")))?;
        universe.validate()?;
        Ok(universe)
    }

    fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(Error::config("instrument universe is empty"));
        }

        let mut seen = BTreeSet::new();
        for instrument in &self.instruments {
            if instrument.symbol.trim().is_empty() {
                return Err(Error::config("instrument symbol must be non-empty"));
            }
            if instrument.name.trim().is_empty() {
                return Err(Error::config(format!(
                    "instrument {} has an empty name",
                    instrument.symbol
                )));
            }
            if !seen.insert(instrument.symbol.as_str()) {
                return Err(Error::config(format!(
                    "duplicate instrument symbol: {}",
                    instrument.symbol
                )));
            }
        }

        for feed in &self.news_feeds {
            if !(feed.url.starts_with("http://") || feed.url.starts_with("https://")) {
                return Err(Error::config(format!(
                    "news feed {} has a non-http url: {}",
                    feed.name, feed.url
                )));
            }
        }

        Ok(())
    }

    pub fn home(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter().filter(|i| i.is_home())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instrument(symbol: &str, name: &str, market: Market) -> Instrument {
        Instrument {
            symbol: symbol.to_string(),
            name: name.to_string(),
            market,
            cap_size: None,
        }
    }

    #[test]
    fn disclosure_ticker_strips_listing_suffixes() {
        assert_eq!(instrument("VOLV-B.ST", "Volvo B", Market::Home).disclosure_ticker(), "VOLV");
        assert_eq!(instrument("nvda", "Nvidia", Market::Foreign).disclosure_ticker(), "NVDA");
    }

    #[test]
    fn news_keywords_include_first_word_and_symbol() {
        let kw = instrument("ERIC-B.ST", "Ericsson B", Market::Home).news_keywords();
        assert_eq!(kw, vec!["ericsson b", "ericsson", "eric"]);
    }

    #[test]
    fn loads_valid_universe() {
        let text = json!({
            "instruments": [
                {"symbol": "VOLV-B.ST", "name": "Volvo B", "market": "home", "cap_size": "large"},
                {"symbol": "NVDA", "name": "Nvidia", "market": "foreign"}
            ],
            "news_feeds": [{"name": "Wire", "url": "https://example.com/feed.json"}],
            "sentiment_keywords": {"positive": ["beat"], "negative": ["miss"]}
        })
        .to_string();

        let universe = Universe::from_json_str(&text).unwrap();
        assert_eq!(universe.instruments.len(), 2);
        assert_eq!(universe.home().count(), 1);
        assert_eq!(universe.instruments[0].cap_size, Some(CapSize::Large));
        assert!(universe.rocket_weights.is_none());
    }

    #[test]
    fn rejects_empty_and_duplicate_universes() {
        let empty = json!({"instruments": []}).to_string();
        assert!(matches!(
            Universe::from_json_str(&empty),
            Err(Error::Configuration(_))
        ));

        let dup = json!({
            "instruments": [
                {"symbol": "ABB.ST", "name": "ABB", "market": "home"},
                {"symbol": "ABB.ST", "name": "ABB again", "market": "home"}
            ]
        })
        .to_string();
        assert!(matches!(
            Universe::from_json_str(&dup),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Universe::from_json_str("{not json"),
            Err(Error::Configuration(_))
        ));
    }
}
