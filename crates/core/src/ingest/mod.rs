pub mod feeds;
pub mod provider;
pub mod quiver;
pub mod types;
pub mod yahoo;

use crate::config::Settings;
use crate::error::Result;
use provider::{DisclosureProvider, MarketDataProvider, NewsProvider};
use std::sync::Arc;

/// The three upstream collaborators an analysis cycle reads from.
#[derive(Clone)]
pub struct Providers {
    pub market: Arc<dyn MarketDataProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub disclosures: Arc<dyn DisclosureProvider>,
}

impl Providers {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let providers = Self {
            market: Arc::new(yahoo::YahooChartProvider::from_settings(settings)?),
            news: Arc::new(feeds::JsonFeedProvider::from_settings(settings)?),
            disclosures: Arc::new(quiver::QuiverDisclosureProvider::from_settings(settings)?),
        };
        tracing::info!(
            market = providers.market.provider_name(),
            news = providers.news.provider_name(),
            disclosures = providers.disclosures.provider_name(),
            "providers configured"
        );
        Ok(providers)
    }
}
