//! Polymorphic access to the per-chain price-transparency portals.
//!
//! Each chain publishes its stores/prices/promotions files through a
//! different, idiosyncratic web portal. [ChainScraper] is the common
//! capability every variant exposes; [factory] picks the right variant
//! from the URL the chain catalog recorded for it, mirroring
//! `web_scraper_factory` (`original_source/web_scraper.py`).

pub mod bitan;
pub mod common;
pub mod coop;
pub mod mega;
pub mod nibit;
pub mod published_prices;
pub mod shufersal;
pub mod zol_vebegadol;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use std::path::PathBuf;
use thiserror::Error;

pub use bitan::Bitan;
pub use coop::Coop;
pub use mega::Mega;
pub use nibit::Nibit;
pub use published_prices::PublishedPrices;
pub use shufersal::Shufersal;
pub use zol_vebegadol::ZolVebegadol;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("no file on the portal matched the expected pattern")]
    NotFound,
    #[error("login to the chain portal failed")]
    Auth,
    #[error("network error talking to the chain portal: {0}")]
    Network(#[from] reqwest::Error),
    #[error("io error caching a downloaded file: {0}")]
    Io(#[from] std::io::Error),
    #[error("no scraper is defined for portal url {0}")]
    UnsupportedPortal(String),
}

/// The capability every chain portal variant exposes, regardless of how
/// wildly its actual scraping mechanics differ underneath.
#[async_trait]
pub trait ChainScraper: Send + Sync {
    /// Authenticates against the portal, if it requires it. A no-op for
    /// anonymous portals.
    async fn login(&self) -> Result<(), ScrapeError>;

    /// The 13-digit chain id published on the portal.
    async fn chain_full_id(&self) -> Result<u64, ScrapeError>;

    /// The distinct subchain ids found in the chain's stores file. Most
    /// portals only ever publish one (`None`/omitted in the XML, folded
    /// to a single entry here); a few publish several.
    async fn subchain_ids(&self) -> Result<Vec<i32>, ScrapeError>;

    /// Downloads the stores file, returning its local cache path.
    async fn get_stores_xml(&self, date: Option<NaiveDate>) -> Result<PathBuf, ScrapeError>;

    /// Downloads one store's prices file.
    async fn get_prices_xml(
        &self,
        store_id: u32,
        date: Option<NaiveDate>,
    ) -> Result<PathBuf, ScrapeError>;

    /// Downloads one store's promotions file.
    async fn get_promos_xml(
        &self,
        store_id: u32,
        date: Option<NaiveDate>,
    ) -> Result<PathBuf, ScrapeError>;

    /// Downloads every file the portal currently publishes, in discovery
    /// order. Used by the driver's full-catalog sweep.
    async fn download_all_data(&self, date: Option<NaiveDate>) -> Result<Vec<PathBuf>, ScrapeError>;

    /// Downloads every file matching `pattern`, skipping paths already
    /// present in the cache. The primitive every `get_*_xml` method is
    /// built from.
    async fn download_files_by_pattern(
        &self,
        pattern: &Regex,
        date: Option<NaiveDate>,
    ) -> Result<Vec<PathBuf>, ScrapeError>;
}

/// Dispatches to the portal-specific scraper implementation based on the
/// substrings the original `web_scraper_factory` keys off of. Returns
/// [ScrapeError::UnsupportedPortal] for chains whose URL matches none of
/// them (the original silently returned `None` for these).
pub fn factory(
    name: &str,
    url: &str,
    username: &str,
    password: &str,
    client: reqwest::Client,
    cache_root: String,
) -> Result<ChainScraperKind, ScrapeError> {
    if url.contains("publishedprices") {
        let base_url = match url.find(".co.il") {
            Some(idx) => &url[..idx + ".co.il".len()],
            None => url,
        };
        Ok(ChainScraperKind::PublishedPrices(PublishedPrices::new(
            base_url.to_string(),
            name.to_string(),
            username.to_string(),
            password.to_string(),
            client,
            cache_root,
        )))
    } else if url.contains("shufersal") {
        Ok(ChainScraperKind::Shufersal(Shufersal::new(client, cache_root)))
    } else if url.contains("matrixcatalog.co.il") {
        Ok(ChainScraperKind::Nibit(Nibit::new(
            name.to_string(),
            client,
            cache_root,
        )))
    } else if url.contains("mega") {
        Ok(ChainScraperKind::Mega(Mega::new(client, cache_root)))
    } else if url.contains("zolvebegadol") {
        Ok(ChainScraperKind::ZolVebegadol(ZolVebegadol::new(
            client, cache_root,
        )))
    } else if url.contains("bitan") {
        Ok(ChainScraperKind::Bitan(Bitan::new(client, cache_root)))
    } else if url.contains("coopisrael") || url.contains("coop") {
        Ok(ChainScraperKind::Coop(Coop::new(client, cache_root)))
    } else {
        Err(ScrapeError::UnsupportedPortal(url.to_string()))
    }
}

/// A tagged union over every supported portal variant. Exists so the
/// driver can hold a single `Vec<ChainScraperKind>` rather than a
/// `Vec<Box<dyn ChainScraper>>`, at the cost of the dispatch below.
pub enum ChainScraperKind {
    PublishedPrices(PublishedPrices),
    Shufersal(Shufersal),
    Nibit(Nibit),
    Mega(Mega),
    ZolVebegadol(ZolVebegadol),
    Bitan(Bitan),
    Coop(Coop),
}

macro_rules! forward {
    ($self:ident, $method:ident($($arg:ident),*)) => {
        match $self {
            ChainScraperKind::PublishedPrices(s) => s.$method($($arg),*).await,
            ChainScraperKind::Shufersal(s) => s.$method($($arg),*).await,
            ChainScraperKind::Nibit(s) => s.$method($($arg),*).await,
            ChainScraperKind::Mega(s) => s.$method($($arg),*).await,
            ChainScraperKind::ZolVebegadol(s) => s.$method($($arg),*).await,
            ChainScraperKind::Bitan(s) => s.$method($($arg),*).await,
            ChainScraperKind::Coop(s) => s.$method($($arg),*).await,
        }
    };
}

#[async_trait]
impl ChainScraper for ChainScraperKind {
    async fn login(&self) -> Result<(), ScrapeError> {
        forward!(self, login())
    }

    async fn chain_full_id(&self) -> Result<u64, ScrapeError> {
        forward!(self, chain_full_id())
    }

    async fn subchain_ids(&self) -> Result<Vec<i32>, ScrapeError> {
        forward!(self, subchain_ids())
    }

    async fn get_stores_xml(&self, date: Option<NaiveDate>) -> Result<PathBuf, ScrapeError> {
        forward!(self, get_stores_xml(date))
    }

    async fn get_prices_xml(
        &self,
        store_id: u32,
        date: Option<NaiveDate>,
    ) -> Result<PathBuf, ScrapeError> {
        forward!(self, get_prices_xml(store_id, date))
    }

    async fn get_promos_xml(
        &self,
        store_id: u32,
        date: Option<NaiveDate>,
    ) -> Result<PathBuf, ScrapeError> {
        forward!(self, get_promos_xml(store_id, date))
    }

    async fn download_all_data(&self, date: Option<NaiveDate>) -> Result<Vec<PathBuf>, ScrapeError> {
        forward!(self, download_all_data(date))
    }

    async fn download_files_by_pattern(
        &self,
        pattern: &Regex,
        date: Option<NaiveDate>,
    ) -> Result<Vec<PathBuf>, ScrapeError> {
        forward!(self, download_files_by_pattern(pattern, date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> reqwest::Client {
        reqwest::Client::new()
    }

    #[test]
    fn factory_dispatches_on_url_substring() {
        let cases: &[(&str, &str)] = &[
            ("https://url.publishedprices.co.il/extra/path", "PublishedPrices"),
            ("http://prices.shufersal.co.il/", "Shufersal"),
            ("http://matrixcatalog.co.il/NBCompetitionRegulations.aspx", "Nibit"),
            ("http://publishprice.mega.co.il/", "Mega"),
            ("http://zolvebegadol.com/", "ZolVebegadol"),
            ("http://www.ybitan.co.il/pirce_update", "Bitan"),
            ("http://www.coopisrael.coop/home/", "Coop"),
        ];
        for (url, expected) in cases {
            let scraper = factory("chain", url, "u", "p", client(), "cache".to_string())
                .unwrap_or_else(|_| panic!("expected a scraper for {url}"));
            let actual = match scraper {
                ChainScraperKind::PublishedPrices(_) => "PublishedPrices",
                ChainScraperKind::Shufersal(_) => "Shufersal",
                ChainScraperKind::Nibit(_) => "Nibit",
                ChainScraperKind::Mega(_) => "Mega",
                ChainScraperKind::ZolVebegadol(_) => "ZolVebegadol",
                ChainScraperKind::Bitan(_) => "Bitan",
                ChainScraperKind::Coop(_) => "Coop",
            };
            assert_eq!(actual, *expected, "for url {url}");
        }
    }

    #[test]
    fn factory_rejects_unknown_portal() {
        let result = factory("chain", "http://example.com", "u", "p", client(), "cache".to_string());
        assert!(matches!(result, Err(ScrapeError::UnsupportedPortal(_))));
    }
}
