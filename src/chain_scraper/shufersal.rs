//! Shufersal's price-transparency portal: an anonymous, paginated index
//! of download links with `>>`/`>` anchors for "last page"/"next page".

use super::common::{anchors, chain_folder, download_url_to_path, get_text};
use super::ScrapeError;
use crate::grammar;
use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::path::PathBuf;

const BASE_URL: &str = "http://prices.shufersal.co.il/";
const CHAIN_NAME: &str = "שופרסל";

static STORES_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new("(?i)stores").expect("valid regex"));

pub struct Shufersal {
    client: Client,
    cache_root: String,
}

impl Shufersal {
    pub fn new(client: Client, cache_root: String) -> Self {
        Self { client, cache_root }
    }

    fn folder(&self) -> PathBuf {
        chain_folder(&self.cache_root, CHAIN_NAME)
    }
}

#[async_trait]
impl super::ChainScraper for Shufersal {
    async fn login(&self) -> Result<(), ScrapeError> {
        self.client.get(BASE_URL).send().await?.error_for_status()?;
        Ok(())
    }

    async fn chain_full_id(&self) -> Result<u64, ScrapeError> {
        let body = get_text(&self.client, BASE_URL).await?;
        anchors(&body)
            .into_iter()
            .find_map(|(text, _)| grammar::parse(&text).map(|info| info.chain_full_id))
            .ok_or(ScrapeError::NotFound)
    }

    async fn subchain_ids(&self) -> Result<Vec<i32>, ScrapeError> {
        super::common::default_subchain_ids(self).await
    }

    /// Stores are published off the portal's last page rather than the
    /// regular listing: jump to `>>`, then find the href matching
    /// "stores" (case-insensitive).
    async fn get_stores_xml(&self, _date: Option<NaiveDate>) -> Result<PathBuf, ScrapeError> {
        let body = get_text(&self.client, BASE_URL).await?;
        let last_page_href = anchors(&body)
            .into_iter()
            .find(|(text, _)| text == ">>")
            .map(|(_, href)| href)
            .ok_or(ScrapeError::NotFound)?;

        let last_page = get_text(&self.client, &format!("{BASE_URL}{last_page_href}")).await?;
        let url = anchors(&last_page)
            .into_iter()
            .find(|(_, href)| STORES_HREF.is_match(href))
            .map(|(_, href)| href)
            .ok_or(ScrapeError::NotFound)?;

        let file_name = super::common::file_name_from_url(&url);
        let path = self.folder().join(file_name);
        download_url_to_path(&self.client, &url, &path).await
    }

    async fn get_prices_xml(
        &self,
        store_id: u32,
        date: Option<NaiveDate>,
    ) -> Result<PathBuf, ScrapeError> {
        self.download_files_by_pattern(&grammar::prices_pattern(store_id, date), date)
            .await?
            .into_iter()
            .next()
            .ok_or(ScrapeError::NotFound)
    }

    async fn get_promos_xml(
        &self,
        store_id: u32,
        date: Option<NaiveDate>,
    ) -> Result<PathBuf, ScrapeError> {
        self.download_files_by_pattern(&grammar::promos_pattern(store_id, date), date)
            .await?
            .into_iter()
            .next()
            .ok_or(ScrapeError::NotFound)
    }

    async fn download_all_data(&self, date: Option<NaiveDate>) -> Result<Vec<PathBuf>, ScrapeError> {
        self.download_files_by_pattern(&grammar::FULL_FILE_PATTERN, date)
            .await
    }

    /// Walks every listing page (following `>` until it disappears),
    /// downloading every href that matches `pattern`.
    ///
    /// The paths discovered on each page are accumulated across the
    /// whole walk and returned at the end, unlike the portal's original
    /// scraper, which declared `file_paths = []` before the loop and
    /// never appended to it before returning.
    async fn download_files_by_pattern(
        &self,
        pattern: &Regex,
        _date: Option<NaiveDate>,
    ) -> Result<Vec<PathBuf>, ScrapeError> {
        let folder = self.folder();
        let mut paths = Vec::new();
        let mut page_url = BASE_URL.to_string();

        loop {
            let body = get_text(&self.client, &page_url).await?;
            let page_anchors = anchors(&body);

            for (_, href) in &page_anchors {
                if pattern.is_match(href) {
                    let file_name = super::common::file_name_from_url(href);
                    let path = folder.join(file_name);
                    if !path.exists() {
                        download_url_to_path(&self.client, href, &path).await?;
                    }
                    paths.push(path);
                }
            }

            let Some((_, next_href)) = page_anchors.into_iter().find(|(text, _)| text == ">") else {
                break;
            };
            page_url = format!("{BASE_URL}{next_href}");
        }

        Ok(paths)
    }
}
