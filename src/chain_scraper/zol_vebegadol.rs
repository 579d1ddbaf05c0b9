//! Zol Vebegadol's portal: a per-day directory listing identical in
//! shape to [super::mega::Mega]'s, except everything lives one level
//! deeper under a `gz/` subdirectory.

use super::common::{anchors, chain_folder, download_url_to_path, get_text};
use super::ScrapeError;
use crate::grammar;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use reqwest::Client;
use std::path::PathBuf;

const BASE_URL: &str = "http://zolvebegadol.com/";
const CHAIN_NAME: &str = "זול ובגדול";

pub struct ZolVebegadol {
    client: Client,
    cache_root: String,
}

impl ZolVebegadol {
    pub fn new(client: Client, cache_root: String) -> Self {
        Self { client, cache_root }
    }

    fn folder(&self) -> PathBuf {
        chain_folder(&self.cache_root, CHAIN_NAME)
    }

    fn day_url(date: Option<NaiveDate>) -> (String, String) {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let day_dir = format!("{:04}{:02}{:02}", date.year(), date.month(), date.day());
        let url = format!("{BASE_URL}{day_dir}/gz/");
        (day_dir, url)
    }
}

#[async_trait]
impl super::ChainScraper for ZolVebegadol {
    async fn login(&self) -> Result<(), ScrapeError> {
        Ok(())
    }

    async fn chain_full_id(&self) -> Result<u64, ScrapeError> {
        let (_, url) = Self::day_url(None);
        let body = get_text(&self.client, &url).await?;
        anchors(&body)
            .into_iter()
            .find_map(|(text, _)| grammar::parse(&text).map(|info| info.chain_full_id))
            .ok_or(ScrapeError::NotFound)
    }

    /// This portal never publishes more than one subchain; the original
    /// hard-codes the answer rather than parsing the stores file for it.
    async fn subchain_ids(&self) -> Result<Vec<i32>, ScrapeError> {
        Ok(vec![0])
    }

    async fn get_stores_xml(&self, date: Option<NaiveDate>) -> Result<PathBuf, ScrapeError> {
        self.download_files_by_pattern(&grammar::stores_pattern(date), date)
            .await?
            .into_iter()
            .next()
            .ok_or(ScrapeError::NotFound)
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

    async fn download_files_by_pattern(
        &self,
        pattern: &Regex,
        date: Option<NaiveDate>,
    ) -> Result<Vec<PathBuf>, ScrapeError> {
        let (day_dir, url) = Self::day_url(date);
        let body = get_text(&self.client, &url).await?;
        let folder = self.folder().join(&day_dir);

        let mut paths = Vec::new();
        for (text, href) in anchors(&body) {
            if !pattern.is_match(&text) {
                continue;
            }
            let path = folder.join(&text);
            if !path.exists() {
                download_url_to_path(&self.client, &format!("{url}/{href}"), &path).await?;
            }
            paths.push(path);
        }
        Ok(paths)
    }
}
