//! Mega's portal: a flat per-day directory listing
//! (`<base>/<YYYYMMDD>/`), anchor text itself is the file name.

use super::common::{anchors, chain_folder, download_url_to_path, get_text};
use super::ScrapeError;
use crate::grammar;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use reqwest::Client;
use std::path::PathBuf;

const BASE_URL: &str = "http://publishprice.mega.co.il/";
const CHAIN_NAME: &str = "מגה";

pub struct Mega {
    client: Client,
    cache_root: String,
}

impl Mega {
    pub fn new(client: Client, cache_root: String) -> Self {
        Self { client, cache_root }
    }

    fn folder(&self) -> PathBuf {
        chain_folder(&self.cache_root, CHAIN_NAME)
    }

    fn day_dir(date: Option<NaiveDate>) -> String {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
    }
}

#[async_trait]
impl super::ChainScraper for Mega {
    async fn login(&self) -> Result<(), ScrapeError> {
        Ok(())
    }

    async fn chain_full_id(&self) -> Result<u64, ScrapeError> {
        let url = format!("{BASE_URL}{}", Self::day_dir(None));
        let body = get_text(&self.client, &url).await?;
        anchors(&body)
            .into_iter()
            .find_map(|(text, _)| grammar::parse(&text).map(|info| info.chain_full_id))
            .ok_or(ScrapeError::NotFound)
    }

    async fn subchain_ids(&self) -> Result<Vec<i32>, ScrapeError> {
        super::common::default_subchain_ids(self).await
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
        let day_dir = Self::day_dir(date);
        let url = format!("{BASE_URL}{day_dir}");
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
