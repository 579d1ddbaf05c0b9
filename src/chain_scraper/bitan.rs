//! Yeinot Bitan's portal: a flat anchor listing off a single page, whose
//! path (`pirce_update`) is misspelled on the chain's own site. Kept
//! verbatim rather than corrected — it is the real, load-bearing URL.

use super::common::{anchors, chain_folder, download_url_to_path, get_text};
use super::ScrapeError;
use crate::grammar;
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use std::path::PathBuf;

const BASE_URL: &str = "http://www.ybitan.co.il/pirce_update";
const CHAIN_NAME: &str = "יינות ביתן";

pub struct Bitan {
    client: Client,
    cache_root: String,
}

impl Bitan {
    pub fn new(client: Client, cache_root: String) -> Self {
        Self { client, cache_root }
    }

    fn folder(&self) -> PathBuf {
        chain_folder(&self.cache_root, CHAIN_NAME)
    }
}

#[async_trait]
impl super::ChainScraper for Bitan {
    async fn login(&self) -> Result<(), ScrapeError> {
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
        _date: Option<NaiveDate>,
    ) -> Result<Vec<PathBuf>, ScrapeError> {
        let body = get_text(&self.client, BASE_URL).await?;
        let folder = self.folder();
        let base_without_suffix = BASE_URL.trim_end_matches("pirce_update");

        let mut paths = Vec::new();
        for (text, href) in anchors(&body) {
            if !pattern.is_match(&text) {
                continue;
            }
            let path = folder.join(&text);
            if !path.exists() {
                let url = format!("{base_without_suffix}{href}");
                download_url_to_path(&self.client, &url, &path).await?;
            }
            paths.push(path);
        }
        Ok(paths)
    }
}
