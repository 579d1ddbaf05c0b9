//! Nibit/Matrix Catalog's portal: one static HTML table listing every
//! chain it hosts, keyed by display name rather than chain id.

use super::common::{chain_folder, download_url_to_path, get_text};
use super::ScrapeError;
use crate::grammar;
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::PathBuf;

const BASE_URL: &str = "http://matrixcatalog.co.il/NBCompetitionRegulations.aspx";

pub struct Nibit {
    chain_name: String,
    client: Client,
    cache_root: String,
}

impl Nibit {
    pub fn new(chain_name: String, client: Client, cache_root: String) -> Self {
        Self {
            chain_name,
            client,
            cache_root,
        }
    }

    fn folder(&self) -> PathBuf {
        chain_folder(&self.cache_root, &self.chain_name)
    }

    /// Returns `(file_name, download_url)` for every row belonging to
    /// this chain. Column 0 is the chain id, column 1 the display name,
    /// column 7 the download link (with the portal's Windows-style
    /// backslashes normalized to forward slashes).
    async fn rows(&self) -> Result<Vec<(String, String)>, ScrapeError> {
        let body = get_text(&self.client, BASE_URL).await?;
        let document = Html::parse_document(&body);
        let row_selector = Selector::parse("table tr").expect("valid selector");
        let cell_selector = Selector::parse("td").expect("valid selector");
        let link_selector = Selector::parse("a").expect("valid selector");

        let mut rows = Vec::new();
        for row in document.select(&row_selector) {
            let cells: Vec<_> = row.select(&cell_selector).collect();
            if cells.len() < 8 {
                continue;
            }
            let name = cells[1].text().collect::<String>();
            if name.trim() != self.chain_name {
                continue;
            }
            let Some(href) = cells[7].select(&link_selector).next().and_then(|a| a.value().attr("href"))
            else {
                continue;
            };
            let href = href.replace('\\', "/");
            let url = format!("http://matrixcatalog.co.il/{href}");
            let file_name = super::common::file_name_from_url(&url);
            rows.push((file_name, url));
        }
        Ok(rows)
    }
}

#[async_trait]
impl super::ChainScraper for Nibit {
    async fn login(&self) -> Result<(), ScrapeError> {
        Ok(())
    }

    async fn chain_full_id(&self) -> Result<u64, ScrapeError> {
        self.rows()
            .await?
            .into_iter()
            .find_map(|(file_name, _)| grammar::parse(&file_name).map(|info| info.chain_full_id))
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
        self.download_files_by_pattern(&grammar::FILE_PATTERN, date).await
    }

    async fn download_files_by_pattern(
        &self,
        pattern: &Regex,
        _date: Option<NaiveDate>,
    ) -> Result<Vec<PathBuf>, ScrapeError> {
        let folder = self.folder();
        let mut paths = Vec::new();
        for (file_name, url) in self.rows().await? {
            if !pattern.is_match(&file_name) {
                continue;
            }
            let path = folder.join(&file_name);
            if !path.exists() {
                download_url_to_path(&self.client, &url, &path).await?;
            }
            paths.push(path);
        }
        Ok(paths)
    }
}
