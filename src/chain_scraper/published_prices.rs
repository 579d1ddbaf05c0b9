//! The generic `publishedprices.co.il`-hosted portal used by the majority
//! of chains: a CSRF-protected login form, then a single AJAX directory
//! listing endpoint that both lists and serves files.

use super::common::{chain_folder, download_url_to_path};
use super::ScrapeError;
use crate::grammar;
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::PathBuf;

pub struct PublishedPrices {
    base_url: String,
    chain_name: String,
    username: String,
    password: String,
    client: Client,
    cache_root: String,
}

impl PublishedPrices {
    pub fn new(
        base_url: String,
        chain_name: String,
        username: String,
        password: String,
        client: Client,
        cache_root: String,
    ) -> Self {
        Self {
            base_url,
            chain_name,
            username,
            password,
            client,
            cache_root,
        }
    }

    fn folder(&self) -> PathBuf {
        chain_folder(&self.cache_root, &self.chain_name)
    }

    async fn ajax_dir(&self, display_length: u32) -> Result<String, ScrapeError> {
        let response = self
            .client
            .post(format!("{}/file/ajax_dir", self.base_url))
            .form(&[("iDisplayLength", display_length.to_string())])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl super::ChainScraper for PublishedPrices {
    async fn login(&self) -> Result<(), ScrapeError> {
        let login_url = format!("{}/login", self.base_url);
        let page = self.client.get(&login_url).send().await?.error_for_status()?;
        let body = page.text().await?;

        let document = Html::parse_document(&body);
        let selector = Selector::parse(r#"input[name="csrftoken"]"#).expect("valid selector");
        let token = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("value"))
            .ok_or(ScrapeError::Auth)?
            .to_string();

        self.client
            .post(format!("{login_url}/user"))
            .form(&[
                ("url", login_url.as_str()),
                ("username", &self.username),
                ("password", &self.password),
                ("csrftoken", &token),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn chain_full_id(&self) -> Result<u64, ScrapeError> {
        let body = self.ajax_dir(1).await?;
        body.split('"')
            .find_map(|segment| grammar::parse(segment).map(|info| info.chain_full_id))
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
        let body = self.ajax_dir(10_000).await?;
        let folder = self.folder();

        let mut paths = Vec::new();
        for file_name in body.split('"').filter(|s| pattern.is_match(s)) {
            let path = folder.join(file_name);
            if !path.exists() {
                let url = format!("{}/file/d/{file_name}", self.base_url);
                download_url_to_path(&self.client, &url, &path).await?;
            }
            paths.push(path);
        }
        Ok(paths)
    }
}
