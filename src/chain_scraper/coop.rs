//! Coop's portal: a small form-POST API rather than a file listing. Each
//! endpoint returns one file directly, named via its response's
//! `content-disposition` header — there is no pattern-based discovery
//! for this variant.

use super::common::chain_folder;
use super::ScrapeError;
use crate::grammar;
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

const BASE_URL: &str = "http://www.coopisrael.coop/home/";
const CHAIN_NAME: &str = "קואופ";

pub struct Coop {
    client: Client,
    cache_root: String,
}

impl Coop {
    pub fn new(client: Client, cache_root: String) -> Self {
        Self { client, cache_root }
    }

    fn folder(&self) -> PathBuf {
        chain_folder(&self.cache_root, CHAIN_NAME)
    }

    async fn post_to_file(
        &self,
        endpoint: &str,
        form: &[(&str, String)],
    ) -> Result<PathBuf, ScrapeError> {
        let response = self
            .client
            .post(format!("{BASE_URL}{endpoint}"))
            .form(form)
            .send()
            .await?
            .error_for_status()?;

        let file_name = content_disposition_filename(
            response
                .headers()
                .get(reqwest::header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
        )
        .ok_or(ScrapeError::NotFound)?;

        let path = self.folder().join(file_name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = response.bytes().await?;
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&bytes).await?;
        Ok(path)
    }
}

/// Extracts the quoted (or bare) `filename=` parameter from a
/// `content-disposition` header value.
fn content_disposition_filename(header: &str) -> Option<String> {
    let raw = header.split("filename=").nth(1)?;
    Some(raw.trim_matches(|c: char| c == '"' || c == '\'' || c == ';' || c.is_whitespace()).to_string())
}

#[async_trait]
impl super::ChainScraper for Coop {
    async fn login(&self) -> Result<(), ScrapeError> {
        Ok(())
    }

    async fn chain_full_id(&self) -> Result<u64, ScrapeError> {
        let path = self.get_stores_xml(None).await?;
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        grammar::parse(file_name)
            .map(|info| info.chain_full_id)
            .ok_or(ScrapeError::NotFound)
    }

    async fn subchain_ids(&self) -> Result<Vec<i32>, ScrapeError> {
        Ok(vec![])
    }

    /// Coop has no concept of a historical snapshot: `date` is ignored
    /// beyond always serving today's branch list.
    async fn get_stores_xml(&self, _date: Option<NaiveDate>) -> Result<PathBuf, ScrapeError> {
        self.post_to_file("branches_to_xml", &[]).await
    }

    async fn get_prices_xml(
        &self,
        store_id: u32,
        _date: Option<NaiveDate>,
    ) -> Result<PathBuf, ScrapeError> {
        self.post_to_file(
            "get_prices",
            &[
                ("product", "0".to_string()),
                ("branch", store_id.to_string()),
                ("type", "gzip".to_string()),
                ("agree", "1".to_string()),
            ],
        )
        .await
    }

    async fn get_promos_xml(
        &self,
        store_id: u32,
        _date: Option<NaiveDate>,
    ) -> Result<PathBuf, ScrapeError> {
        self.post_to_file(
            "get_promo",
            &[
                ("branch", store_id.to_string()),
                ("type", "gzip".to_string()),
                ("agree", "1".to_string()),
            ],
        )
        .await
    }

    async fn download_all_data(&self, _date: Option<NaiveDate>) -> Result<Vec<PathBuf>, ScrapeError> {
        Ok(vec![self.get_stores_xml(None).await?])
    }

    async fn download_files_by_pattern(
        &self,
        _pattern: &Regex,
        _date: Option<NaiveDate>,
    ) -> Result<Vec<PathBuf>, ScrapeError> {
        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_quoted_filename() {
        let header = r#"attachment; filename="PriceFull7290873255550-001-202001010600.gz""#;
        assert_eq!(
            content_disposition_filename(header).as_deref(),
            Some("PriceFull7290873255550-001-202001010600.gz")
        );
    }
}
