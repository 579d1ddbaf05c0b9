//! Helpers shared by every portal variant: the on-disk cache layout,
//! streaming a URL to a file, and reading a listing page's anchors.

use super::ScrapeError;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// The per-chain directory under the pipeline's cache root. Every variant
/// downloads into this folder rather than the process's working directory.
pub fn chain_folder(cache_root: &str, chain_name: &str) -> PathBuf {
    Path::new(cache_root).join(sanitize(chain_name))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Streams `url` into `path`, creating parent directories as needed.
/// Returns `path` unchanged so call sites can chain it straight into the
/// file-path list they're building.
pub async fn download_url_to_path(
    client: &Client,
    url: &str,
    path: &Path,
) -> Result<PathBuf, ScrapeError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let response = client.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;

    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(&bytes).await?;
    Ok(path.to_path_buf())
}

/// Parses an HTML listing page and returns every anchor as `(text, href)`,
/// in document order. Most portal variants are plain index pages: this is
/// the one selector they all share.
pub fn anchors(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a").expect("anchor selector is valid");
    document
        .select(&selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?.to_string();
            let text = el.text().collect::<String>();
            Some((text, href))
        })
        .collect()
}

/// Fetches `url` and returns its body as text.
pub async fn get_text(client: &Client, url: &str) -> Result<String, ScrapeError> {
    Ok(client.get(url).send().await?.error_for_status()?.text().await?)
}

/// The last path segment of a URL, with any query string dropped —
/// how every portal variant turns a download link into a local file name.
pub fn file_name_from_url(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
        .to_string()
}

/// Downloads today's stores file and reads off the distinct `subchainid`
/// values it contains. The shared implementation behind every variant's
/// [super::ChainScraper::subchain_ids] except the two that hard-code
/// their answer (`Coop` has none, `ZolVebegadol` always publishes
/// exactly one). Mirrors `ChainScraper.get_subchains_ids`
/// (`original_source/web_scraper.py`), which delegates to
/// `xml_parser.ChainXmlParser.get_subchains_ids`.
pub async fn default_subchain_ids<S>(scraper: &S) -> Result<Vec<i32>, ScrapeError>
where
    S: super::ChainScraper,
{
    let path = scraper.get_stores_xml(None).await?;
    let xml = crate::extract::load_case_folded(&path).map_err(|_| ScrapeError::NotFound)?;
    let doc = crate::extract::parse_document(&xml).map_err(|_| ScrapeError::NotFound)?;

    let mut ids: Vec<i32> = crate::extract::iter_tag(doc.root(), "subchainid")
        .filter_map(|n| n.text())
        .filter_map(|t| t.trim().parse().ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}
