//! Chain Catalog Scraper: parses the ministry-of-economy index page
//! listing every chain's name, portal URL and login credentials, and
//! records a `(Chain, ChainWebAccess)` pair for each one not already
//! known. Grounded in `GovDataScraper.parse_chains_to_db`
//! (`original_source/web_scraper.py`).

use crate::{
    chain_scraper::{self, ChainScraper, ScrapeError},
    database::{
        entity::{Chain, ChainWebAccess},
        DbResult,
    },
    state::AppContext,
};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error fetching the chain catalog page: {0}")]
    Network(#[from] reqwest::Error),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("the catalog page's layout did not contain a data table")]
    MissingTable,
}

static CREDENTIAL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new("[a-zA-Z0-9_]+").expect("valid regex"));
static COLLAPSE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(" +").expect("valid regex"));

/// Removes characters the ministry page renders as stray glyphs (control
/// characters, combining marks with no visible form of their own, etc.),
/// folding them to a space instead of dropping them outright so adjacent
/// words don't get glued together. Mirrors `filter_non_printable`.
fn filter_non_printable(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c.is_ascii_punctuation() {
                c
            } else {
                ' '
            }
        })
        .collect();
    COLLAPSE_SPACES.replace_all(folded.trim(), " ").to_string()
}

/// Parses the free-text login cell into `(username, password)`. Lines
/// are matched against the Hebrew labels for "username"/"password" and
/// the first alphanumeric token on a matching line is taken as the
/// value. Mirrors `parse_login_data`.
fn parse_login_data(cell_text: &str) -> (String, String) {
    let mut username = String::new();
    let mut password = String::new();

    for line in cell_text.lines() {
        let Some(token) = CREDENTIAL_TOKEN.find(line) else {
            continue;
        };
        if line.contains("שם משתמש") {
            username = token.as_str().to_string();
        }
        if line.contains("סיסמא") || line.contains("סיסמה") {
            password = token.as_str().to_string();
        }
    }
    (username, password)
}

/// Fetches the ministry's chain index page, resolves each row into a
/// portal scraper, and persists a `(Chain, ChainWebAccess)` pair for
/// every `(full_id, subchain_id)` combination not already recorded.
/// Commits per chain, as the original does, so a single bad row doesn't
/// lose progress already made on earlier ones.
pub async fn sync_chains(ctx: &AppContext) -> Result<usize, CatalogError> {
    let body = ctx
        .http
        .get(&ctx.config.catalog_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let rows = parse_catalog_rows(&body)?;
    let known = Chain::all_full_subchain_ids(&ctx.db).await?;

    let mut added = 0usize;
    for row in rows {
        let scraper = match chain_scraper::factory(
            &row.name,
            &row.url,
            &row.username,
            &row.password,
            ctx.http.clone(),
            ctx.cache_dir().to_string(),
        ) {
            Ok(scraper) => scraper,
            Err(ScrapeError::UnsupportedPortal(url)) => {
                warn!("no scraper defined for {} ({url})", row.name);
                continue;
            }
            Err(err) => {
                warn!("failed to build scraper for {}: {err}", row.name);
                continue;
            }
        };

        let full_id = match scraper.chain_full_id().await {
            Ok(id) => id as i64,
            Err(err) => {
                warn!("couldn't find full id for {}: {err}", row.name);
                continue;
            }
        };

        let subchain_ids = scraper.subchain_ids().await.unwrap_or_default();
        let subchain_ids: Vec<Option<i32>> = if subchain_ids.is_empty() {
            vec![None]
        } else {
            subchain_ids.into_iter().map(Some).collect()
        };

        for subchain_id in subchain_ids {
            if known.contains(&(full_id, subchain_id)) {
                info!("chain {} already in db", row.name);
                continue;
            }

            added += persist_chain(&ctx.db, &row, full_id, subchain_id).await?;
        }
    }

    Ok(added)
}

async fn persist_chain(
    db: &sea_orm::DatabaseConnection,
    row: &CatalogRow,
    full_id: i64,
    subchain_id: Option<i32>,
) -> DbResult<usize> {
    info!("adding chain {}", row.name);
    let chain = Chain::create(db, full_id, subchain_id, row.name.clone()).await?;
    ChainWebAccess::create(
        db,
        chain.id,
        row.url.clone(),
        row.username.clone(),
        row.password.clone(),
    )
    .await?;
    Ok(1)
}

struct CatalogRow {
    name: String,
    url: String,
    username: String,
    password: String,
}

fn parse_catalog_rows(html: &str) -> Result<Vec<CatalogRow>, CatalogError> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("table tbody tr").expect("valid selector");
    let cell_selector = Selector::parse("td").expect("valid selector");
    let link_selector = Selector::parse("a").expect("valid selector");

    let mut found_table = false;
    let mut rows = Vec::new();
    for row in document.select(&row_selector) {
        found_table = true;
        let cells: Vec<_> = row.select(&cell_selector).collect();
        if cells.len() < 3 {
            continue;
        }

        let name = filter_non_printable(&cells[0].text().collect::<String>());
        let Some(url) = cells[1]
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let login_text = cells[2].text().collect::<Vec<_>>().join("\n");
        let (username, password) = parse_login_data(&login_text);

        rows.push(CatalogRow {
            name,
            url: url.to_string(),
            username,
            password,
        });
    }

    if !found_table {
        return Err(CatalogError::MissingTable);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_stray_glyphs_and_collapses_spaces() {
        assert_eq!(filter_non_printable("  שופרסל   דיל  "), "שופרסל דיל");
    }

    #[test]
    fn parses_login_cell_by_hebrew_label() {
        let text = "שם משתמש: chain01\nסיסמה: hunter2";
        let (user, pass) = parse_login_data(text);
        assert_eq!(user, "chain01");
        assert_eq!(pass, "hunter2");
    }

    #[test]
    fn missing_password_label_leaves_it_empty() {
        let (user, pass) = parse_login_data("שם משתמש: onlyuser");
        assert_eq!(user, "onlyuser");
        assert_eq!(pass, "");
    }
}
