//! Pipeline Driver: fans out scraping and reconciliation across chains
//! and stores with a bounded worker pool (spec.md §4.8, §5). Grounded in
//! the teacher's `tokio::main` + shared context startup style, extended
//! with a [Semaphore] (permits = `--processes`) to bound concurrency —
//! chosen over `rayon` because every unit of work here blocks on IO
//! (HTTP + DB), which is `tokio`'s fit, not `rayon`'s.
//!
//! Phase 1 downloads every chain's files in parallel. Phase 2 parses
//! every chain's stores file in parallel. Phase 3 walks each chain's
//! stores and reconciles prices (and, if enabled, promotions) for every
//! store in parallel. A failing task logs and resolves to `()` at the
//! `JoinSet` boundary so sibling tasks are unaffected (spec.md §7).

use crate::{
    catalog,
    chain_scraper::{self, ChainScraper, ChainScraperKind},
    database::entity::{
        store::StoreId, Chain, ChainWebAccess, Store, StoreProduct,
    },
    extract, parse, reconcile,
    state::AppContext,
};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinSet};

/// Everything the CLI needs to tell the driver about one run.
pub struct RunOptions {
    pub processes: usize,
    pub download: bool,
    pub parse_chains: bool,
    pub parse_promos: bool,
    pub date: NaiveDate,
}

/// Runs the full pipeline: optional catalog sync, then the three-phase
/// fan-out over every known chain.
pub async fn run(ctx: AppContext, options: RunOptions) {
    if options.parse_chains {
        match catalog::sync_chains(&ctx).await {
            Ok(added) => info!("catalog sync added {added} chain(s)"),
            Err(err) => error!("catalog sync failed: {err}"),
        }
    }

    let chains = match Chain::all(&ctx.db).await {
        Ok(chains) => chains,
        Err(err) => {
            error!("couldn't load chains: {err}");
            return;
        }
    };

    let semaphore = Arc::new(Semaphore::new(options.processes.max(1)));
    let today = chrono::Utc::now().date_naive();

    if options.download {
        phase_download(&ctx, &chains, &semaphore, options.date).await;
    }

    phase_parse_stores(&ctx, &chains, &semaphore, options.date).await;

    for chain in &chains {
        phase_parse_prices(&ctx, chain, &semaphore, options.date, today, options.parse_promos).await;
    }

    match reconcile::linking::link_external_items(&ctx.db, reconcile::linking::DEFAULT_PAGE_SIZE).await {
        Ok(linked) => info!("cross-snapshot linking pass matched {linked} store product(s) to items"),
        Err(err) => error!("cross-snapshot linking pass failed: {err}"),
    }
}

async fn phase_download(ctx: &AppContext, chains: &[Chain], sem: &Arc<Semaphore>, date: NaiveDate) {
    let mut set = JoinSet::new();
    for chain in chains {
        let ctx = ctx.clone();
        let chain = chain.clone();
        let sem = sem.clone();
        set.spawn(async move {
            let _permit = sem.acquire_owned().await.expect("semaphore closed");
            let Some(scraper) = scraper_for(&ctx, &chain).await else {
                warn!("no scraper for chain {}, skipping download", chain.name);
                return;
            };
            match scraper.download_all_data(Some(date)).await {
                Ok(paths) => info!("downloaded {} file(s) for chain {}", paths.len(), chain.name),
                Err(err) => warn!("download failed for chain {}: {err}", chain.name),
            }
        });
    }
    drain(set).await;
}

async fn phase_parse_stores(ctx: &AppContext, chains: &[Chain], sem: &Arc<Semaphore>, date: NaiveDate) {
    let mut set = JoinSet::new();
    for chain in chains {
        let ctx = ctx.clone();
        let chain = chain.clone();
        let sem = sem.clone();
        set.spawn(async move {
            let _permit = sem.acquire_owned().await.expect("semaphore closed");
            if let Err(err) = parse_chain_stores(&ctx, &chain, date).await {
                warn!("stores parse failed for chain {}: {err}", chain.name);
            }
        });
    }
    drain(set).await;
}

async fn parse_chain_stores(ctx: &AppContext, chain: &Chain, date: NaiveDate) -> anyhow::Result<()> {
    let scraper = scraper_for(ctx, chain)
        .await
        .ok_or_else(|| anyhow::anyhow!("no scraper defined for chain {}", chain.name))?;

    let path = scraper.get_stores_xml(Some(date)).await?;
    let xml = extract::load_case_folded(&path)?;
    let doc = extract::parse_document(&xml)?;

    let parsed = parse::stores::parse_stores(&doc, &chain.name, chain.subchain_id);
    let mut subchain_name = None;
    let candidates = parsed
        .into_iter()
        .map(|p| {
            if let Some(name) = p.subchain_name {
                subchain_name = Some(name);
            }
            p.store
        })
        .collect();

    if let Some(name) = subchain_name {
        Chain::update_name(&ctx.db, chain.id, name).await?;
    }
    let inserted = Store::upsert_many(&ctx.db, chain.id, candidates).await?;
    info!("chain {}: {} new store(s)", chain.name, inserted);
    Ok(())
}

async fn phase_parse_prices(
    ctx: &AppContext,
    chain: &Chain,
    sem: &Arc<Semaphore>,
    date: NaiveDate,
    today: NaiveDate,
    parse_promos_flag: bool,
) {
    let stores = match Store::all_for_chain(&ctx.db, chain.id).await {
        Ok(stores) => stores,
        Err(err) => {
            error!("couldn't load stores for chain {}: {err}", chain.name);
            return;
        }
    };

    let mut set = JoinSet::new();
    for store in stores {
        let ctx = ctx.clone();
        let chain = chain.clone();
        let sem = sem.clone();
        set.spawn(async move {
            let _permit = sem.acquire_owned().await.expect("semaphore closed");
            if let Err(err) = parse_store_prices(&ctx, &chain, &store, date, today).await {
                warn!(
                    "prices parse failed for store {} ({}): {err}",
                    store.store_id, chain.name
                );
            }
            if parse_promos_flag {
                if let Err(err) = parse_store_promos(&ctx, &chain, &store, date).await {
                    warn!(
                        "promos parse failed for store {} ({}): {err}",
                        store.store_id, chain.name
                    );
                }
            }
        });
    }
    drain(set).await;
}

async fn parse_store_prices(
    ctx: &AppContext,
    chain: &Chain,
    store: &Store,
    date: NaiveDate,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let scraper = scraper_for(ctx, chain)
        .await
        .ok_or_else(|| anyhow::anyhow!("no scraper defined for chain {}", chain.name))?;

    let path = scraper.get_prices_xml(store.store_id as u32, Some(date)).await?;
    let xml = extract::load_case_folded(&path)?;
    let doc = extract::parse_document(&xml)?;

    let parsed = reconcile::extract_prices(&doc, store.id);
    let count = parsed.len();
    reconcile::apply_snapshot(&ctx.db, store.id, date, today, parsed).await?;
    info!("store {} ({}): reconciled {count} line(s)", store.store_id, chain.name);
    Ok(())
}

async fn parse_store_promos(
    ctx: &AppContext,
    chain: &Chain,
    store: &Store,
    date: NaiveDate,
) -> anyhow::Result<()> {
    let scraper = scraper_for(ctx, chain)
        .await
        .ok_or_else(|| anyhow::anyhow!("no scraper defined for chain {}", chain.name))?;

    let path = scraper.get_promos_xml(store.store_id as u32, Some(date)).await?;
    let xml = extract::load_case_folded(&path)?;
    let doc = extract::parse_document(&xml)?;

    let code_to_id = code_to_store_product_id(ctx, store.id).await?;
    let parsed = parse::promos::extract_promotions(&doc, date);
    let count = parse::promos::persist_promotions(&ctx.db, store.id, parsed, &code_to_id).await?;
    info!("store {} ({}): persisted {count} promotion(s)", store.store_id, chain.name);
    Ok(())
}

async fn code_to_store_product_id(
    ctx: &AppContext,
    store_id: StoreId,
) -> anyhow::Result<std::collections::HashMap<i64, crate::database::entity::store_product::StoreProductId>> {
    let existing = StoreProduct::existing_for_store(&ctx.db, store_id).await?;
    Ok(existing.into_iter().map(|(key, model)| (key.code, model.id)).collect())
}

async fn scraper_for(ctx: &AppContext, chain: &Chain) -> Option<ChainScraperKind> {
    let access = ChainWebAccess::find_by_chain(&ctx.db, chain.id).await.ok().flatten()?;
    chain_scraper::factory(
        &chain.name,
        &access.url,
        &access.username,
        &access.password,
        ctx.http.clone(),
        ctx.cache_dir().to_string(),
    )
    .ok()
}

/// Drains a [JoinSet], logging (but not propagating) a panicking task —
/// matching spec.md §7's "nothing crosses task boundaries except logged
/// summaries".
async fn drain(mut set: JoinSet<()>) {
    while let Some(result) = set.join_next().await {
        if let Err(err) = result {
            error!("pipeline task panicked: {err}");
        }
    }
}
