//! Cross-snapshot linking maintenance pass (spec.md §4.6.3): assigns
//! `item_id` to every externally-identifiable `StoreProduct` whose code
//! now has a matching row in the shared `Item` catalog. Ported from
//! `ChainXmlParser.set_products_item_id`
//! (`original_source/backend/xml_parser.py`), which builds one
//! `code -> id` map up front and pages through unlinked products rather
//! than joining in SQL, to bound memory on a multi-million-row table.

use crate::database::entity::{store_product::StoreProductId, Item, StoreProduct};
use log::debug;
use sea_orm::{DatabaseConnection, DbErr};

/// Matches the Python `page_size` constant.
pub const DEFAULT_PAGE_SIZE: u64 = 100_000;

/// How often the original `db.session.flush()`'d progress; kept only as
/// a log cadence here since each `set_item_id` call is already its own
/// committed statement.
const LOG_EVERY: usize = 10_000;

/// Links every `StoreProduct` with `external = true` and no `item_id`
/// yet to the `Item` whose `code` matches, paging through `page_size`
/// rows at a time. Returns the number of rows linked.
pub async fn link_external_items(db: &DatabaseConnection, page_size: u64) -> Result<usize, DbErr> {
    let code_to_id = Item::code_to_id_map(db).await?;

    let mut after_id: StoreProductId = 0;
    let mut linked = 0usize;

    loop {
        let page = StoreProduct::page_unlinked_external(db, after_id, page_size).await?;
        if page.is_empty() {
            break;
        }

        for product in &page {
            after_id = product.id;
            let Some(&item_id) = code_to_id.get(&product.code) else {
                continue;
            };
            StoreProduct::set_item_id(db, product.id, item_id).await?;
            linked += 1;
            if linked % LOG_EVERY == 0 {
                debug!("linked {linked} store products to items so far");
            }
        }
    }

    Ok(linked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{
        self,
        entity::{
            chain, item,
            store::{self, StoreType},
            store_product::StoreProductDraft,
        },
    };
    use rust_decimal_macros::dec;

    async fn test_db() -> DatabaseConnection {
        database::init("sqlite::memory:").await
    }

    #[tokio::test]
    async fn links_unlinked_external_products_by_code() {
        let db = test_db().await;
        let chain = chain::Model::create(&db, 7290000000001, None, "test".to_string())
            .await
            .unwrap();
        store::Model::upsert_many(
            &db,
            chain.id,
            vec![store::NewStore {
                store_id: 1,
                name: "central".to_string(),
                city: "tel aviv".to_string(),
                address: "1 main st".to_string(),
                store_type: StoreType::Physical,
            }],
        )
        .await
        .unwrap();
        let stores = store::Model::all_for_chain(&db, chain.id).await.unwrap();
        let store_id = stores[0].id;

        let item = item::Model::insert_new(
            &db,
            7290000000001,
            dec!(1.0),
            crate::extract::unit::Unit::Unit,
            "widget".to_string(),
        )
        .await
        .unwrap();

        StoreProduct::insert_new(
            &db,
            &StoreProductDraft {
                store_id,
                code: 7290000000001,
                external: true,
                name: "widget".to_string(),
                quantity: "1".to_string(),
                unit: "יחידה".to_string(),
            },
        )
        .await
        .unwrap();

        let linked = link_external_items(&db, DEFAULT_PAGE_SIZE).await.unwrap();
        assert_eq!(linked, 1);

        let products = StoreProduct::existing_for_store(&db, store_id).await.unwrap();
        let product = products.values().next().unwrap();
        assert_eq!(product.item_id, Some(item.id));
    }

    #[tokio::test]
    async fn leaves_internal_products_untouched() {
        let db = test_db().await;
        let chain = chain::Model::create(&db, 7290000000001, None, "test".to_string())
            .await
            .unwrap();
        store::Model::upsert_many(
            &db,
            chain.id,
            vec![store::NewStore {
                store_id: 1,
                name: "central".to_string(),
                city: "tel aviv".to_string(),
                address: "1 main st".to_string(),
                store_type: StoreType::Physical,
            }],
        )
        .await
        .unwrap();
        let stores = store::Model::all_for_chain(&db, chain.id).await.unwrap();
        let store_id = stores[0].id;

        StoreProduct::insert_new(
            &db,
            &StoreProductDraft {
                store_id,
                code: 55,
                external: false,
                name: "loose candy".to_string(),
                quantity: "1".to_string(),
                unit: "יחידה".to_string(),
            },
        )
        .await
        .unwrap();

        let linked = link_external_items(&db, DEFAULT_PAGE_SIZE).await.unwrap();
        assert_eq!(linked, 0);
    }
}
