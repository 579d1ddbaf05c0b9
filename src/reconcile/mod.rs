//! Prices Parser + Reconciliation Engine — the core of the pipeline.
//!
//! [extract_prices] turns a case-folded prices document into an
//! in-memory snapshot keyed by `(store_id, code)`. [apply_snapshot]
//! merges that snapshot into the store's `StoreProduct`/`PriceHistory`/
//! `CurrentPrice` state inside one transaction, running the four
//! strictly-ordered stages spec.md §4.6.2 describes. Grounded in
//! `ChainXmlParser.parse_store_prices` and its helpers
//! (`original_source/backend/xml_parser.py`).

pub mod linking;

use crate::database::entity::{
    store::StoreId,
    store_product::{StoreProductDraft, StoreProductId, StoreProductKey},
    CurrentPrice, Item, PriceHistory, StoreProduct,
};
use crate::extract::{iter_tag, unit::Unit, ElementAccess};
use chrono::{Days, NaiveDate};
use roxmltree::Document;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// One parsed price line: the raw `StoreProduct` draft plus the fields
/// needed to create a catalog [Item] if the code turns out to be new.
#[derive(Debug, Clone)]
pub struct ParsedLine {
    pub draft: StoreProductDraft,
    pub item_quantity: Decimal,
    pub item_unit: Unit,
    pub price: Decimal,
}

/// Extracts every item/product element from a case-folded prices
/// document into a map keyed by `(store_id, code)`. Duplicate codes
/// within one file are collapsed last-write-wins by `HashMap::insert`,
/// matching the set/dict semantics of the original (spec.md §4.6.1).
pub fn extract_prices(doc: &Document, store_id: StoreId) -> HashMap<StoreProductKey, ParsedLine> {
    let tag = item_tag_for(doc);

    let mut out = HashMap::new();
    for elm in iter_tag(doc.root(), tag) {
        let code = elm.as_int("itemcode");
        let external = elm.as_bool("itemtype") && code.to_string().len() >= 13;
        let name = elm.as_string("itemname");
        let raw_quantity = elm.as_string("quantity");
        let raw_unit = elm.as_string("unitqty");
        let price = elm.as_float("itemprice");

        let mut item_quantity = elm.as_float("quantity");
        if item_quantity > dec!(1000) {
            item_quantity = Decimal::ZERO;
        }
        let item_unit = Unit::from_raw(&raw_unit);

        let draft = StoreProductDraft {
            store_id,
            code,
            external,
            name,
            quantity: raw_quantity,
            unit: raw_unit,
        };
        let key = draft.key();
        out.insert(
            key,
            ParsedLine {
                draft,
                item_quantity,
                item_unit,
                price,
            },
        );
    }
    out
}

/// `item`, falling back to `product` if the file doesn't use that tag —
/// a format change some chains made without warning (spec.md §4.6.1).
fn item_tag_for(doc: &Document) -> &'static str {
    if iter_tag(doc.root(), "item").next().is_some() {
        "item"
    } else {
        "product"
    }
}

/// Merges one store's parsed daily snapshot into the persisted
/// `StoreProduct`/`PriceHistory`/`CurrentPrice` state, running the four
/// stages of spec.md §4.6.2 inside a single transaction. `today` decides
/// whether stage 4 (current-price materialization) runs; it is passed in
/// rather than read from the clock so tests can drive scenarios without
/// waiting for a real day to pass.
pub async fn apply_snapshot(
    db: &DatabaseConnection,
    store_id: StoreId,
    date: NaiveDate,
    today: NaiveDate,
    parsed: HashMap<StoreProductKey, ParsedLine>,
) -> Result<(), ReconcileError> {
    let txn = db.begin().await?;

    insert_new_items(&txn, &parsed).await?;
    let product_ids = insert_new_store_products(&txn, store_id, &parsed).await?;
    update_history(&txn, store_id, date, &parsed, &product_ids).await?;
    if date == today {
        materialize_current_prices(&txn, store_id).await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Stage 1: any parsed row with `external = true` whose code has no
/// matching [Item] row yet gets one inserted.
async fn insert_new_items<C: ConnectionTrait>(
    db: &C,
    parsed: &HashMap<StoreProductKey, ParsedLine>,
) -> Result<(), ReconcileError> {
    let existing = Item::all_codes(db).await?;
    let mut inserted_this_run = HashSet::new();

    for line in parsed.values() {
        if !line.draft.external {
            continue;
        }
        let code = line.draft.code;
        if existing.contains(&code) || !inserted_this_run.insert(code) {
            continue;
        }
        Item::insert_new(db, code, line.item_quantity, line.item_unit, line.draft.name.clone()).await?;
    }
    Ok(())
}

/// Stage 2: inserts any store product not already present, then
/// re-queries the full persisted set so every parsed row rebinds to a
/// real surrogate id (spec.md §9's identity-by-composite-key note).
async fn insert_new_store_products<C: ConnectionTrait>(
    db: &C,
    store_id: StoreId,
    parsed: &HashMap<StoreProductKey, ParsedLine>,
) -> Result<HashMap<StoreProductKey, StoreProductId>, ReconcileError> {
    let existing = StoreProduct::existing_for_store(db, store_id).await?;

    for (key, line) in parsed {
        if existing.contains_key(key) {
            continue;
        }
        StoreProduct::insert_new(db, &line.draft).await?;
    }

    let persisted = StoreProduct::existing_for_store(db, store_id).await?;
    Ok(persisted.into_iter().map(|(key, model)| (key, model.id)).collect())
}

/// Stage 3: the three-way diff against currently-open `PriceHistory`
/// rows (spec.md §4.6.2). New intervals open at `date`; intervals whose
/// product vanished from the snapshot close at `date - 1`; intervals
/// whose price moved by more than the 0.01 tolerance close at `date - 1`
/// and reopen at `date` with the new price.
async fn update_history<C: ConnectionTrait>(
    db: &C,
    store_id: StoreId,
    date: NaiveDate,
    parsed: &HashMap<StoreProductKey, ParsedLine>,
    product_ids: &HashMap<StoreProductKey, StoreProductId>,
) -> Result<(), ReconcileError> {
    let open = PriceHistory::open_for_store(db, store_id).await?;
    let open_by_product: HashMap<StoreProductId, Decimal> =
        open.iter().map(|h| (h.store_product_id, h.price)).collect();

    let mut parsed_by_id: HashMap<StoreProductId, Decimal> = HashMap::new();
    for (key, line) in parsed {
        if let Some(&id) = product_ids.get(key) {
            parsed_by_id.insert(id, line.price);
        }
    }

    let end_date = date
        .checked_sub_days(Days::new(1))
        .expect("snapshot date is not the epoch");

    for (&id, &price) in &parsed_by_id {
        if !open_by_product.contains_key(&id) {
            PriceHistory::insert_new(db, id, date, price).await?;
        }
    }

    for row in &open {
        if !parsed_by_id.contains_key(&row.store_product_id) {
            PriceHistory::close(db, row.id, end_date).await?;
        }
    }

    for row in &open {
        let Some(&new_price) = parsed_by_id.get(&row.store_product_id) else {
            continue;
        };
        if price_changed(row.price, new_price) {
            PriceHistory::close(db, row.id, end_date).await?;
            PriceHistory::insert_new(db, row.store_product_id, date, new_price).await?;
        }
    }

    Ok(())
}

/// Prices are fixed-point 2dp; compare with `Decimal` arithmetic rather
/// than floats to avoid drift at the 0.01 threshold (spec.md §9).
fn price_changed(old: Decimal, new: Decimal) -> bool {
    (old - new).abs() > dec!(0.01)
}

/// Stage 4, only run when `date` is today: deletes all `CurrentPrice`
/// rows for the store's products, then reinserts one per now-open
/// `PriceHistory` interval.
async fn materialize_current_prices<C: ConnectionTrait>(
    db: &C,
    store_id: StoreId,
) -> Result<(), ReconcileError> {
    let products = StoreProduct::existing_for_store(db, store_id).await?;
    let ids: Vec<StoreProductId> = products.values().map(|p| p.id).collect();
    CurrentPrice::delete_for_store_products(db, &ids).await?;

    let open = PriceHistory::open_for_store(db, store_id).await?;
    for row in open {
        CurrentPrice::insert_new(db, row.store_product_id, row.price).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{self, entity::store::StoreType};
    use roxmltree::Document;
    use sea_orm::EntityTrait;

    async fn test_db() -> DatabaseConnection {
        database::init("sqlite::memory:").await
    }

    async fn seed_store(db: &DatabaseConnection) -> StoreId {
        use crate::database::entity::{chain, store};

        let chain = chain::Model::create(db, 7290000000001, None, "test chain".to_string())
            .await
            .unwrap();
        store::Model::upsert_many(
            db,
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
        store::Entity::find()
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    fn single_item_xml(code: i64, price: &str) -> String {
        format!(
            r#"<root><item>
                <itemcode>{code}</itemcode>
                <itemtype>1</itemtype>
                <itemname>widget</itemname>
                <quantity>1.0</quantity>
                <unitqty>יחידה</unitqty>
                <itemprice>{price}</itemprice>
            </item></root>"#
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn first_ingestion_opens_history_and_current_price() {
        let db = test_db().await;
        let store_id = seed_store(&db).await;
        let d = date(2020, 1, 10);

        let xml = single_item_xml(7290000000001, "9.90");
        let doc = Document::parse(&xml).unwrap();
        let parsed = extract_prices(&doc, store_id);
        apply_snapshot(&db, store_id, d, d, parsed).await.unwrap();

        let items = Item::all_codes(&db).await.unwrap();
        assert_eq!(items.len(), 1);

        let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].start_date, d);
        assert_eq!(open[0].price, dec!(9.90));

        let current = crate::database::entity::current_price::Entity::find()
            .all(&db)
            .await
            .unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].price, dec!(9.90));
    }

    #[tokio::test]
    async fn price_within_tolerance_is_a_no_op() {
        let db = test_db().await;
        let store_id = seed_store(&db).await;
        let d1 = date(2020, 1, 10);
        let d2 = date(2020, 1, 11);

        let xml1 = single_item_xml(7290000000001, "9.90");
        let doc1 = Document::parse(&xml1).unwrap();
        apply_snapshot(&db, store_id, d1, d1, extract_prices(&doc1, store_id))
            .await
            .unwrap();

        let xml2 = single_item_xml(7290000000001, "9.895");
        let doc2 = Document::parse(&xml2).unwrap();
        apply_snapshot(&db, store_id, d2, d2, extract_prices(&doc2, store_id))
            .await
            .unwrap();

        let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
        assert_eq!(open.len(), 1, "no new history row should appear within tolerance");
        assert_eq!(open[0].start_date, d1);
        assert_eq!(open[0].price, dec!(9.90));
    }

    #[tokio::test]
    async fn price_change_closes_and_reopens_interval() {
        let db = test_db().await;
        let store_id = seed_store(&db).await;
        let d1 = date(2020, 1, 10);
        let d2 = date(2020, 1, 12);

        let doc1 = Document::parse(&single_item_xml(7290000000001, "9.90")).unwrap();
        apply_snapshot(&db, store_id, d1, d1, extract_prices(&doc1, store_id))
            .await
            .unwrap();

        let doc2 = Document::parse(&single_item_xml(7290000000001, "9.50")).unwrap();
        apply_snapshot(&db, store_id, d2, d2, extract_prices(&doc2, store_id))
            .await
            .unwrap();

        let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].price, dec!(9.50));
        assert_eq!(open[0].start_date, d2);

        let current = crate::database::entity::current_price::Entity::find()
            .all(&db)
            .await
            .unwrap();
        assert_eq!(current[0].price, dec!(9.50));
    }

    #[tokio::test]
    async fn disappearance_closes_interval_at_d_minus_one_and_deletes_current() {
        let db = test_db().await;
        let store_id = seed_store(&db).await;
        let d1 = date(2020, 1, 10);
        let d2 = date(2020, 1, 13);

        let doc1 = Document::parse(&single_item_xml(7290000000001, "9.90")).unwrap();
        apply_snapshot(&db, store_id, d1, d1, extract_prices(&doc1, store_id))
            .await
            .unwrap();

        let empty_doc = Document::parse("<root></root>").unwrap();
        apply_snapshot(&db, store_id, d2, d2, extract_prices(&empty_doc, store_id))
            .await
            .unwrap();

        let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
        assert!(open.is_empty());

        let current = crate::database::entity::current_price::Entity::find()
            .all(&db)
            .await
            .unwrap();
        assert!(current.is_empty());
    }

    #[tokio::test]
    async fn reappearance_opens_a_new_interval_never_merged_with_the_old_one() {
        let db = test_db().await;
        let store_id = seed_store(&db).await;
        let d1 = date(2020, 1, 10);
        let d2 = date(2020, 1, 13);
        let d3 = date(2020, 1, 20);

        let doc1 = Document::parse(&single_item_xml(7290000000001, "9.90")).unwrap();
        apply_snapshot(&db, store_id, d1, d1, extract_prices(&doc1, store_id))
            .await
            .unwrap();

        let empty_doc = Document::parse("<root></root>").unwrap();
        apply_snapshot(&db, store_id, d2, d2, extract_prices(&empty_doc, store_id))
            .await
            .unwrap();

        let doc3 = Document::parse(&single_item_xml(7290000000001, "9.90")).unwrap();
        apply_snapshot(&db, store_id, d3, d3, extract_prices(&doc3, store_id))
            .await
            .unwrap();

        let all_history = crate::database::entity::price_history::Entity::find()
            .all(&db)
            .await
            .unwrap();
        assert_eq!(all_history.len(), 2, "a new interval, not a merge with the old one");

        let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].start_date, d3);
    }

    #[tokio::test]
    async fn internal_item_gets_history_but_no_catalog_row() {
        let db = test_db().await;
        let store_id = seed_store(&db).await;
        let d = date(2020, 1, 10);

        let xml = r#"<root><item>
            <itemcode>55</itemcode>
            <itemtype>0</itemtype>
            <itemname>loose candy</itemname>
            <quantity>1.0</quantity>
            <unitqty>יחידה</unitqty>
            <itemprice>2.00</itemprice>
        </item></root>"#;
        let doc = Document::parse(xml).unwrap();
        apply_snapshot(&db, store_id, d, d, extract_prices(&doc, store_id))
            .await
            .unwrap();

        let items = Item::all_codes(&db).await.unwrap();
        assert!(items.is_empty());

        let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].price, dec!(2.00));
    }

    #[tokio::test]
    async fn applying_the_same_snapshot_twice_is_idempotent() {
        let db = test_db().await;
        let store_id = seed_store(&db).await;
        let d = date(2020, 1, 10);

        let xml = single_item_xml(7290000000001, "9.90");
        let doc = Document::parse(&xml).unwrap();
        apply_snapshot(&db, store_id, d, d, extract_prices(&doc, store_id))
            .await
            .unwrap();
        apply_snapshot(&db, store_id, d, d, extract_prices(&doc, store_id))
            .await
            .unwrap();

        let all_history = crate::database::entity::price_history::Entity::find()
            .all(&db)
            .await
            .unwrap();
        assert_eq!(all_history.len(), 1);

        let current = crate::database::entity::current_price::Entity::find()
            .all(&db)
            .await
            .unwrap();
        assert_eq!(current.len(), 1);
    }

    #[test]
    fn duplicate_codes_within_a_file_are_last_write_wins() {
        let xml = r#"<root>
            <item><itemcode>7290000000001</itemcode><itemtype>1</itemtype>
                <itemname>widget</itemname><quantity>1.0</quantity>
                <unitqty>יחידה</unitqty><itemprice>1.00</itemprice></item>
            <item><itemcode>7290000000001</itemcode><itemtype>1</itemtype>
                <itemname>widget v2</itemname><quantity>1.0</quantity>
                <unitqty>יחידה</unitqty><itemprice>2.00</itemprice></item>
        </root>"#;
        let doc = Document::parse(xml).unwrap();
        let parsed = extract_prices(&doc, 1);
        assert_eq!(parsed.len(), 1);
        let line = parsed.values().next().unwrap();
        assert_eq!(line.price, dec!(2.00));
        assert_eq!(line.draft.name, "widget v2");
    }

    #[test]
    fn falls_back_to_product_tag_when_item_tag_is_absent() {
        let xml = r#"<root><product>
            <itemcode>7290000000001</itemcode><itemtype>1</itemtype>
            <itemname>widget</itemname><quantity>1.0</quantity>
            <unitqty>יחידה</unitqty><itemprice>1.00</itemprice>
        </product></root>"#;
        let doc = Document::parse(xml).unwrap();
        let parsed = extract_prices(&doc, 1);
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn quantity_sentinel_above_1000_is_clamped_to_zero() {
        let xml = r#"<root><item>
            <itemcode>7290000000001</itemcode><itemtype>1</itemtype>
            <itemname>widget</itemname><quantity>99999</quantity>
            <unitqty>יחידה</unitqty><itemprice>1.00</itemprice>
        </item></root>"#;
        let doc = Document::parse(xml).unwrap();
        let parsed = extract_prices(&doc, 1);
        assert_eq!(parsed.values().next().unwrap().item_quantity, Decimal::ZERO);
    }

    #[test]
    fn external_flag_requires_both_itemtype_and_13_digit_code() {
        let xml = r#"<root>
            <item><itemcode>55</itemcode><itemtype>1</itemtype>
                <itemname>short code</itemname><quantity>1.0</quantity>
                <unitqty>יחידה</unitqty><itemprice>1.00</itemprice></item>
            <item><itemcode>7290000000001</itemcode><itemtype>0</itemtype>
                <itemname>not flagged external</itemname><quantity>1.0</quantity>
                <unitqty>יחידה</unitqty><itemprice>1.00</itemprice></item>
        </root>"#;
        let doc = Document::parse(xml).unwrap();
        let parsed = extract_prices(&doc, 1);
        assert!(parsed.values().all(|line| !line.draft.external));
    }
}
