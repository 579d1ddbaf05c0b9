//! End-to-end walk of the six literal reconciliation scenarios against
//! one in-memory database, applied in chronological order. Unit tests
//! alongside `reconcile` already cover each mechanism in isolation; this
//! test asserts the full sequence holds together the way a real daily
//! ingestion run would produce it.

use chrono::NaiveDate;
use price_ingest::database::{
    self,
    entity::{
        chain, current_price, price_history,
        store::{self, StoreType},
        Item, PriceHistory, StoreProduct,
    },
};
use price_ingest::reconcile::{apply_snapshot, extract_prices};
use roxmltree::Document;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn item_xml(code: i64, item_type: u8, price: &str) -> String {
    format!(
        r#"<root><item>
            <itemcode>{code}</itemcode>
            <itemtype>{item_type}</itemtype>
            <itemname>A</itemname>
            <quantity>1.0</quantity>
            <unitqty>ק"ג</unitqty>
            <itemprice>{price}</itemprice>
        </item></root>"#
    )
}

#[tokio::test]
async fn six_scenario_walk_matches_the_literal_spec_data() {
    let db = database::init("sqlite::memory:").await;

    let chain = chain::Model::create(&db, 7290000000099, None, "test chain".to_string())
        .await
        .unwrap();
    store::Model::upsert_many(
        &db,
        chain.id,
        vec![store::NewStore {
            store_id: 42,
            name: "central".to_string(),
            city: "tel aviv".to_string(),
            address: "1 main st".to_string(),
            store_type: StoreType::Physical,
        }],
    )
    .await
    .unwrap();
    let store_id = store::Entity::find().one(&db).await.unwrap().unwrap().id;

    // 1. First ingestion: 2020-01-10, one external item at 9.90.
    let d1 = date(2020, 1, 10);
    let doc = Document::parse(&item_xml(7290000000001, 1, "9.90")).unwrap();
    apply_snapshot(&db, store_id, d1, d1, extract_prices(&doc, store_id))
        .await
        .unwrap();

    assert_eq!(Item::all_codes(&db).await.unwrap().len(), 1);
    let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].start_date, d1);
    assert_eq!(open[0].end_date, None);
    assert_eq!(open[0].price, dec!(9.90));
    let current = current_price::Entity::find().all(&db).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].price, dec!(9.90));

    // 2. Price unchanged within tolerance: 2020-01-11 at 9.895.
    let d2 = date(2020, 1, 11);
    let doc = Document::parse(&item_xml(7290000000001, 1, "9.895")).unwrap();
    apply_snapshot(&db, store_id, d2, d2, extract_prices(&doc, store_id))
        .await
        .unwrap();

    let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
    assert_eq!(open.len(), 1, "tolerance should not open a second interval");
    assert_eq!(open[0].start_date, d1);
    let current = current_price::Entity::find().all(&db).await.unwrap();
    assert_eq!(current[0].price, dec!(9.90));

    // 3. Price changed: 2020-01-12 at 9.50.
    let d3 = date(2020, 1, 12);
    let doc = Document::parse(&item_xml(7290000000001, 1, "9.50")).unwrap();
    apply_snapshot(&db, store_id, d3, d3, extract_prices(&doc, store_id))
        .await
        .unwrap();

    let all_history = price_history::Entity::find().all(&db).await.unwrap();
    let closed = all_history
        .iter()
        .find(|h| h.start_date == d1)
        .expect("original interval still present");
    assert_eq!(closed.end_date, Some(date(2020, 1, 11)));
    let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].start_date, d3);
    assert_eq!(open[0].price, dec!(9.50));
    let current = current_price::Entity::find().all(&db).await.unwrap();
    assert_eq!(current[0].price, dec!(9.50));

    // 4. Disappearance: 2020-01-13 omits the item entirely.
    let d4 = date(2020, 1, 13);
    let empty = Document::parse("<root></root>").unwrap();
    apply_snapshot(&db, store_id, d4, d4, extract_prices(&empty, store_id))
        .await
        .unwrap();

    let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
    assert!(open.is_empty(), "no open interval should remain after disappearance");
    let all_history = price_history::Entity::find().all(&db).await.unwrap();
    let last_interval = all_history.iter().find(|h| h.start_date == d3).unwrap();
    assert_eq!(last_interval.end_date, Some(date(2020, 1, 12)));
    let current = current_price::Entity::find().all(&db).await.unwrap();
    assert!(current.is_empty(), "current price should be deleted on disappearance");

    // 5. New item appears: 2020-01-14 adds a second, unrelated code.
    let d5 = date(2020, 1, 14);
    let doc = Document::parse(&item_xml(7290000000002, 1, "4.00")).unwrap();
    apply_snapshot(&db, store_id, d5, d5, extract_prices(&doc, store_id))
        .await
        .unwrap();

    assert_eq!(Item::all_codes(&db).await.unwrap().len(), 2);
    let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].price, dec!(4.00));
    let current = current_price::Entity::find().all(&db).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].price, dec!(4.00));

    // 6. Internal (chain-private) item: never creates an Item row, but
    // still gets full PriceHistory/CurrentPrice treatment.
    let d6 = date(2020, 1, 15);
    let doc = Document::parse(&item_xml(55, 0, "2.00")).unwrap();
    let mut parsed = extract_prices(&doc, store_id);
    // Keep the still-present item from scenario 5 in this snapshot too,
    // otherwise it would be treated as disappeared.
    let prior = Document::parse(&item_xml(7290000000002, 1, "4.00")).unwrap();
    parsed.extend(extract_prices(&prior, store_id));
    apply_snapshot(&db, store_id, d6, d6, parsed).await.unwrap();

    assert_eq!(
        Item::all_codes(&db).await.unwrap().len(),
        2,
        "internal item must not create a catalog row"
    );
    let products = StoreProduct::existing_for_store(&db, store_id).await.unwrap();
    assert_eq!(products.len(), 3, "all three distinct codes persisted");
    let open = PriceHistory::open_for_store(&db, store_id).await.unwrap();
    assert_eq!(open.len(), 2);
    let internal_open = open.iter().find(|h| h.price == dec!(2.00)).unwrap();
    assert_eq!(internal_open.start_date, d6);
}
