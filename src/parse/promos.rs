//! Promotions Parser: extracts promotions, their product membership,
//! restrictions and price function from a case-folded promotions
//! document, and persists them. Grounded in
//! `ChainXmlParser.get_promos_from_file` and its helpers
//! (`original_source/backend/xml_parser.py`). Promotions are stored but
//! never priced against a cart (spec.md non-goals).

use crate::database::entity::{
    price_function::PriceFunctionKind,
    restriction::{NewRestriction, RestrictionKind},
    store::StoreId,
    store_product::StoreProductId,
    PriceFunction, Promotion, PromotionProduct, Restriction,
};
use crate::extract::{iter_tag, ElementAccess};
use chrono::NaiveDate;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, DbErr};
use std::collections::HashMap;

/// A promotion as extracted from one `promotion` element, before its
/// item codes have been resolved against this store's `StoreProduct`s.
#[derive(Debug, Clone)]
pub struct ParsedPromotion {
    pub internal_promotion_code: i64,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub item_codes: Vec<i64>,
    pub min_qty: Option<i32>,
    pub max_qty: Option<i32>,
    pub club_ids: Vec<i32>,
    pub price_function: (PriceFunctionKind, Decimal),
}

/// Extracts every `promotion` element. `file_date` is the fallback for
/// `promotionstartdate`/`promotionenddate` when the tag is missing or
/// unparsable — the typed-accessor defaulting policy of spec.md §4.4
/// extended to dates, since neither source `xml_parser.py` actually
/// reaches this far before being cut off.
pub fn extract_promotions(doc: &Document, file_date: NaiveDate) -> Vec<ParsedPromotion> {
    iter_tag(doc.root(), "promotion")
        .map(|elm| {
            let internal_promotion_code = elm.as_int("promotionid");
            let description = elm.as_string("promotiondescription");
            let start_date = parse_date_or(elm, "promotionstartdate", file_date);
            let end_date = parse_date_or(elm, "promotionenddate", file_date);

            let item_codes: Vec<i64> = iter_tag(elm, "promotionitems")
                .map(|item| item.as_int("itemcode"))
                .collect();

            let min_qty = non_zero_i32(elm.as_int("minqty"));
            let max_qty = non_zero_i32(elm.as_int("maxqty"));
            let club_ids: Vec<i32> = iter_tag(elm, "clubs")
                .map(|c| c.as_int("clubid") as i32)
                .filter(|&id| id != 0)
                .collect();

            let price_function = extract_price_function(elm);

            ParsedPromotion {
                internal_promotion_code,
                description,
                start_date,
                end_date,
                item_codes,
                min_qty,
                max_qty,
                club_ids,
                price_function,
            }
        })
        .collect()
}

fn parse_date_or(elm: Node, tag: &str, fallback: NaiveDate) -> NaiveDate {
    let text = elm.as_string(tag);
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text.trim(), "%Y%m%d"))
        .unwrap_or(fallback)
}

fn non_zero_i32(value: i64) -> Option<i32> {
    if value == 0 {
        None
    } else {
        Some(value as i32)
    }
}

/// `discounttype` 0 is a percentage off (normalized: values over 100 are
/// divided by 100, matching the source heuristic verbatim), 1 is a fixed
/// total price (spec.md §3, §4.7).
fn extract_price_function(elm: Node) -> (PriceFunctionKind, Decimal) {
    match elm.as_int("discounttype") {
        1 => (PriceFunctionKind::TotalPrice, elm.as_float("discountedprice")),
        _ => {
            let mut amount = elm.as_float("discountrate");
            if amount > dec!(100) {
                amount /= dec!(100);
            }
            (PriceFunctionKind::Percentage, amount)
        }
    }
}

/// Persists every parsed promotion for `store_id`: upserts the
/// `Promotion` row on `(store_id, internal_promotion_code)`, then
/// replaces its `PromotionProduct` members, `Restriction`s and
/// `PriceFunction` wholesale (promotions are re-parsed in full on every
/// run, so there is nothing to diff — spec.md §4.7). Item codes with no
/// matching `StoreProduct` in this store are silently dropped, matching
/// the original's bare `except: pass`. Returns the number of promotions
/// persisted.
pub async fn persist_promotions<C: ConnectionTrait>(
    db: &C,
    store_id: StoreId,
    promotions: Vec<ParsedPromotion>,
    code_to_store_product_id: &HashMap<i64, StoreProductId>,
) -> Result<usize, DbErr> {
    let mut persisted = 0usize;

    for promo in promotions {
        let row = Promotion::upsert(
            db,
            store_id,
            promo.internal_promotion_code,
            promo.description,
            promo.start_date,
            promo.end_date,
        )
        .await?;

        let member_ids: Vec<StoreProductId> = promo
            .item_codes
            .iter()
            .filter_map(|code| code_to_store_product_id.get(code).copied())
            .collect();
        PromotionProduct::replace_members(db, row.id, &member_ids).await?;

        let mut restrictions = Vec::new();
        if let Some(qty) = promo.min_qty {
            restrictions.push(NewRestriction {
                kind: RestrictionKind::MinQty,
                amount: Some(qty),
                store_product_id: None,
            });
        }
        if let Some(qty) = promo.max_qty {
            restrictions.push(NewRestriction {
                kind: RestrictionKind::MaxQty,
                amount: Some(qty),
                store_product_id: None,
            });
        }
        for club_id in &promo.club_ids {
            restrictions.push(NewRestriction {
                kind: RestrictionKind::ClubIds,
                amount: Some(*club_id),
                store_product_id: None,
            });
        }
        Restriction::replace_for_promotion(db, row.id, restrictions).await?;

        let (kind, value) = promo.price_function;
        PriceFunction::upsert(db, row.id, kind, value).await?;

        persisted += 1;
    }

    Ok(persisted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn extracts_members_restrictions_and_percentage_discount() {
        let xml = r#"<root><promotion>
            <promotionid>123</promotionid>
            <promotiondescription>10% off</promotiondescription>
            <promotionstartdate>2020-01-01</promotionstartdate>
            <promotionenddate>2020-01-31</promotionenddate>
            <promotionitems><itemcode>7290000000001</itemcode></promotionitems>
            <promotionitems><itemcode>7290000000002</itemcode></promotionitems>
            <minqty>2</minqty>
            <clubs><clubid>5</clubid></clubs>
            <discounttype>0</discounttype>
            <discountrate>10</discountrate>
        </promotion></root>"#;
        let doc = Document::parse(xml).unwrap();
        let promos = extract_promotions(&doc, date(2020, 1, 1));

        assert_eq!(promos.len(), 1);
        let promo = &promos[0];
        assert_eq!(promo.internal_promotion_code, 123);
        assert_eq!(promo.item_codes, vec![7290000000001, 7290000000002]);
        assert_eq!(promo.min_qty, Some(2));
        assert_eq!(promo.max_qty, None);
        assert_eq!(promo.club_ids, vec![5]);
        assert_eq!(promo.price_function, (PriceFunctionKind::Percentage, dec!(10)));
        assert_eq!(promo.start_date, date(2020, 1, 1));
        assert_eq!(promo.end_date, date(2020, 1, 31));
    }

    #[test]
    fn percentage_over_100_is_divided_by_100() {
        let xml = r#"<root><promotion>
            <promotionid>1</promotionid>
            <discounttype>0</discounttype>
            <discountrate>1500</discountrate>
        </promotion></root>"#;
        let doc = Document::parse(xml).unwrap();
        let promos = extract_promotions(&doc, date(2020, 1, 1));
        assert_eq!(promos[0].price_function, (PriceFunctionKind::Percentage, dec!(15)));
    }

    #[test]
    fn total_price_discount_type() {
        let xml = r#"<root><promotion>
            <promotionid>1</promotionid>
            <discounttype>1</discounttype>
            <discountedprice>19.90</discountedprice>
        </promotion></root>"#;
        let doc = Document::parse(xml).unwrap();
        let promos = extract_promotions(&doc, date(2020, 1, 1));
        assert_eq!(promos[0].price_function, (PriceFunctionKind::TotalPrice, dec!(19.90)));
    }

    #[test]
    fn missing_dates_fall_back_to_the_file_date() {
        let xml = "<root><promotion><promotionid>1</promotionid></promotion></root>";
        let doc = Document::parse(xml).unwrap();
        let fallback = date(2020, 6, 1);
        let promos = extract_promotions(&doc, fallback);
        assert_eq!(promos[0].start_date, fallback);
        assert_eq!(promos[0].end_date, fallback);
    }

    #[tokio::test]
    async fn unknown_item_codes_are_silently_dropped() {
        use crate::database::{self, entity::store::StoreType};

        let db = database::init("sqlite::memory:").await;
        let chain = crate::database::entity::chain::Model::create(
            &db,
            7290000000001,
            None,
            "test".to_string(),
        )
        .await
        .unwrap();
        crate::database::entity::store::Model::upsert_many(
            &db,
            chain.id,
            vec![crate::database::entity::store::NewStore {
                store_id: 1,
                name: "central".to_string(),
                city: "tel aviv".to_string(),
                address: "1 main st".to_string(),
                store_type: StoreType::Physical,
            }],
        )
        .await
        .unwrap();
        let stores = crate::database::entity::store::Model::all_for_chain(&db, chain.id)
            .await
            .unwrap();
        let store_id = stores[0].id;

        let xml = r#"<root><promotion>
            <promotionid>1</promotionid>
            <promotiondescription>mystery promo</promotiondescription>
            <promotionitems><itemcode>999999999</itemcode></promotionitems>
            <discounttype>1</discounttype>
            <discountedprice>5.00</discountedprice>
        </promotion></root>"#;
        let doc = Document::parse(xml).unwrap();
        let promos = extract_promotions(&doc, date(2020, 1, 1));

        let persisted = persist_promotions(&db, store_id, promos, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(persisted, 1);
    }
}
