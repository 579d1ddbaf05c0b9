//! Stores Parser: turns a chain's stores file into the rows
//! [crate::database::entity::store::Model::upsert_many] persists.
//! Grounded in `ChainXmlParser.parse_stores`
//! (`original_source/backend/xml_parser.py`).

use crate::{
    database::entity::store::{NewStore, StoreType},
    extract::{iter_tag, ElementAccess},
};
use roxmltree::Document;
use std::collections::BTreeSet;

/// Chains that publish their branches under a `<branch>` tag instead of
/// the usual `<store>` — a naming inconsistency in the source data, not
/// something worth generalizing past a lookup table.
const BRANCH_TAG_CHAINS: &[&str] = &["מחסני להב", "מחסני השוק", "ויקטורי"];

fn store_tag_for(chain_name: &str) -> &'static str {
    if BRANCH_TAG_CHAINS.contains(&chain_name) {
        "branch"
    } else {
        "store"
    }
}

/// Every distinct `subchainid` present in the document, used to decide
/// whether a multi-subchain file needs per-row filtering.
pub fn subchain_ids(doc: &Document) -> Vec<i32> {
    let ids: BTreeSet<i32> = iter_tag(doc.root(), "subchainid")
        .filter_map(|n| n.text())
        .filter_map(|t| t.trim().parse().ok())
        .collect();
    ids.into_iter().collect()
}

/// A store row plus, for multi-subchain files, the subchain name the
/// owning chain's display name should be renamed to.
pub struct ParsedStore {
    pub store: NewStore,
    pub subchain_name: Option<String>,
}

/// Parses every store element belonging to `subchain_id` (or every
/// element, if the file only publishes one subchain) out of a
/// case-folded stores document.
pub fn parse_stores(doc: &Document, chain_name: &str, subchain_id: Option<i32>) -> Vec<ParsedStore> {
    let tag = store_tag_for(chain_name);
    let subchains = subchain_ids(doc);
    let multi_subchain = subchains.len() > 1;

    let mut out = Vec::new();
    for elm in iter_tag(doc.root(), tag) {
        let mut subchain_name = None;
        if multi_subchain {
            let elm_subchain_id = elm.as_int("subchainid") as i32;
            if Some(elm_subchain_id) != subchain_id {
                continue;
            }
            subchain_name = Some(elm.as_string("subchainname"));
        }

        let store_type = match elm.as_int("storetype") {
            1 => StoreType::Physical,
            2 => StoreType::Web,
            3 => StoreType::Both,
            _ => StoreType::Unknown,
        };

        out.push(ParsedStore {
            store: NewStore {
                store_id: elm.as_int("storeid") as i32,
                name: elm.as_string("storename"),
                city: elm.as_string("city"),
                address: elm.as_string("address"),
                store_type,
            },
            subchain_name,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_SUBCHAIN_XML: &str = r#"
        <root>
            <store>
                <storeid>7</storeid>
                <storename>central</storename>
                <city>tel aviv</city>
                <address>1 main st</address>
                <storetype>1</storetype>
            </store>
        </root>
    "#;

    #[test]
    fn parses_single_subchain_file() {
        let doc = Document::parse(SINGLE_SUBCHAIN_XML).unwrap();
        let stores = parse_stores(&doc, "שופרסל", None);
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].store.store_id, 7);
        assert_eq!(stores[0].store.store_type, StoreType::Physical);
        assert!(stores[0].subchain_name.is_none());
    }

    #[test]
    fn filters_by_subchain_and_renames() {
        let xml = r#"
            <root>
                <store>
                    <storeid>1</storeid><storename>a</storename><city>a</city>
                    <address>a</address><storetype>1</storetype>
                    <subchainid>10</subchainid><subchainname>sub a</subchainname>
                </store>
                <store>
                    <storeid>2</storeid><storename>b</storename><city>b</city>
                    <address>b</address><storetype>1</storetype>
                    <subchainid>20</subchainid><subchainname>sub b</subchainname>
                </store>
            </root>
        "#;
        let doc = Document::parse(xml).unwrap();
        let stores = parse_stores(&doc, "chain", Some(20));
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].store.store_id, 2);
        assert_eq!(stores[0].subchain_name.as_deref(), Some("sub b"));
    }

    #[test]
    fn uses_branch_tag_for_known_chains() {
        let xml = r#"<root><branch><storeid>3</storeid><storename>x</storename>
            <city>x</city><address>x</address><storetype>0</storetype></branch></root>"#;
        let doc = Document::parse(xml).unwrap();
        let stores = parse_stores(&doc, "ויקטורי", None);
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].store.store_id, 3);
    }
}
