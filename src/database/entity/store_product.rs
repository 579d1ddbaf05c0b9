//! A SKU line as seen in one specific store's price file.
//!
//! Identity during reconciliation is by `(store_id, code)`, never by
//! surrogate id — [StoreProductKey] makes that key-based equivalence
//! explicit so parsed (unsaved) rows can be matched against persisted
//! ones via a lookup map instead of relying on object identity.

use crate::database::DbResult;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{item::ItemId, store::StoreId};

pub type StoreProductId = i64;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "store_products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: StoreProductId,
    pub item_id: Option<ItemId>,
    pub store_id: StoreId,
    /// Chain-internal or global barcode, depending on `external`.
    pub code: i64,
    pub external: bool,
    pub name: String,
    /// Raw quantity text as seen in the file, kept for manual recovery
    /// when automatic parsing fails.
    pub quantity: String,
    /// Raw unit text as seen in the file.
    pub unit: String,
}

/// A store product row as extracted from a prices file, before it has
/// been matched against (or inserted into) the `store_products` table.
#[derive(Debug, Clone)]
pub struct StoreProductDraft {
    pub store_id: StoreId,
    pub code: i64,
    pub external: bool,
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

impl StoreProductDraft {
    pub fn key(&self) -> StoreProductKey {
        StoreProductKey::new(self.store_id, self.code)
    }
}

impl Model {
    /// All persisted store products for `store_id`, keyed by `(store_id,
    /// code)` — the identity that lets freshly-parsed rows rebind to
    /// real surrogate ids (spec.md §9).
    pub async fn existing_for_store<C: ConnectionTrait>(
        db: &C,
        store_id: StoreId,
    ) -> DbResult<HashMap<StoreProductKey, Self>> {
        let rows = Entity::find()
            .filter(Column::StoreId.eq(store_id))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|r| (StoreProductKey::from(&r), r)).collect())
    }

    pub async fn insert_new<C: ConnectionTrait>(db: &C, draft: &StoreProductDraft) -> DbResult<Self> {
        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            item_id: sea_orm::ActiveValue::NotSet,
            store_id: Set(draft.store_id),
            code: Set(draft.code),
            external: Set(draft.external),
            name: Set(draft.name.clone()),
            quantity: Set(draft.quantity.clone()),
            unit: Set(draft.unit.clone()),
        };
        active.insert(db).await
    }

    /// Store products with `external = true` and no linked `Item` yet,
    /// paged for the cross-snapshot linking maintenance pass (spec.md
    /// §4.6.3), ordered by id so successive pages don't overlap.
    pub async fn page_unlinked_external<C: ConnectionTrait>(
        db: &C,
        after_id: StoreProductId,
        page_size: u64,
    ) -> DbResult<Vec<Self>> {
        Entity::find()
            .filter(Column::External.eq(true))
            .filter(Column::ItemId.is_null())
            .filter(Column::Id.gt(after_id))
            .order_by_asc(Column::Id)
            .limit(page_size)
            .all(db)
            .await
    }

    pub async fn set_item_id<C: ConnectionTrait>(
        db: &C,
        id: StoreProductId,
        item_id: ItemId,
    ) -> DbResult<()> {
        let active = ActiveModel {
            id: Set(id),
            item_id: Set(Some(item_id)),
            ..Default::default()
        };
        Entity::update(active).exec(db).await?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
    #[sea_orm(has_many = "super::price_history::Entity")]
    PriceHistory,
    #[sea_orm(has_one = "super::current_price::Entity")]
    CurrentPrice,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl Related<super::price_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceHistory.def()
    }
}

impl Related<super::current_price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CurrentPrice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The composite identity of a store product: unique per `(store_id,
/// code)`. Freshly-parsed rows (with no surrogate id yet) and persisted
/// rows both hash and compare equal by this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreProductKey {
    pub store_id: StoreId,
    pub code: i64,
}

impl StoreProductKey {
    pub fn new(store_id: StoreId, code: i64) -> Self {
        Self { store_id, code }
    }
}

impl From<&Model> for StoreProductKey {
    fn from(model: &Model) -> Self {
        StoreProductKey::new(model.store_id, model.code)
    }
}
