//! A canonical, cross-store product identified by a global barcode.

use crate::{database::DbResult, extract::unit::Unit};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type ItemId = i64;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: ItemId,
    /// Global barcode, at least 13 digits.
    #[sea_orm(unique)]
    pub code: i64,
    pub quantity: Decimal,
    pub unit: Unit,
    pub name: String,
}

impl Model {
    /// Every barcode already present in the catalog, used to avoid
    /// re-inserting an `Item` for a code that already has one
    /// (spec.md §4.6.2 stage 1).
    pub async fn all_codes<C: ConnectionTrait>(db: &C) -> DbResult<HashSet<i64>> {
        Ok(Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|i| i.code)
            .collect())
    }

    pub async fn find_by_code<C: ConnectionTrait>(db: &C, code: i64) -> DbResult<Option<Self>> {
        Entity::find().filter(Column::Code.eq(code)).one(db).await
    }

    pub async fn insert_new<C: ConnectionTrait>(
        db: &C,
        code: i64,
        quantity: Decimal,
        unit: Unit,
        name: String,
    ) -> DbResult<Self> {
        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            code: Set(code),
            quantity: Set(quantity),
            unit: Set(unit),
            name: Set(name),
        };
        active.insert(db).await
    }

    /// Maps every `code -> id`, used by the cross-snapshot linking pass
    /// to resolve external `StoreProduct`s without one query per row.
    pub async fn code_to_id_map<C: ConnectionTrait>(
        db: &C,
    ) -> DbResult<std::collections::HashMap<i64, ItemId>> {
        Ok(Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|i| (i.code, i.id))
            .collect())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::store_product::Entity")]
    StoreProduct,
}

impl Related<super::store_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StoreProduct.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
