//! An append-only interval of a store product's effective price.
//!
//! For any store product the set of intervals is pairwise non-overlapping
//! and at most one has `end_date = NULL` (the currently-effective price).

use crate::database::{entity::store::StoreId, DbResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};

pub type PriceHistoryId = i64;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: PriceHistoryId,
    pub store_product_id: super::store_product::StoreProductId,
    pub start_date: NaiveDate,
    /// `None` means this interval is still in effect.
    pub end_date: Option<NaiveDate>,
    pub price: Decimal,
}

impl Model {
    /// Every currently-open interval (`end_date IS NULL`) for `store_id`,
    /// joined through `store_products` since history rows don't carry a
    /// store id directly.
    pub async fn open_for_store<C: ConnectionTrait>(db: &C, store_id: StoreId) -> DbResult<Vec<Self>> {
        Entity::find()
            .inner_join(super::store_product::Entity)
            .filter(super::store_product::Column::StoreId.eq(store_id))
            .filter(Column::EndDate.is_null())
            .all(db)
            .await
    }

    pub async fn insert_new<C: ConnectionTrait>(
        db: &C,
        store_product_id: super::store_product::StoreProductId,
        start_date: NaiveDate,
        price: Decimal,
    ) -> DbResult<Self> {
        let active = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            store_product_id: Set(store_product_id),
            start_date: Set(start_date),
            end_date: sea_orm::ActiveValue::NotSet,
            price: Set(price),
        };
        active.insert(db).await
    }

    /// Closes an open interval as of `end_date` (spec.md §4.6.2: store
    /// disappearance and price changes both close at `D - 1`).
    pub async fn close<C: ConnectionTrait>(
        db: &C,
        id: PriceHistoryId,
        end_date: NaiveDate,
    ) -> DbResult<()> {
        let active = ActiveModel {
            id: Set(id),
            end_date: Set(Some(end_date)),
            ..Default::default()
        };
        Entity::update(active).exec(db).await?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store_product::Entity",
        from = "Column::StoreProductId",
        to = "super::store_product::Column::Id"
    )]
    StoreProduct,
}

impl Related<super::store_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StoreProduct.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
