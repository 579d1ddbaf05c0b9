//! A promotion published for one store. Promotions are stored but never
//! applied to pricing (see spec non-goals).

use crate::database::DbResult;
use chrono::NaiveDate;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ActiveValue::Set};
use serde::{Deserialize, Serialize};

pub type PromotionId = i64;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: PromotionId,
    pub store_id: super::store::StoreId,
    pub internal_promotion_code: i64,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Model {
    /// Upserts on `(store_id, internal_promotion_code)` (spec.md §4.7),
    /// returning the row's id either way so the caller can (re)insert
    /// its products/restrictions/price function underneath it.
    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        store_id: super::store::StoreId,
        internal_promotion_code: i64,
        description: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> DbResult<Self> {
        Entity::insert(ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            store_id: Set(store_id),
            internal_promotion_code: Set(internal_promotion_code),
            description: Set(description),
            start_date: Set(start_date),
            end_date: Set(end_date),
        })
        .on_conflict(
            OnConflict::columns([Column::StoreId, Column::InternalPromotionCode])
                .update_columns([Column::Description, Column::StartDate, Column::EndDate])
                .to_owned(),
        )
        .exec_with_returning(db)
        .await
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
    #[sea_orm(has_many = "super::promotion_product::Entity")]
    PromotionProduct,
    #[sea_orm(has_many = "super::restriction::Entity")]
    Restriction,
    #[sea_orm(has_one = "super::price_function::Entity")]
    PriceFunction,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::promotion_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromotionProduct.def()
    }
}

impl Related<super::restriction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restriction.def()
    }
}

impl Related<super::price_function::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceFunction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
