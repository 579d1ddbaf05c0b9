//! The discount a promotion applies: either a percentage off or a fixed
//! total price. 1:1 with [super::promotion]. Never evaluated against a
//! cart — promotions are stored, not priced (see spec non-goals).

use crate::database::DbResult;
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ActiveValue::Set};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum PriceFunctionKind {
    #[sea_orm(num_value = 0)]
    Percentage = 0,
    #[sea_orm(num_value = 1)]
    TotalPrice = 1,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_functions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub promotion_id: super::promotion::PromotionId,
    pub kind: PriceFunctionKind,
    pub value: Decimal,
}

impl Model {
    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        promotion_id: super::promotion::PromotionId,
        kind: PriceFunctionKind,
        value: Decimal,
    ) -> DbResult<()> {
        Entity::insert(ActiveModel {
            promotion_id: Set(promotion_id),
            kind: Set(kind),
            value: Set(value),
        })
        .on_conflict(
            OnConflict::column(Column::PromotionId)
                .update_columns([Column::Kind, Column::Value])
                .to_owned(),
        )
        .exec(db)
        .await?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::promotion::Entity",
        from = "Column::PromotionId",
        to = "super::promotion::Column::Id"
    )]
    Promotion,
}

impl Related<super::promotion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Promotion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
