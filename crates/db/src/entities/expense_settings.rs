//! `SeaORM` Entity for the expense_settings table (per-hub singleton).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub hub_id: Uuid,
    pub require_approval: bool,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub approval_threshold: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub default_tax_rate: Decimal,
    pub default_currency: String,
    pub auto_numbering: bool,
    pub number_prefix: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
