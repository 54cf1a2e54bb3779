use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;

use super::asset::decimal_as_number;

// A single daily observation. At most one per (asset_id, date).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryPoint {
    pub id: i64,
    pub asset_id: i64,
    #[serde(serialize_with = "decimal_as_number")]
    #[schema(value_type = f64)]
    pub price: BigDecimal,
    pub date: NaiveDate,
}

// Prices are stored as TEXT so no precision is lost in SQLite.
#[derive(Debug, FromRow)]
pub(crate) struct PriceHistoryRow {
    pub id: i64,
    pub asset_id: i64,
    pub price: String,
    pub date: NaiveDate,
}

impl TryFrom<PriceHistoryRow> for PriceHistoryPoint {
    type Error = sqlx::Error;

    fn try_from(row: PriceHistoryRow) -> Result<Self, Self::Error> {
        let price = BigDecimal::from_str(&row.price)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Self {
            id: row.id,
            asset_id: row.asset_id,
            price,
            date: row.date,
        })
    }
}
