use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDate;
use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;

// A tracked cryptocurrency. `external_id` is the upstream provider's coin id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub external_id: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    pub name: String,
    pub symbol: String,
    pub external_id: String,
    pub icon_url: Option<String>,
}

/// One row of `GET /api/crypto/latest-prices`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestPrice {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub icon_url: Option<String>,
    #[serde(serialize_with = "decimal_as_number")]
    #[schema(value_type = f64)]
    pub current_price: BigDecimal,
    #[serde(serialize_with = "decimal_as_number")]
    #[schema(value_type = f64)]
    pub previous_price: BigDecimal,
    pub last_updated: NaiveDate,
}

/// Reported as `lastUpdated` for assets without any history.
pub fn no_history_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or_default()
}

impl LatestPrice {
    /// Builds the row from an asset and its newest history prices, newest first.
    pub fn from_history(asset: Asset, newest_first: &[(BigDecimal, NaiveDate)]) -> Self {
        let current = newest_first.first();
        let previous = newest_first.get(1);

        Self {
            id: asset.id,
            name: asset.name,
            symbol: asset.symbol,
            icon_url: asset.icon_url,
            current_price: current.map(|(p, _)| p.clone()).unwrap_or_default(),
            previous_price: previous.map(|(p, _)| p.clone()).unwrap_or_default(),
            last_updated: current.map(|(_, d)| *d).unwrap_or_else(no_history_date),
        }
    }
}

/// Prices go out as JSON numbers. A value with no finite `f64` form is an error,
/// never a silent zero.
pub(crate) fn decimal_as_number<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    let number = value
        .to_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| S::Error::custom(format!("price {} has no finite f64 form", value)))?;
    serializer.serialize_f64(number)
}
