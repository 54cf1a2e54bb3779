use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::error;

use crate::models::{PriceHistoryPoint, PriceHistoryRow};

pub async fn exists_for_date(
    conn: &mut SqliteConnection,
    asset_id: i64,
    date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM price_history WHERE asset_id = ? AND date = ?)",
    )
    .bind(asset_id)
    .bind(date)
    .fetch_one(conn)
    .await?;
    Ok(found != 0)
}

/// Writes the day's point unless one already exists. Returns whether a row was written.
pub async fn insert_if_absent(
    conn: &mut SqliteConnection,
    asset_id: i64,
    price: &BigDecimal,
    date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO price_history (asset_id, price, date)
        VALUES (?, ?, ?)
        ON CONFLICT (asset_id, date) DO NOTHING
        "#,
    )
    .bind(asset_id)
    .bind(price.to_string())
    .bind(date)
    .execute(conn)
    .await
    .map_err(|e| {
        error!("Failed to insert price for asset {} on {}: {}", asset_id, date, e);
        e
    })?;
    Ok(result.rows_affected() > 0)
}

/// Full history of one asset, newest first.
pub async fn fetch_for_asset(
    pool: &SqlitePool,
    asset_id: i64,
) -> Result<Vec<PriceHistoryPoint>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PriceHistoryRow>(
        r#"
        SELECT id, asset_id, price, date
        FROM price_history
        WHERE asset_id = ?
        ORDER BY date DESC
        "#,
    )
    .bind(asset_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PriceHistoryPoint::try_from).collect()
}

/// The two newest (price, date) pairs of every asset that has history,
/// keyed by asset id and ordered newest first.
pub async fn fetch_latest_two_batch(
    pool: &SqlitePool,
) -> Result<HashMap<i64, Vec<(BigDecimal, NaiveDate)>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String, NaiveDate)>(
        r#"
        SELECT asset_id, price, date
        FROM (
            SELECT asset_id, price, date,
                   ROW_NUMBER() OVER (PARTITION BY asset_id ORDER BY date DESC, id DESC) AS rn
            FROM price_history
        )
        WHERE rn <= 2
        ORDER BY asset_id, date DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut result: HashMap<i64, Vec<(BigDecimal, NaiveDate)>> = HashMap::new();
    for (asset_id, price, date) in rows {
        let price = BigDecimal::from_str(&price).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        result.entry(asset_id).or_default().push((price, date));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, asset_queries};
    use crate::models::NewAsset;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    async fn seeded_pool() -> (SqlitePool, i64) {
        let pool = db::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let id = asset_queries::insert(
            &mut conn,
            &NewAsset {
                name: "Bitcoin".into(),
                symbol: "btc".into(),
                external_id: "bitcoin".into(),
                icon_url: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
        drop(conn);
        (pool, id)
    }

    #[tokio::test]
    async fn test_second_insert_for_same_day_is_ignored() {
        let (pool, asset_id) = seeded_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        assert!(insert_if_absent(&mut conn, asset_id, &BigDecimal::from(100), day(1)).await.unwrap());
        assert!(!insert_if_absent(&mut conn, asset_id, &BigDecimal::from(105), day(1)).await.unwrap());
        assert!(exists_for_date(&mut conn, asset_id, day(1)).await.unwrap());
        assert!(!exists_for_date(&mut conn, asset_id, day(2)).await.unwrap());
        drop(conn);

        let history = fetch_for_asset(&pool, asset_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, BigDecimal::from(100));
    }

    #[tokio::test]
    async fn test_latest_two_ignores_older_points() {
        let (pool, asset_id) = seeded_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        for (d, price) in [(1, 90), (3, 120), (2, 100)] {
            insert_if_absent(&mut conn, asset_id, &BigDecimal::from(price), day(d)).await.unwrap();
        }
        drop(conn);

        let latest = fetch_latest_two_batch(&pool).await.unwrap();
        let points = latest.get(&asset_id).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0], (BigDecimal::from(120), day(3)));
        assert_eq!(points[1], (BigDecimal::from(100), day(2)));
    }
}
