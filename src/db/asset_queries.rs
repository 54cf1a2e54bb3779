use sqlx::{SqliteConnection, SqlitePool};
use crate::models::{Asset, NewAsset};

pub async fn fetch_all(pool: &SqlitePool) -> Result<Vec<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(
        "SELECT id, name, symbol, external_id, icon_url
         FROM assets
         ORDER BY id ASC",
    )
        .fetch_all(pool)
        .await
}

pub async fn fetch_one(pool: &SqlitePool, id: i64) -> Result<Option<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(
        "SELECT id, name, symbol, external_id, icon_url
         FROM assets
         WHERE id = ?",
    )
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assets")
        .fetch_one(pool)
        .await
}

pub async fn exists_by_external_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM assets WHERE external_id = ?)",
    )
        .bind(external_id)
        .fetch_one(conn)
        .await?;
    Ok(found != 0)
}

/// Inserts the asset unless its external id is already tracked.
/// Returns the new row id, or `None` when the insert was ignored.
pub async fn insert(
    conn: &mut SqliteConnection,
    asset: &NewAsset,
) -> Result<Option<i64>, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO assets (name, symbol, external_id, icon_url)
         VALUES (?, ?, ?, ?)
         ON CONFLICT (external_id) DO NOTHING",
    )
        .bind(&asset.name)
        .bind(&asset.symbol)
        .bind(&asset.external_id)
        .bind(&asset.icon_url)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(result.last_insert_rowid()))
}

/// Sets the icon only when the asset has none yet.
pub async fn backfill_icon(
    conn: &mut SqliteConnection,
    id: i64,
    icon_url: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE assets SET icon_url = ?
         WHERE id = ? AND (icon_url IS NULL OR icon_url = '')",
    )
        .bind(icon_url)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn new_asset(external_id: &str, icon_url: Option<&str>) -> NewAsset {
        NewAsset {
            name: external_id.to_uppercase(),
            symbol: external_id[..3].to_string(),
            external_id: external_id.to_string(),
            icon_url: icon_url.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_insert_ignores_duplicate_external_id() {
        let pool = db::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let first = insert(&mut conn, &new_asset("bitcoin", None)).await.unwrap();
        let second = insert(&mut conn, &new_asset("bitcoin", None)).await.unwrap();
        drop(conn);

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_exists_by_external_id() {
        let pool = db::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        assert!(!exists_by_external_id(&mut conn, "ethereum").await.unwrap());
        insert(&mut conn, &new_asset("ethereum", None)).await.unwrap();
        assert!(exists_by_external_id(&mut conn, "ethereum").await.unwrap());
    }

    #[tokio::test]
    async fn test_backfill_icon_only_fills_missing() {
        let pool = db::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let bare = insert(&mut conn, &new_asset("solana", None)).await.unwrap().unwrap();
        let iconed = insert(&mut conn, &new_asset("cardano", Some("https://img/ada.png")))
            .await
            .unwrap()
            .unwrap();

        assert!(backfill_icon(&mut conn, bare, "https://img/sol.png").await.unwrap());
        assert!(!backfill_icon(&mut conn, iconed, "https://img/other.png").await.unwrap());
        drop(conn);

        let assets = fetch_all(&pool).await.unwrap();
        assert_eq!(assets[0].icon_url.as_deref(), Some("https://img/sol.png"));
        assert_eq!(assets[1].icon_url.as_deref(), Some("https://img/ada.png"));
    }

    #[tokio::test]
    async fn test_fetch_one_by_id() {
        let pool = db::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let id = insert(&mut conn, &new_asset("bitcoin", None)).await.unwrap().unwrap();
        drop(conn);

        let asset = fetch_one(&pool, id).await.unwrap().unwrap();
        assert_eq!(asset.external_id, "bitcoin");
        assert!(fetch_one(&pool, id + 1).await.unwrap().is_none());
    }
}
