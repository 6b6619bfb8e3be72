//! Top-up (prepaid credit bundle) persistence

use sqlx::SqlitePool;

use crate::{Error, Result};

/// Destination top-up
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TopUp {
    pub id: i64,
    pub org_id: i64,
    pub price: Option<i64>,
    pub credits: i64,
    pub expires_on: String,
    pub is_active: bool,
    pub created_by: String,
}

/// Usage entry consumed from a top-up
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TopUpCredit {
    pub id: i64,
    pub topup_id: i64,
    pub used: i64,
    pub is_squashed: bool,
}

/// Fields for a new top-up
#[derive(Debug, Clone)]
pub struct NewTopUp {
    pub price: Option<i64>,
    pub credits: i64,
    pub expires_on: String,
}

const TOPUP_COLUMNS: &str = "id, org_id, price, credits, expires_on, is_active, created_by";

pub async fn create_topup(
    pool: &SqlitePool,
    org_id: i64,
    topup: &NewTopUp,
    created_by: &str,
) -> Result<TopUp> {
    let id = sqlx::query(
        "INSERT INTO topups (org_id, price, credits, expires_on, created_by) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(org_id)
    .bind(topup.price)
    .bind(topup.credits)
    .bind(&topup.expires_on)
    .bind(created_by)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_topup(pool, id, org_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("TopUp {} vanished after insert", id)))
}

pub async fn create_topup_credit(
    pool: &SqlitePool,
    topup_id: i64,
    used: i64,
    is_squashed: bool,
) -> Result<i64> {
    let id = sqlx::query("INSERT INTO topup_credits (topup_id, used, is_squashed) VALUES (?, ?, ?)")
        .bind(topup_id)
        .bind(used)
        .bind(is_squashed)
        .execute(pool)
        .await?
        .last_insert_rowid();

    Ok(id)
}

/// Deactivate every active top-up of the org, returning how many changed
pub async fn deactivate_active(pool: &SqlitePool, org_id: i64) -> Result<u64> {
    let result = sqlx::query("UPDATE topups SET is_active = 0 WHERE org_id = ? AND is_active = 1")
        .bind(org_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn get_topup(pool: &SqlitePool, id: i64, org_id: i64) -> Result<Option<TopUp>> {
    let topup = sqlx::query_as::<_, TopUp>(&format!(
        "SELECT {} FROM topups WHERE id = ? AND org_id = ?",
        TOPUP_COLUMNS
    ))
    .bind(id)
    .bind(org_id)
    .fetch_optional(pool)
    .await?;

    Ok(topup)
}

pub async fn list_active(pool: &SqlitePool, org_id: i64) -> Result<Vec<TopUp>> {
    let topups = sqlx::query_as::<_, TopUp>(&format!(
        "SELECT {} FROM topups WHERE org_id = ? AND is_active = 1 ORDER BY id",
        TOPUP_COLUMNS
    ))
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(topups)
}

pub async fn list_credits(pool: &SqlitePool, topup_id: i64) -> Result<Vec<TopUpCredit>> {
    let credits = sqlx::query_as::<_, TopUpCredit>(
        "SELECT id, topup_id, used, is_squashed FROM topup_credits WHERE topup_id = ? ORDER BY id",
    )
    .bind(topup_id)
    .fetch_all(pool)
    .await?;

    Ok(credits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory_database, orgs};

    fn new_topup(credits: i64) -> NewTopUp {
        NewTopUp {
            price: Some(credits * 2),
            credits,
            expires_on: "2030-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_deactivate_only_touches_one_org() {
        let pool = init_memory_database().await.unwrap();
        let org_a = orgs::create_org(&pool, "A").await.unwrap();
        let org_b = orgs::create_org(&pool, "B").await.unwrap();

        create_topup(&pool, org_a.id, &new_topup(100), "admin").await.unwrap();
        create_topup(&pool, org_a.id, &new_topup(50), "admin").await.unwrap();
        create_topup(&pool, org_b.id, &new_topup(10), "admin").await.unwrap();

        assert_eq!(deactivate_active(&pool, org_a.id).await.unwrap(), 2);
        assert!(list_active(&pool, org_a.id).await.unwrap().is_empty());
        assert_eq!(list_active(&pool, org_b.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_topup_is_org_scoped() {
        let pool = init_memory_database().await.unwrap();
        let org_a = orgs::create_org(&pool, "A").await.unwrap();
        let org_b = orgs::create_org(&pool, "B").await.unwrap();
        let topup = create_topup(&pool, org_a.id, &new_topup(100), "admin").await.unwrap();

        assert!(get_topup(&pool, topup.id, org_a.id).await.unwrap().is_some());
        assert!(get_topup(&pool, topup.id, org_b.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_credits_attach_to_topup() {
        let pool = init_memory_database().await.unwrap();
        let org = orgs::create_org(&pool, "A").await.unwrap();
        let topup = create_topup(&pool, org.id, &new_topup(100), "admin").await.unwrap();

        create_topup_credit(&pool, topup.id, 30, false).await.unwrap();
        create_topup_credit(&pool, topup.id, 5, true).await.unwrap();

        let credits = list_credits(&pool, topup.id).await.unwrap();
        assert_eq!(credits.iter().map(|c| c.used).sum::<i64>(), 35);
        assert!(credits[1].is_squashed);
    }
}
