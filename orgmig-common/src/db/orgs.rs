//! Organization persistence

use serde_json::Value;
use sqlx::SqlitePool;

use crate::{Error, Result};

/// Destination organization
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Org {
    pub id: i64,
    pub name: String,
    pub plan: String,
    pub plan_start: Option<String>,
    pub stripe_customer: Option<String>,
    pub language: Option<String>,
    pub timezone: String,
    pub date_format: String,
    pub config: String,
    pub is_anon: bool,
    pub surveyor_password: Option<String>,
    pub parent_id: Option<i64>,
    pub primary_language_id: Option<i64>,
}

impl Org {
    /// Parsed configuration blob
    pub fn config_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.config)?)
    }
}

/// Scalar organization attributes copied from the source system
#[derive(Debug, Clone, PartialEq)]
pub struct OrgSettings {
    pub plan: String,
    pub plan_start: Option<String>,
    pub stripe_customer: Option<String>,
    pub language: Option<String>,
    pub timezone: String,
    pub date_format: String,
    pub config: Value,
    pub is_anon: bool,
    pub surveyor_password: Option<String>,
    pub parent_id: Option<i64>,
}

const ORG_COLUMNS: &str = "id, name, plan, plan_start, stripe_customer, language, timezone, \
     date_format, config, is_anon, surveyor_password, parent_id, primary_language_id";

pub async fn create_org(pool: &SqlitePool, name: &str) -> Result<Org> {
    let id = sqlx::query("INSERT INTO orgs (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?
        .last_insert_rowid();

    get_org(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Org {} vanished after insert", id)))
}

pub async fn get_org(pool: &SqlitePool, id: i64) -> Result<Option<Org>> {
    let org = sqlx::query_as::<_, Org>(&format!("SELECT {} FROM orgs WHERE id = ?", ORG_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(org)
}

/// Overwrite every scalar attribute in one statement
pub async fn update_settings(pool: &SqlitePool, org_id: i64, settings: &OrgSettings) -> Result<()> {
    let config = serde_json::to_string(&settings.config)?;

    let result = sqlx::query(
        r#"
        UPDATE orgs SET
            plan = ?,
            plan_start = ?,
            stripe_customer = ?,
            language = ?,
            timezone = ?,
            date_format = ?,
            config = ?,
            is_anon = ?,
            surveyor_password = ?,
            parent_id = ?,
            modified_on = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&settings.plan)
    .bind(&settings.plan_start)
    .bind(&settings.stripe_customer)
    .bind(&settings.language)
    .bind(&settings.timezone)
    .bind(&settings.date_format)
    .bind(config)
    .bind(settings.is_anon)
    .bind(&settings.surveyor_password)
    .bind(settings.parent_id)
    .bind(org_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("org {}", org_id)));
    }

    Ok(())
}

pub async fn set_primary_language(
    pool: &SqlitePool,
    org_id: i64,
    language_id: Option<i64>,
) -> Result<()> {
    sqlx::query(
        "UPDATE orgs SET primary_language_id = ?, modified_on = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(language_id)
    .bind(org_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_settings_round_trip() {
        let pool = init_memory_database().await.unwrap();
        let org = create_org(&pool, "Nyaruka").await.unwrap();
        assert_eq!(org.config_json().unwrap(), json!({}));

        let settings = OrgSettings {
            plan: "topups".to_string(),
            plan_start: Some("2020-01-01T00:00:00+00:00".to_string()),
            stripe_customer: None,
            language: Some("en-us".to_string()),
            timezone: "Africa/Kigali".to_string(),
            date_format: "D".to_string(),
            config: json!({"SMTP_SERVER": "smtp://example"}),
            is_anon: true,
            surveyor_password: Some("pw".to_string()),
            parent_id: Some(12),
        };
        update_settings(&pool, org.id, &settings).await.unwrap();

        let org = get_org(&pool, org.id).await.unwrap().unwrap();
        assert_eq!(org.timezone, "Africa/Kigali");
        assert!(org.is_anon);
        assert_eq!(org.parent_id, Some(12));
        assert_eq!(org.config_json().unwrap()["SMTP_SERVER"], "smtp://example");
    }

    #[tokio::test]
    async fn test_update_missing_org_is_not_found() {
        let pool = init_memory_database().await.unwrap();
        let settings = OrgSettings {
            plan: String::new(),
            plan_start: None,
            stripe_customer: None,
            language: None,
            timezone: "UTC".to_string(),
            date_format: "D".to_string(),
            config: json!({}),
            is_anon: false,
            surveyor_password: None,
            parent_id: None,
        };

        let err = update_settings(&pool, 999, &settings).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
