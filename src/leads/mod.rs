//! Lead persistence
//!
//! A submitted lead becomes a `users` row plus an `investment_profiles` row.
//! Postgres when a database URL is configured, in-memory otherwise.

use crate::error::BeaconError;
use crate::models::{LeadProfile, LeadReceipt};
use crate::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};

/// Trait for lead persistence
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn save_lead(&self, lead: &LeadProfile) -> Result<LeadReceipt>;
    fn backend_name(&self) -> &'static str;
}

/// List columns are stored as comma-delimited text.
pub fn join_list(values: &[String]) -> String {
    values.join(",")
}

fn budget_column(value: Option<u64>) -> Result<Option<i64>> {
    value
        .map(|v| {
            i64::try_from(v).map_err(|_| {
                BeaconError::ValidationError(format!("budget {} is out of range", v))
            })
        })
        .transpose()
}

//
// ================= In-memory =================
//

/// In-memory lead store for development and tests
pub struct InMemoryLeadStore {
    leads: Arc<RwLock<Vec<(LeadReceipt, LeadProfile)>>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self {
            leads: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn leads(&self) -> Vec<(LeadReceipt, LeadProfile)> {
        self.leads.read().await.clone()
    }
}

impl Default for InMemoryLeadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn save_lead(&self, lead: &LeadProfile) -> Result<LeadReceipt> {
        budget_column(lead.min_budget)?;
        budget_column(lead.max_budget)?;

        let mut leads = self.leads.write().await;
        let next_id = leads.len() as i64 + 1;
        let receipt = LeadReceipt {
            user_id: next_id,
            profile_id: next_id,
        };
        leads.push((receipt, lead.clone()));
        Ok(receipt)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

//
// ================= Postgres =================
//

pub struct PostgresLeadStore {
    pool: PgPool,
    schema_ready: OnceCell<()>,
}

impl PostgresLeadStore {
    /// Pool connects on first use, so startup does not wait on the database.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)
            .map_err(|e| BeaconError::DatabaseError(format!("Invalid database URL: {}", e)))?;

        Ok(Self {
            pool,
            schema_ready: OnceCell::new(),
        })
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS users (
                      id BIGSERIAL PRIMARY KEY,
                      name TEXT,
                      email TEXT NOT NULL,
                      newsletter_subscribed BOOLEAN NOT NULL DEFAULT TRUE,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS investment_profiles (
                      id BIGSERIAL PRIMARY KEY,
                      user_id BIGINT NOT NULL REFERENCES users(id),
                      investment_strategy TEXT,
                      boroughs TEXT NOT NULL DEFAULT '',
                      neighborhoods TEXT NOT NULL DEFAULT '',
                      property_types TEXT NOT NULL DEFAULT '',
                      min_budget BIGINT,
                      max_budget BIGINT,
                      risk_tolerance TEXT,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                BeaconError::DatabaseError(format!("Failed to initialize lead schema: {}", e))
            })?;

        Ok(())
    }
}

#[async_trait]
impl LeadStore for PostgresLeadStore {
    async fn save_lead(&self, lead: &LeadProfile) -> Result<LeadReceipt> {
        let min_budget = budget_column(lead.min_budget)?;
        let max_budget = budget_column(lead.max_budget)?;

        self.ensure_schema().await?;

        let db_error =
            |context: &str, e: sqlx::Error| BeaconError::DatabaseError(format!("{}: {}", context, e));

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin lead transaction", e))?;

        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (name, email, newsletter_subscribed) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(lead.newsletter_subscribed)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to insert user", e))?;

        let profile_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO investment_profiles
              (user_id, investment_strategy, boroughs, neighborhoods,
               property_types, min_budget, max_budget, risk_tolerance)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(lead.investment_strategy.map(|s| s.as_str()))
        .bind(join_list(&lead.boroughs))
        .bind(join_list(&lead.neighborhoods))
        .bind(join_list(&lead.property_types))
        .bind(min_budget)
        .bind(max_budget)
        .bind(lead.risk_tolerance.map(|r| r.as_str()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to insert investment profile", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit lead transaction", e))?;

        Ok(LeadReceipt { user_id, profile_id })
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Postgres when a URL is configured and valid, in-memory otherwise.
pub fn build_lead_store(database_url: Option<&str>) -> Arc<dyn LeadStore> {
    if let Some(url) = database_url {
        match PostgresLeadStore::connect_lazy(url) {
            Ok(store) => {
                info!("Lead store backend: postgres");
                return Arc::new(store);
            }
            Err(error) => {
                warn!(
                    "Failed to initialize postgres lead store, falling back to in-memory: {}",
                    error
                );
            }
        }
    }

    info!("Lead store backend: in-memory");
    Arc::new(InMemoryLeadStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvestmentStrategy, RiskTolerance};
    use tokio_test::assert_ok;

    fn lead(email: &str) -> LeadProfile {
        LeadProfile {
            name: Some("Sam".to_string()),
            email: email.to_string(),
            newsletter_subscribed: true,
            investment_strategy: Some(InvestmentStrategy::Cashflow),
            boroughs: vec!["Queens".to_string(), "Bronx".to_string()],
            neighborhoods: vec![],
            property_types: vec!["Multi-family".to_string()],
            min_budget: Some(500_000),
            max_budget: Some(1_500_000),
            risk_tolerance: Some(RiskTolerance::Medium),
        }
    }

    #[tokio::test]
    async fn test_in_memory_ids_increase() {
        let store = InMemoryLeadStore::new();

        let first = assert_ok!(store.save_lead(&lead("a@example.com")).await);
        let second = assert_ok!(store.save_lead(&lead("b@example.com")).await);

        assert_eq!(first, LeadReceipt { user_id: 1, profile_id: 1 });
        assert_eq!(second, LeadReceipt { user_id: 2, profile_id: 2 });
        let saved = store.leads().await;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].1.email, "b@example.com");
    }

    #[tokio::test]
    async fn test_out_of_range_budget_rejected() {
        let store = InMemoryLeadStore::new();
        let mut profile = lead("a@example.com");
        profile.max_budget = Some(u64::MAX);

        let err = store.save_lead(&profile).await.unwrap_err();
        assert!(err.is_client_error());
        assert!(store.leads().await.is_empty());
    }

    #[test]
    fn test_list_columns() {
        let values = vec!["Queens".to_string(), "Staten Island".to_string()];
        let joined = join_list(&values);
        assert_eq!(joined, "Queens,Staten Island");
        assert_eq!(join_list(&[]), "");
    }

    #[tokio::test]
    async fn test_build_lead_store_defaults_to_memory() {
        assert_eq!(build_lead_store(None).backend_name(), "in-memory");
        assert_eq!(build_lead_store(Some("not a url")).backend_name(), "in-memory");
    }
}
