//! PostgreSQL-backed invitation store.

use chrono::{DateTime, Utc};
use domain::models::{Invitation, InvitationStatus, Transition};
use domain::services::{ConditionalUpdate, InvitationStore, StoreError};
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::entities::InvitationEntity;
use crate::metrics::{record_query_failure, QueryTimer};

const COLUMNS: &str = "company_id, invitation_token, email, role, status, invited_by, invited_at, \
     accepted_by, accepted_at, cancelled_by, cancelled_at, expired_by, expired_at, updated_at";

/// Invitation store over the `invitations` table.
#[derive(Clone)]
pub struct PgInvitationStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgInvitationStore {
    /// Creates a store whose queries give up after `query_timeout`.
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Runs one query with the configured timeout and records its duration.
    async fn run<T, F>(&self, query_name: &'static str, query: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let timer = QueryTimer::new(query_name);
        let result = tokio::time::timeout(self.query_timeout, query).await;
        timer.record();

        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                let err = map_sqlx_error(err);
                record_query_failure(query_name, failure_class(&err));
                Err(err)
            }
            Err(_) => {
                record_query_failure(query_name, "timeout");
                Err(StoreError::Unavailable(format!(
                    "{} timed out after {}ms",
                    query_name,
                    self.query_timeout.as_millis()
                )))
            }
        }
    }
}

fn update_statement(transition: &Transition) -> String {
    let (by_column, at_column) = match transition {
        Transition::Accept { .. } => ("accepted_by", "accepted_at"),
        Transition::Cancel { .. } => ("cancelled_by", "cancelled_at"),
        Transition::Expire { .. } => ("expired_by", "expired_at"),
    };

    format!(
        "UPDATE invitations \
         SET status = $6, {by} = $3, {at} = $4, updated_at = $4 \
         WHERE company_id = $1 AND invitation_token = $2 AND status = $5 \
         RETURNING {columns}",
        by = by_column,
        at = at_column,
        columns = COLUMNS,
    )
}

/// SQLSTATEs meaning the server dropped or refused the connection: class 08
/// (connection exception) and 57P01..57P03 (shutdown, crash, cannot connect now).
fn is_connection_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        sqlx::Error::Database(db_err)
            if db_err.code().is_some_and(|code| is_connection_sqlstate(&code)) =>
        {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

fn failure_class(err: &StoreError) -> &'static str {
    match err {
        StoreError::Unavailable(_) => "unavailable",
        StoreError::Backend(_) => "backend",
        StoreError::Corrupt { .. } => "corrupt",
    }
}

fn to_domain(entity: InvitationEntity) -> Result<Invitation, StoreError> {
    Invitation::try_from(entity).map_err(|invalid| {
        warn!(key = %invalid.key, reason = %invalid.reason, "Corrupt invitation row");
        StoreError::Corrupt {
            key: invalid.key,
            reason: invalid.reason,
        }
    })
}

#[async_trait::async_trait]
impl InvitationStore for PgInvitationStore {
    async fn get(
        &self,
        company_id: Uuid,
        invitation_token: &str,
    ) -> Result<Option<Invitation>, StoreError> {
        let sql = format!(
            "SELECT {} FROM invitations WHERE company_id = $1 AND invitation_token = $2",
            COLUMNS
        );

        let row = self
            .run(
                "invitation_get",
                sqlx::query_as::<_, InvitationEntity>(&sql)
                    .bind(company_id)
                    .bind(invitation_token)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(to_domain).transpose()
    }

    async fn conditional_update(
        &self,
        company_id: Uuid,
        invitation_token: &str,
        expected: InvitationStatus,
        transition: Transition,
    ) -> Result<ConditionalUpdate, StoreError> {
        let sql = update_statement(&transition);

        let row = self
            .run(
                "invitation_conditional_update",
                sqlx::query_as::<_, InvitationEntity>(&sql)
                    .bind(company_id)
                    .bind(invitation_token)
                    .bind(transition.actor())
                    .bind(transition.at())
                    .bind(expected.as_str())
                    .bind(transition.target().as_str())
                    .fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some(entity) => Ok(ConditionalUpdate::Applied(to_domain(entity)?)),
            None => Ok(ConditionalUpdate::PreconditionFailed),
        }
    }

    async fn list_lapsed_pending(
        &self,
        invited_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Invitation>, StoreError> {
        let sql = format!(
            "SELECT {} FROM invitations \
             WHERE status = 'PENDING' AND invited_at < $1 \
             ORDER BY invited_at ASC \
             LIMIT $2",
            COLUMNS
        );

        let rows = self
            .run(
                "invitation_list_lapsed_pending",
                sqlx::query_as::<_, InvitationEntity>(&sql)
                    .bind(invited_before)
                    .bind(limit)
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.into_iter().map(to_domain).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.run(
            "invitation_store_ping",
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await
        .map(|_| ())
    }
}
