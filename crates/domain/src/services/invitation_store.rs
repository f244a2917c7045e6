//! Invitation store contract.
//!
//! The store is a keyed record service addressed by `(company_id,
//! invitation_token)`. Every write is conditional on the stored status so
//! that two concurrent transitions on one record cannot both succeed.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Invitation, InvitationStatus, Transition};

/// Errors reported by an invitation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or did not answer in time.
    #[error("Invitation store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an error.
    #[error("Invitation store failure: {0}")]
    Backend(String),

    /// A stored record could not be mapped to an invitation.
    #[error("Corrupt invitation record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Outcome of a conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalUpdate {
    /// The precondition held and the returned record is the stored result.
    Applied(Invitation),
    /// The stored status no longer matched the expected status.
    PreconditionFailed,
}

/// Keyed record store for invitations.
#[async_trait::async_trait]
pub trait InvitationStore: Send + Sync {
    /// Fetch an invitation by key.
    async fn get(
        &self,
        company_id: Uuid,
        invitation_token: &str,
    ) -> Result<Option<Invitation>, StoreError>;

    /// Apply `transition` only if the stored status still equals `expected`.
    async fn conditional_update(
        &self,
        company_id: Uuid,
        invitation_token: &str,
        expected: InvitationStatus,
        transition: Transition,
    ) -> Result<ConditionalUpdate, StoreError>;

    /// Stored `PENDING` invitations created before `invited_before`, oldest first.
    async fn list_lapsed_pending(
        &self,
        invited_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Invitation>, StoreError>;

    /// Cheap connectivity check used by health probes.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// In-memory invitation store for development and testing.
///
/// Conditional updates are serialized by a single lock, which gives the same
/// per-key ordering guarantee a real store provides.
#[derive(Debug, Default)]
pub struct InMemoryInvitationStore {
    records: Mutex<HashMap<(Uuid, String), Invitation>>,
    reads: AtomicUsize,
    mutations: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryInvitationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, as the invite operation would.
    pub fn insert(&self, invitation: Invitation) {
        let key = (invitation.company_id, invitation.invitation_token.clone());
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, invitation);
    }

    /// Number of `get`/`list` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful conditional updates so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl InvitationStore for InMemoryInvitationStore {
    async fn get(
        &self,
        company_id: Uuid,
        invitation_token: &str,
    ) -> Result<Option<Invitation>, StoreError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        let records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(records
            .get(&(company_id, invitation_token.to_string()))
            .cloned())
    }

    async fn conditional_update(
        &self,
        company_id: Uuid,
        invitation_token: &str,
        expected: InvitationStatus,
        transition: Transition,
    ) -> Result<ConditionalUpdate, StoreError> {
        self.check_available()?;

        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match records.get_mut(&(company_id, invitation_token.to_string())) {
            Some(record) if record.status == expected => {
                record.apply(&transition);
                self.mutations.fetch_add(1, Ordering::SeqCst);
                Ok(ConditionalUpdate::Applied(record.clone()))
            }
            _ => Ok(ConditionalUpdate::PreconditionFailed),
        }
    }

    async fn list_lapsed_pending(
        &self,
        invited_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Invitation>, StoreError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        let records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut lapsed: Vec<Invitation> = records
            .values()
            .filter(|i| i.status == InvitationStatus::Pending && i.invited_at < invited_before)
            .cloned()
            .collect();
        lapsed.sort_by_key(|i| i.invited_at);
        lapsed.truncate(limit.max(0) as usize);

        Ok(lapsed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::Duration;

    fn pending(company_id: Uuid, token: &str, invited_at: DateTime<Utc>) -> Invitation {
        Invitation::pending(
            company_id,
            token,
            "invitee@example.com",
            UserRole::Member,
            Uuid::new_v4(),
            invited_at,
        )
    }

    #[tokio::test]
    async fn test_get_missing_record() {
        let store = InMemoryInvitationStore::new();
        let result = store.get(Uuid::new_v4(), "nope").await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn test_records_are_scoped_by_company() {
        let store = InMemoryInvitationStore::new();
        let company_id = Uuid::new_v4();
        store.insert(pending(company_id, "tok", Utc::now()));

        assert!(store.get(company_id, "tok").await.unwrap().is_some());
        assert!(store.get(Uuid::new_v4(), "tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conditional_update_applies_when_status_matches() {
        let store = InMemoryInvitationStore::new();
        let company_id = Uuid::new_v4();
        store.insert(pending(company_id, "tok", Utc::now()));

        let actor = Uuid::new_v4();
        let outcome = store
            .conditional_update(
                company_id,
                "tok",
                InvitationStatus::Pending,
                Transition::Cancel {
                    by: actor,
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();

        match outcome {
            ConditionalUpdate::Applied(record) => {
                assert_eq!(record.status, InvitationStatus::Cancelled);
                assert_eq!(record.cancelled_by, Some(actor));
            }
            ConditionalUpdate::PreconditionFailed => panic!("Expected update to apply"),
        }
        assert_eq!(store.mutation_count(), 1);
    }

    #[tokio::test]
    async fn test_conditional_update_rejects_stale_expectation() {
        let store = InMemoryInvitationStore::new();
        let company_id = Uuid::new_v4();
        store.insert(pending(company_id, "tok", Utc::now()));

        let cancel = Transition::Cancel {
            by: Uuid::new_v4(),
            at: Utc::now(),
        };
        store
            .conditional_update(company_id, "tok", InvitationStatus::Pending, cancel)
            .await
            .unwrap();

        let second = store
            .conditional_update(
                company_id,
                "tok",
                InvitationStatus::Pending,
                Transition::Accept {
                    by: Uuid::new_v4(),
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();

        assert_eq!(second, ConditionalUpdate::PreconditionFailed);
        assert_eq!(store.mutation_count(), 1);
        let stored = store.get(company_id, "tok").await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_conditional_update_missing_record() {
        let store = InMemoryInvitationStore::new();
        let outcome = store
            .conditional_update(
                Uuid::new_v4(),
                "missing",
                InvitationStatus::Pending,
                Transition::Expire { at: Utc::now() },
            )
            .await
            .unwrap();
        assert_eq!(outcome, ConditionalUpdate::PreconditionFailed);
    }

    #[tokio::test]
    async fn test_list_lapsed_pending_filters_and_orders() {
        let store = InMemoryInvitationStore::new();
        let company_id = Uuid::new_v4();
        let now = Utc::now();
        store.insert(pending(company_id, "old", now - Duration::days(20)));
        store.insert(pending(company_id, "older", now - Duration::days(30)));
        store.insert(pending(company_id, "fresh", now - Duration::days(1)));

        let mut cancelled = pending(company_id, "cancelled", now - Duration::days(40));
        cancelled.apply(&Transition::Cancel {
            by: Uuid::new_v4(),
            at: now - Duration::days(39),
        });
        store.insert(cancelled);

        let lapsed = store
            .list_lapsed_pending(now - Duration::days(7), 10)
            .await
            .unwrap();
        let tokens: Vec<&str> = lapsed.iter().map(|i| i.invitation_token.as_str()).collect();
        assert_eq!(tokens, vec!["older", "old"]);

        let limited = store
            .list_lapsed_pending(now - Duration::days(7), 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = InMemoryInvitationStore::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.get(Uuid::new_v4(), "tok").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
