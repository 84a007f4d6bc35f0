//! src/store/memory.rs
use super::{StoreError, SubscriberFilter, SubscriberStore};
use crate::domain::{Subscriber, SubscriberEmail};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// A process-local store with the same uniqueness guarantees as the Postgres table.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<Subscriber>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Result<MutexGuard<'_, Vec<Subscriber>>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| anyhow::anyhow!("The in-memory subscriber store lock is poisoned").into())
    }

    fn update_where<F>(&self, ids: &[Uuid], mut apply: F) -> Result<u64, StoreError>
    where
        F: FnMut(&mut Subscriber),
    {
        let mut rows = self.rows()?;
        let mut updated = 0;
        for row in rows.iter_mut().filter(|row| ids.contains(&row.id)) {
            apply(row);
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl SubscriberStore for InMemoryStore {
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        Ok(self
            .rows()?
            .iter()
            .find(|row| row.email.as_ref() == email.as_ref())
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscriber>, StoreError> {
        Ok(self.rows()?.iter().find(|row| row.id == id).cloned())
    }

    async fn insert(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let mut rows = self.rows()?;
        if rows.iter().any(|row| row.email == subscriber.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if rows
            .iter()
            .any(|row| row.unsubscribe_token == subscriber.unsubscribe_token)
        {
            return Err(StoreError::DuplicateToken);
        }
        if rows.iter().any(|row| row.id == subscriber.id) {
            return Err(anyhow::anyhow!("Subscriber id {} is already taken", subscriber.id).into());
        }
        rows.push(subscriber.clone());
        Ok(())
    }

    async fn update(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let mut rows = self.rows()?;
        if rows
            .iter()
            .any(|row| row.id != subscriber.id && row.email == subscriber.email)
        {
            return Err(StoreError::DuplicateEmail);
        }
        let row = rows
            .iter_mut()
            .find(|row| row.id == subscriber.id)
            .ok_or_else(|| anyhow::anyhow!("No subscriber with id {}", subscriber.id))?;

        row.email = subscriber.email.clone();
        row.confirmed = subscriber.confirmed;
        row.preferences = subscriber.preferences;
        row.frequency = subscriber.frequency;
        row.language = subscriber.language.clone();
        row.is_active = subscriber.is_active;
        row.gdpr_consent = subscriber.gdpr_consent;
        Ok(())
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<(), StoreError> {
        let updated = self.update_where(&[id], |row| row.is_active = is_active)?;
        if updated == 0 {
            return Err(anyhow::anyhow!("No subscriber with id {}", id).into());
        }
        Ok(())
    }

    async fn confirm_many(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        self.update_where(ids, |row| row.confirmed = true)
    }

    async fn deactivate_many(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        self.update_where(ids, |row| row.is_active = false)
    }

    async fn list(&self, filter: &SubscriberFilter) -> Result<Vec<Subscriber>, StoreError> {
        let mut matching: Vec<Subscriber> = self
            .rows()?
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date_subscribed.cmp(&a.date_subscribed));
        Ok(matching)
    }
}
