use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ModStore;
use crate::error::StoreError;
use crate::protocol::{ModDocument, ModDraft, Page, UpsertOutcome};

/// Process-local collection. Each operation holds the lock for its whole
/// duration, so upsert and delete are atomic.
#[derive(Debug, Default)]
pub struct MemoryModStore {
    docs: RwLock<Vec<ModDocument>>,
}

impl MemoryModStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl ModStore for MemoryModStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list(&self, page: Option<Page>) -> Result<Vec<ModDocument>, StoreError> {
        let mut docs = self.docs.read().await.clone();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(match page {
            Some(p) => docs
                .into_iter()
                .skip(p.offset as usize)
                .take(p.limit as usize)
                .collect(),
            None => docs,
        })
    }

    async fn find_by_name(&self, name: &str) -> Result<ModDocument, StoreError> {
        self.docs
            .read()
            .await
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn upsert(&self, draft: ModDraft) -> Result<UpsertOutcome, StoreError> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.name == draft.name) {
            Some(existing) => {
                draft.apply_to(existing);
                Ok(UpsertOutcome::Updated(existing.clone()))
            }
            None => {
                let doc = draft.into_new_document();
                docs.push(doc.clone());
                Ok(UpsertOutcome::Created(doc))
            }
        }
    }

    async fn delete_by_name(&self, name: &str) -> Result<ModDocument, StoreError> {
        let mut docs = self.docs.write().await;
        let pos = docs.iter().position(|d| d.name == name).ok_or(StoreError::NotFound)?;
        Ok(docs.remove(pos))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
