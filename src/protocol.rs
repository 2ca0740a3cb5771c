use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PAGE_SIZE: u64 = 20;

/// A mod record in its stored shape. This is what list and find return.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body accepted by `PUT /create`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A validated payload stamped with the instant its request arrived.
#[derive(Debug, Clone)]
pub struct ModDraft {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl ModPayload {
    pub fn into_draft(self, received_at: DateTime<Utc>) -> Result<ModDraft, String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        Ok(ModDraft {
            name: self.name,
            description: self.description,
            image: self.image,
            received_at,
        })
    }
}

impl ModDraft {
    /// Document for a first insertion: both timestamps are the receipt time.
    pub fn into_new_document(self) -> ModDocument {
        ModDocument {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            image: self.image,
            created_at: self.received_at,
            updated_at: self.received_at,
        }
    }

    /// Overwrites the mutable fields of `existing`, keeping its id and creation time.
    /// `updated_at` never moves backwards, even when an older request lands last.
    pub fn apply_to(self, existing: &mut ModDocument) {
        existing.description = self.description;
        existing.image = self.image;
        existing.updated_at = self.received_at.max(existing.updated_at);
    }
}

#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    Created(ModDocument),
    Updated(ModDocument),
}

impl UpsertOutcome {
    pub fn document(&self) -> &ModDocument {
        match self {
            UpsertOutcome::Created(d) | UpsertOutcome::Updated(d) => d,
        }
    }
}

/// Offset/limit window over the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    /// Window for a 1-based page number. Page 0 is treated as page 1.
    pub fn number(page: u64) -> Self {
        let page = page.max(1);
        Self {
            offset: (page - 1).saturating_mul(PAGE_SIZE),
            limit: PAGE_SIZE,
        }
    }
}
