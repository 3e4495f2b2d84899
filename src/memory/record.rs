//! Long-term memory record types
//!
//! A `MemoryRecord` is a persisted text fragment with the metadata needed to
//! score it: a kind tag, an importance weight, and creation/access times.
//! Summaries and reflections are derived records; reflections keep the ids
//! of the records they were distilled from.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scored long-term memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique record identifier
    pub id: String,
    /// Remembered text
    pub content: String,
    /// Kind of memory
    pub kind: MemoryKind,
    /// Importance weight (>= 0)
    pub importance: f64,
    /// When the record was first stored
    pub created_at: DateTime<Utc>,
    /// Last time the record was stored or recalled (>= created_at)
    pub last_accessed: DateTime<Utc>,
    /// Records this one was derived from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_ids: Vec<String>,
    /// Conversation session the record belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl MemoryRecord {
    /// Refresh the access time. Never moves it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_accessed {
            self.last_accessed = now;
        }
    }

    /// Time since creation.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    /// Metadata stored alongside the text in the similarity index.
    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            kind: self.kind,
            importance: self.importance,
            created_at: self.created_at,
            last_accessed: self.last_accessed,
            parent_ids: self.parent_ids.clone(),
            session_id: self.session_id.clone(),
        }
    }

    /// Rebuild a record from an index entry.
    pub fn from_parts(id: impl Into<String>, content: impl Into<String>, meta: RecordMetadata) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            kind: meta.kind,
            importance: meta.importance,
            created_at: meta.created_at,
            last_accessed: meta.last_accessed,
            parent_ids: meta.parent_ids,
            session_id: meta.session_id,
        }
    }

    /// Check the record-level invariants.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::StateInvariant("memory id must not be empty".into()));
        }
        if !self.importance.is_finite() || self.importance < 0.0 {
            return Err(Error::StateInvariant(format!(
                "memory {} has invalid importance {}",
                self.id, self.importance
            )));
        }
        if self.last_accessed < self.created_at {
            return Err(Error::StateInvariant(format!(
                "memory {} accessed before it was created",
                self.id
            )));
        }
        Ok(())
    }
}

/// Fixed-shape metadata persisted by the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub kind: MemoryKind,
    pub importance: f64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Kind of long-term memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A verbatim conversational turn
    Raw,
    /// A condensation of recent user utterances
    Summary,
    /// A higher-order insight over several memories
    Reflection,
}

impl MemoryKind {
    /// Importance assigned when none is given explicitly.
    pub fn default_importance(&self) -> f64 {
        match self {
            MemoryKind::Raw => 1.0,
            MemoryKind::Summary => 2.0,
            MemoryKind::Reflection => 10.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Raw => "raw",
            MemoryKind::Summary => "summary",
            MemoryKind::Reflection => "reflection",
        }
    }
}

/// Builder for constructing `MemoryRecord` instances
pub struct MemoryRecordBuilder {
    id: Option<String>,
    kind: MemoryKind,
    content: Option<String>,
    importance: Option<f64>,
    created_at: Option<DateTime<Utc>>,
    parent_ids: Vec<String>,
    session_id: Option<String>,
}

impl MemoryRecordBuilder {
    /// Create a new builder with the required memory kind
    pub fn new(kind: MemoryKind) -> Self {
        Self {
            id: None,
            kind,
            content: None,
            importance: None,
            created_at: None,
            parent_ids: Vec::new(),
            session_id: None,
        }
    }

    /// Use a caller-chosen id instead of a fresh UUID
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Override the kind's default importance
    pub fn importance(mut self, importance: f64) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn parents(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.parent_ids.extend(ids);
        self
    }

    pub fn session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Build the record. Blank content and negative importance are rejected.
    pub fn build(self) -> Result<MemoryRecord> {
        let content = self
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Memory("memory content is required".to_string()))?;

        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let record = MemoryRecord {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            content,
            kind: self.kind,
            importance: self.importance.unwrap_or_else(|| self.kind.default_importance()),
            created_at,
            last_accessed: created_at,
            parent_ids: self.parent_ids,
            session_id: self.session_id,
        };
        record.validate()?;
        Ok(record)
    }
}
