//! Long-term memory
//!
//! - `record`: memory record shape and builder
//! - `index`: similarity index interface plus the bundled in-memory index
//! - `scoring`: relevance × recency × importance ranking
//! - `store`: `MemoryStore`, the atomic façade over the index
//! - `maintenance`: periodic summarize → reflect → prune worker

pub mod index;
pub mod maintenance;
pub mod record;
pub mod scoring;
pub mod store;

pub use index::{InMemoryIndex, IndexEntry, IndexHit, SimilarityIndex};
pub use maintenance::{MaintenanceReport, MaintenanceWorker};
pub use record::{MemoryKind, MemoryRecord, MemoryRecordBuilder, RecordMetadata};
pub use scoring::{ScoreBreakdown, ScoredMemory, Scorer, ScoringWeights};
pub use store::MemoryStore;
