//! Repository Pattern Implementation
//!
//! This module provides abstract interfaces for data access, allowing easy
//! swapping of storage backends (file system, database, cloud, etc.).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Repository Traits               │
//! │  (Abstract interface for data access)   │
//! └──────────────┬──────────────────────────┘
//!                │
//!        ┌───────┴──────────┬───────────────────┐
//!        │                  │                   │
//! ┌──────▼────────┐  ┌──────▼──────────┐  ┌─────▼───────────┐
//! │FileStudentRepo│  │FileAssignmentRepo│ │FileQuestionRepo │
//! └──────┬────────┘  └──────┬──────────┘  └─────┬───────────┘
//!        └──────────────────┼───────────────────┘
//!                    ┌──────▼───────┐
//!                    │DocumentStore │
//!                    │- JSON / id   │
//!                    │- mirror      │
//!                    └──────────────┘
//! ```

pub mod document_store;
pub mod factory;
pub mod file;
pub mod traits;

// Re-export main types
pub use document_store::{Document, DocumentStore, LoadReport, SkippedDocument, StoreState};
pub use factory::{RepositoryFactory, RepositoryManager};
pub use file::{FileAssignmentRepository, FileQuestionRepository, FileStudentRepository};
pub use traits::{AssignmentRepository, QuestionRepository, StudentRepository};
