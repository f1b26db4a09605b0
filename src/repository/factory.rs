//! Repository factory for creating repository instances
//!
//! This factory provides a centralized way to create repository instances
//! with the appropriate backend based on configuration.

use super::file::{FileAssignmentRepository, FileQuestionRepository, FileStudentRepository};
use super::traits::{AssignmentRepository, QuestionRepository, StudentRepository};
use crate::config::StoreConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// Repository factory for creating repository instances
///
/// Callers get trait objects, so swapping the file backend for another one
/// only touches this type.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a file-based student repository
    ///
    /// # Arguments
    /// * `dir` - Directory holding one document per student
    pub fn create_student_repository(dir: PathBuf) -> Arc<dyn StudentRepository> {
        Arc::new(FileStudentRepository::new(dir))
    }

    /// Create a file-based assignment repository
    pub fn create_assignment_repository(dir: PathBuf) -> Arc<dyn AssignmentRepository> {
        Arc::new(FileAssignmentRepository::new(dir))
    }

    /// Create a file-based question repository
    pub fn create_question_repository(dir: PathBuf) -> Arc<dyn QuestionRepository> {
        Arc::new(FileQuestionRepository::new(dir))
    }
}

/// Unified repository manager that holds all repositories
///
/// This provides a single point of access to all repositories, built once at
/// startup and passed to whatever needs it.
#[derive(Clone)]
pub struct RepositoryManager {
    students: Arc<dyn StudentRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl RepositoryManager {
    /// Create a new repository manager with the given repositories
    pub fn new(
        students: Arc<dyn StudentRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            students,
            assignments,
            questions,
        }
    }

    /// File-backed repositories under the configured data root
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            RepositoryFactory::create_student_repository(config.students_dir()),
            RepositoryFactory::create_assignment_repository(config.assignments_dir()),
            RepositoryFactory::create_question_repository(config.questions_dir()),
        )
    }

    /// Get the student repository
    pub fn students(&self) -> Arc<dyn StudentRepository> {
        Arc::clone(&self.students)
    }

    /// Get the assignment repository
    pub fn assignments(&self) -> Arc<dyn AssignmentRepository> {
        Arc::clone(&self.assignments)
    }

    /// Get the question repository
    pub fn questions(&self) -> Arc<dyn QuestionRepository> {
        Arc::clone(&self.questions)
    }
}
