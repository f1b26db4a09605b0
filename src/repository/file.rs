//! File-based repository implementations
//!
//! Each repository keeps one JSON document per record in its own directory,
//! backed by a [`DocumentStore`].

use super::document_store::{fresh_id, Document, DocumentStore, Mirror};
use super::traits::{AssignmentRepository, QuestionRepository, StudentRepository};
use crate::error::{ClassroomError, ClassroomResult};
use crate::schema::{
    Assignment, AssignmentUpdate, NewAssignment, NewQuestion, NewStudent, Question,
    QuestionUpdate, Student, StudentUpdate, ValidationErrors,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

impl Document for Student {
    const COLLECTION: &'static str = "students";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_document(raw: &Value) -> Result<Self, ValidationErrors> {
        Student::validate(raw)
    }
}

impl Document for Assignment {
    const COLLECTION: &'static str = "assignments";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_document(raw: &Value) -> Result<Self, ValidationErrors> {
        Assignment::validate(raw)
    }
}

impl Document for Question {
    const COLLECTION: &'static str = "questions";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_document(raw: &Value) -> Result<Self, ValidationErrors> {
        Question::validate(raw)
    }
}

fn not_found<D: Document>(id: Uuid) -> ClassroomError {
    ClassroomError::RecordNotFound {
        collection: D::COLLECTION,
        id,
    }
}

/// Run record checks plus a uniqueness check on one secondary key.
fn accept<D: Document>(
    record: D,
    check: Result<(), ValidationErrors>,
    mirror: &Mirror<D>,
    key_field: &str,
    key_of: impl Fn(&D) -> &str,
) -> ClassroomResult<D> {
    let mut errors = check.err().unwrap_or_default();
    let key = key_of(&record);
    let taken = mirror
        .values()
        .any(|other| other.id() != record.id() && key_of(other) == key);
    if taken {
        errors.add(key_field, "is already taken");
    }
    errors.into_result()?;
    Ok(record)
}

/// File-based student repository
pub struct FileStudentRepository {
    store: DocumentStore<Student>,
}

impl FileStudentRepository {
    /// Create a repository over `dir` (conventionally `<data_root>/students`)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            store: DocumentStore::new(dir),
        }
    }

    /// The underlying store, for load diagnostics
    pub fn store(&self) -> &DocumentStore<Student> {
        &self.store
    }
}

#[async_trait]
impl StudentRepository for FileStudentRepository {
    async fn find_by_id(&self, id: Uuid) -> ClassroomResult<Option<Student>> {
        self.store.get(id).await
    }

    async fn find_by_username(&self, username: &str) -> ClassroomResult<Option<Student>> {
        self.store.find(|student| student.username == username).await
    }

    async fn find_all(&self) -> ClassroomResult<Vec<Student>> {
        self.store.all().await
    }

    async fn create(&self, student: NewStudent) -> ClassroomResult<Student> {
        self.store
            .commit(move |mirror| {
                let record = Student::from_new(student, fresh_id(mirror), Utc::now());
                let check = record.check();
                accept(record, check, mirror, "username", |s| s.username.as_str())
            })
            .await
    }

    async fn update(&self, id: Uuid, changes: StudentUpdate) -> ClassroomResult<Student> {
        self.store
            .commit(move |mirror| {
                let current = mirror.get(&id).ok_or_else(|| not_found::<Student>(id))?;
                let record = current.apply(changes);
                let check = record.check();
                accept(record, check, mirror, "username", |s| s.username.as_str())
            })
            .await
    }

    async fn delete(&self, id: Uuid) -> ClassroomResult<bool> {
        self.store.remove(id).await
    }
}

/// File-based assignment repository
pub struct FileAssignmentRepository {
    store: DocumentStore<Assignment>,
}

impl FileAssignmentRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            store: DocumentStore::new(dir),
        }
    }

    pub fn store(&self) -> &DocumentStore<Assignment> {
        &self.store
    }
}

#[async_trait]
impl AssignmentRepository for FileAssignmentRepository {
    async fn find_by_id(&self, id: Uuid) -> ClassroomResult<Option<Assignment>> {
        self.store.get(id).await
    }

    async fn find_by_title(&self, title: &str) -> ClassroomResult<Option<Assignment>> {
        self.store.find(|assignment| assignment.title == title).await
    }

    async fn find_all(&self) -> ClassroomResult<Vec<Assignment>> {
        self.store.all().await
    }

    async fn create(&self, assignment: NewAssignment) -> ClassroomResult<Assignment> {
        self.store
            .commit(move |mirror| {
                let record = Assignment::from_new(assignment, fresh_id(mirror), Utc::now());
                let check = record.check();
                accept(record, check, mirror, "title", |a| a.title.as_str())
            })
            .await
    }

    async fn update(&self, id: Uuid, changes: AssignmentUpdate) -> ClassroomResult<Assignment> {
        self.store
            .commit(move |mirror| {
                let current = mirror
                    .get(&id)
                    .ok_or_else(|| not_found::<Assignment>(id))?;
                let record = current.apply(changes);
                let check = record.check();
                accept(record, check, mirror, "title", |a| a.title.as_str())
            })
            .await
    }

    async fn delete(&self, id: Uuid) -> ClassroomResult<bool> {
        self.store.remove(id).await
    }
}

/// File-based question repository
pub struct FileQuestionRepository {
    store: DocumentStore<Question>,
}

impl FileQuestionRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            store: DocumentStore::new(dir),
        }
    }

    pub fn store(&self) -> &DocumentStore<Question> {
        &self.store
    }
}

#[async_trait]
impl QuestionRepository for FileQuestionRepository {
    async fn find_by_id(&self, id: Uuid) -> ClassroomResult<Option<Question>> {
        self.store.get(id).await
    }

    async fn find_by_assignment(&self, assignment_id: Uuid) -> ClassroomResult<Vec<Question>> {
        self.store
            .select(|question| question.assignment_id == assignment_id)
            .await
    }

    async fn find_all(&self) -> ClassroomResult<Vec<Question>> {
        self.store.all().await
    }

    async fn create(&self, question: NewQuestion) -> ClassroomResult<Question> {
        self.store
            .commit(move |mirror| {
                let record = Question::from_new(question, fresh_id(mirror), Utc::now());
                record.check()?;
                Ok(record)
            })
            .await
    }

    async fn update(&self, id: Uuid, changes: QuestionUpdate) -> ClassroomResult<Question> {
        self.store
            .commit(move |mirror| {
                let current = mirror.get(&id).ok_or_else(|| not_found::<Question>(id))?;
                let record = current.apply(changes);
                record.check()?;
                Ok(record)
            })
            .await
    }

    async fn delete(&self, id: Uuid) -> ClassroomResult<bool> {
        self.store.remove(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::document_store::StoreState;
    use tempfile::TempDir;

    fn ada() -> NewStudent {
        NewStudent::new("Ada", "Lovelace", "ada_l", "10th", Uuid::new_v4())
    }

    #[test]
    fn test_file_repository_creation() {
        let repo = FileStudentRepository::new(PathBuf::from("data/students"));
        assert_eq!(repo.store().dir(), PathBuf::from("data/students").as_path());
        assert_eq!(repo.store().state(), StoreState::Uninitialized);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let temp = TempDir::new().unwrap();
        let repo = FileStudentRepository::new(temp.path());

        repo.create(ada()).await.unwrap();
        let err = repo.create(ada()).await.unwrap_err();

        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.get("username"), Some("is already taken"));
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_may_keep_own_username() {
        let temp = TempDir::new().unwrap();
        let repo = FileStudentRepository::new(temp.path());
        let created = repo.create(ada()).await.unwrap();

        let updated = repo
            .update(
                created.id,
                StudentUpdate {
                    username: Some("ada_l".to_string()),
                    notes: Some(Some("Prefers morning sessions".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("Prefers morning sessions"));
    }

    #[tokio::test]
    async fn test_update_into_taken_username_is_rejected() {
        let temp = TempDir::new().unwrap();
        let repo = FileStudentRepository::new(temp.path());
        repo.create(ada()).await.unwrap();
        let grace = repo
            .create(NewStudent::new("Grace", "Hopper", "grace_h", "12th", Uuid::new_v4()))
            .await
            .unwrap();

        let result = repo
            .update(
                grace.id,
                StudentUpdate {
                    username: Some("ada_l".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ClassroomError::Validation(_))));
        assert_eq!(
            repo.find_by_id(grace.id).await.unwrap().unwrap().username,
            "grace_h"
        );
    }

    #[tokio::test]
    async fn test_invalid_create_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let repo = FileStudentRepository::new(temp.path());

        let result = repo
            .create(NewStudent::new("Ada", "Lovelace", "a", "10th", Uuid::new_v4()))
            .await;
        assert!(matches!(result, Err(ClassroomError::Validation(_))));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_assignment_titles_are_unique() {
        let temp = TempDir::new().unwrap();
        let repo = FileAssignmentRepository::new(temp.path());

        let fractions = repo
            .create(NewAssignment::new("Fractions", "Math", "5th"))
            .await
            .unwrap();
        let err = repo
            .create(NewAssignment::new("Fractions", "Science", "6th"))
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().get("title"),
            Some("is already taken")
        );

        let found = repo.find_by_title("Fractions").await.unwrap().unwrap();
        assert_eq!(found.id, fractions.id);
    }

    #[tokio::test]
    async fn test_questions_by_assignment() {
        let temp = TempDir::new().unwrap();
        let repo = FileQuestionRepository::new(temp.path());
        let assignment_id = Uuid::new_v4();

        repo.create(NewQuestion::new(assignment_id, "1 + 1?", "2"))
            .await
            .unwrap();
        repo.create(NewQuestion::new(assignment_id, "2 + 2?", "4"))
            .await
            .unwrap();
        repo.create(NewQuestion::new(Uuid::new_v4(), "Elsewhere?", "yes"))
            .await
            .unwrap();

        let questions = repo.find_by_assignment(assignment_id).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].prompt, "1 + 1?");
        assert_eq!(repo.count_for_assignment(assignment_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_question_is_not_found() {
        let temp = TempDir::new().unwrap();
        let repo = FileQuestionRepository::new(temp.path());
        let result = repo.update(Uuid::new_v4(), QuestionUpdate::default()).await;
        assert!(matches!(
            result,
            Err(ClassroomError::RecordNotFound {
                collection: "questions",
                ..
            })
        ));
    }
}
