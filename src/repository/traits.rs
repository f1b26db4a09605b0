//! Repository trait definitions
//!
//! These traits define the abstract interfaces for data access operations.
//! Different implementations can provide different storage backends.
//!
//! Absence is never an error: lookups return `Ok(None)` and `delete` returns
//! `Ok(false)` when nothing matches. Errors are reserved for rejected input
//! (`Validation`, `RecordNotFound` on update) and storage failures.

use crate::error::ClassroomResult;
use crate::schema::{
    Assignment, AssignmentUpdate, AssignmentWrite, NewAssignment, NewQuestion, NewStudent,
    Question, QuestionUpdate, QuestionWrite, Student, StudentUpdate, StudentWrite,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for students
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Find a student by id
    async fn find_by_id(&self, id: Uuid) -> ClassroomResult<Option<Student>>;

    /// Find a student by username
    async fn find_by_username(&self, username: &str) -> ClassroomResult<Option<Student>>;

    /// All students, oldest first
    async fn find_all(&self) -> ClassroomResult<Vec<Student>>;

    /// Assign an id and timestamps and store a new student
    ///
    /// # Errors
    /// `Validation` if a field is malformed or the username is taken.
    async fn create(&self, student: NewStudent) -> ClassroomResult<Student>;

    /// Merge changes into an existing student
    ///
    /// # Errors
    /// `RecordNotFound` if no student has this id, `Validation` if the merged
    /// record is malformed or the new username is taken.
    async fn update(&self, id: Uuid, changes: StudentUpdate) -> ClassroomResult<Student>;

    /// Remove a student; `false` if nothing matched
    async fn delete(&self, id: Uuid) -> ClassroomResult<bool>;

    /// Look up by username and check the PIN
    ///
    /// A student without a PIN authenticates with any submission.
    async fn authenticate(
        &self,
        username: &str,
        pin: Option<&str>,
    ) -> ClassroomResult<Option<Student>> {
        Ok(self
            .find_by_username(username)
            .await?
            .filter(|student| student.verify_pin(pin)))
    }

    /// Create or update, as stated by the write
    async fn save(&self, write: StudentWrite) -> ClassroomResult<Student> {
        match write {
            StudentWrite::Create(student) => self.create(student).await,
            StudentWrite::Update { id, changes } => self.update(id, changes).await,
        }
    }

    /// Check if a student exists
    async fn exists(&self, id: Uuid) -> ClassroomResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

/// Repository for assignments
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> ClassroomResult<Option<Assignment>>;

    /// Find an assignment by its unique title
    async fn find_by_title(&self, title: &str) -> ClassroomResult<Option<Assignment>>;

    async fn find_all(&self) -> ClassroomResult<Vec<Assignment>>;

    async fn create(&self, assignment: NewAssignment) -> ClassroomResult<Assignment>;

    async fn update(&self, id: Uuid, changes: AssignmentUpdate) -> ClassroomResult<Assignment>;

    async fn delete(&self, id: Uuid) -> ClassroomResult<bool>;

    async fn save(&self, write: AssignmentWrite) -> ClassroomResult<Assignment> {
        match write {
            AssignmentWrite::Create(assignment) => self.create(assignment).await,
            AssignmentWrite::Update { id, changes } => self.update(id, changes).await,
        }
    }
}

/// Repository for questions
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> ClassroomResult<Option<Question>>;

    /// Questions attached to an assignment, oldest first
    async fn find_by_assignment(&self, assignment_id: Uuid) -> ClassroomResult<Vec<Question>>;

    async fn find_all(&self) -> ClassroomResult<Vec<Question>>;

    async fn create(&self, question: NewQuestion) -> ClassroomResult<Question>;

    async fn update(&self, id: Uuid, changes: QuestionUpdate) -> ClassroomResult<Question>;

    async fn delete(&self, id: Uuid) -> ClassroomResult<bool>;

    async fn save(&self, write: QuestionWrite) -> ClassroomResult<Question> {
        match write {
            QuestionWrite::Create(question) => self.create(question).await,
            QuestionWrite::Update { id, changes } => self.update(id, changes).await,
        }
    }

    /// Count questions attached to an assignment
    async fn count_for_assignment(&self, assignment_id: Uuid) -> ClassroomResult<usize> {
        Ok(self.find_by_assignment(assignment_id).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    // Mock implementation for testing the provided methods
    struct MockStudentRepository {
        students: Mutex<Vec<Student>>,
    }

    impl MockStudentRepository {
        fn new() -> Self {
            Self {
                students: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StudentRepository for MockStudentRepository {
        async fn find_by_id(&self, id: Uuid) -> ClassroomResult<Option<Student>> {
            Ok(self.students.lock()?.iter().find(|s| s.id == id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> ClassroomResult<Option<Student>> {
            Ok(self
                .students
                .lock()?
                .iter()
                .find(|s| s.username == username)
                .cloned())
        }

        async fn find_all(&self) -> ClassroomResult<Vec<Student>> {
            Ok(self.students.lock()?.clone())
        }

        async fn create(&self, student: NewStudent) -> ClassroomResult<Student> {
            let student = Student::from_new(student, Uuid::new_v4(), Utc::now());
            self.students.lock()?.push(student.clone());
            Ok(student)
        }

        async fn update(&self, id: Uuid, changes: StudentUpdate) -> ClassroomResult<Student> {
            let mut students = self.students.lock()?;
            let slot = students
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(crate::error::ClassroomError::RecordNotFound {
                    collection: "students",
                    id,
                })?;
            *slot = slot.apply(changes);
            Ok(slot.clone())
        }

        async fn delete(&self, id: Uuid) -> ClassroomResult<bool> {
            let mut students = self.students.lock()?;
            let before = students.len();
            students.retain(|s| s.id != id);
            Ok(students.len() != before)
        }
    }

    #[tokio::test]
    async fn test_default_authenticate_and_save() {
        let repo = MockStudentRepository::new();

        let created = repo
            .save(StudentWrite::Create(
                NewStudent::new("Ada", "Lovelace", "ada_l", "10th", Uuid::new_v4())
                    .with_pin("1234"),
            ))
            .await
            .unwrap();
        assert!(repo.exists(created.id).await.unwrap());

        assert!(repo.authenticate("ada_l", None).await.unwrap().is_none());
        assert!(repo.authenticate("ada_l", Some("0000")).await.unwrap().is_none());
        assert!(repo.authenticate("ada_l", Some("1234")).await.unwrap().is_some());
        assert!(repo.authenticate("nobody", Some("1234")).await.unwrap().is_none());

        let updated = repo
            .save(StudentWrite::Update {
                id: created.id,
                changes: StudentUpdate {
                    pin: Some(None),
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(updated.pin, None);
        assert!(repo.authenticate("ada_l", None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_update_of_unknown_id_is_not_found() {
        let repo = MockStudentRepository::new();
        let result = repo
            .save(StudentWrite::Update {
                id: Uuid::new_v4(),
                changes: StudentUpdate::default(),
            })
            .await;
        assert!(matches!(
            result,
            Err(crate::error::ClassroomError::RecordNotFound { .. })
        ));
    }
}
