//! Handlers binding each query to a repository port

use super::core::{QueryHandler, QueryKind};
use super::queries::{
    AuthenticateStudent, GetAssignmentById, GetAssignmentByTitle, GetQuestionById,
    GetStudentById, GetStudentByUsername, ListAssignments, ListQuestionsForAssignment,
    ListStudents,
};
use super::registry::HandlerRegistry;
use crate::error::ClassroomResult;
use crate::repository::{
    AssignmentRepository, QuestionRepository, RepositoryManager, StudentRepository,
};
use crate::schema::{Assignment, Question, Student};
use async_trait::async_trait;
use std::sync::Arc;

/// Answers the student queries
pub struct StudentQueryHandler {
    students: Arc<dyn StudentRepository>,
}

impl StudentQueryHandler {
    pub fn new(students: Arc<dyn StudentRepository>) -> Self {
        Self { students }
    }
}

#[async_trait]
impl QueryHandler<GetStudentById> for StudentQueryHandler {
    async fn execute(&self, query: &GetStudentById) -> ClassroomResult<Option<Student>> {
        self.students.find_by_id(query.id).await
    }
}

#[async_trait]
impl QueryHandler<GetStudentByUsername> for StudentQueryHandler {
    async fn execute(&self, query: &GetStudentByUsername) -> ClassroomResult<Option<Student>> {
        self.students.find_by_username(&query.username).await
    }
}

#[async_trait]
impl QueryHandler<ListStudents> for StudentQueryHandler {
    async fn execute(&self, _query: &ListStudents) -> ClassroomResult<Vec<Student>> {
        self.students.find_all().await
    }
}

#[async_trait]
impl QueryHandler<AuthenticateStudent> for StudentQueryHandler {
    async fn execute(&self, query: &AuthenticateStudent) -> ClassroomResult<Option<Student>> {
        self.students
            .authenticate(&query.username, query.pin.as_deref())
            .await
    }
}

/// Answers the assignment queries
pub struct AssignmentQueryHandler {
    assignments: Arc<dyn AssignmentRepository>,
}

impl AssignmentQueryHandler {
    pub fn new(assignments: Arc<dyn AssignmentRepository>) -> Self {
        Self { assignments }
    }
}

#[async_trait]
impl QueryHandler<GetAssignmentById> for AssignmentQueryHandler {
    async fn execute(&self, query: &GetAssignmentById) -> ClassroomResult<Option<Assignment>> {
        self.assignments.find_by_id(query.id).await
    }
}

#[async_trait]
impl QueryHandler<GetAssignmentByTitle> for AssignmentQueryHandler {
    async fn execute(
        &self,
        query: &GetAssignmentByTitle,
    ) -> ClassroomResult<Option<Assignment>> {
        self.assignments.find_by_title(&query.title).await
    }
}

#[async_trait]
impl QueryHandler<ListAssignments> for AssignmentQueryHandler {
    async fn execute(&self, _query: &ListAssignments) -> ClassroomResult<Vec<Assignment>> {
        self.assignments.find_all().await
    }
}

/// Answers the question queries
pub struct QuestionQueryHandler {
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionQueryHandler {
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }
}

#[async_trait]
impl QueryHandler<GetQuestionById> for QuestionQueryHandler {
    async fn execute(&self, query: &GetQuestionById) -> ClassroomResult<Option<Question>> {
        self.questions.find_by_id(query.id).await
    }
}

#[async_trait]
impl QueryHandler<ListQuestionsForAssignment> for QuestionQueryHandler {
    async fn execute(
        &self,
        query: &ListQuestionsForAssignment,
    ) -> ClassroomResult<Vec<Question>> {
        self.questions.find_by_assignment(query.assignment_id).await
    }
}

/// Registry with a handler for every [`QueryKind`]
///
/// The match is exhaustive, so adding a kind without wiring its handler does
/// not compile.
pub fn default_registry(repositories: &RepositoryManager) -> HandlerRegistry {
    let students = Arc::new(StudentQueryHandler::new(repositories.students()));
    let assignments = Arc::new(AssignmentQueryHandler::new(repositories.assignments()));
    let questions = Arc::new(QuestionQueryHandler::new(repositories.questions()));

    QueryKind::ALL
        .iter()
        .fold(HandlerRegistry::new(), |registry, kind| match kind {
            QueryKind::StudentById => registry.register::<GetStudentById>(students.clone()),
            QueryKind::StudentByUsername => {
                registry.register::<GetStudentByUsername>(students.clone())
            }
            QueryKind::AllStudents => registry.register::<ListStudents>(students.clone()),
            QueryKind::AuthenticateStudent => {
                registry.register::<AuthenticateStudent>(students.clone())
            }
            QueryKind::AssignmentById => {
                registry.register::<GetAssignmentById>(assignments.clone())
            }
            QueryKind::AssignmentByTitle => {
                registry.register::<GetAssignmentByTitle>(assignments.clone())
            }
            QueryKind::AllAssignments => {
                registry.register::<ListAssignments>(assignments.clone())
            }
            QueryKind::QuestionById => registry.register::<GetQuestionById>(questions.clone()),
            QueryKind::QuestionsForAssignment => {
                registry.register::<ListQuestionsForAssignment>(questions.clone())
            }
        })
}
