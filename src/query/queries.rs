//! Concrete queries answered by the data access core

use super::core::{Query, QueryKind};
use crate::schema::{Assignment, Question, Student};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetStudentById {
    pub id: Uuid,
}

impl Query for GetStudentById {
    type Output = Option<Student>;
    const KIND: QueryKind = QueryKind::StudentById;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetStudentByUsername {
    pub username: String,
}

impl Query for GetStudentByUsername {
    type Output = Option<Student>;
    const KIND: QueryKind = QueryKind::StudentByUsername;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListStudents;

impl Query for ListStudents {
    type Output = Vec<Student>;
    const KIND: QueryKind = QueryKind::AllStudents;
}

/// Username/PIN login; `pin: None` means nothing was submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticateStudent {
    pub username: String,
    pub pin: Option<String>,
}

impl Query for AuthenticateStudent {
    type Output = Option<Student>;
    const KIND: QueryKind = QueryKind::AuthenticateStudent;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAssignmentById {
    pub id: Uuid,
}

impl Query for GetAssignmentById {
    type Output = Option<Assignment>;
    const KIND: QueryKind = QueryKind::AssignmentById;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAssignmentByTitle {
    pub title: String,
}

impl Query for GetAssignmentByTitle {
    type Output = Option<Assignment>;
    const KIND: QueryKind = QueryKind::AssignmentByTitle;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListAssignments;

impl Query for ListAssignments {
    type Output = Vec<Assignment>;
    const KIND: QueryKind = QueryKind::AllAssignments;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetQuestionById {
    pub id: Uuid,
}

impl Query for GetQuestionById {
    type Output = Option<Question>;
    const KIND: QueryKind = QueryKind::QuestionById;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuestionsForAssignment {
    pub assignment_id: Uuid,
}

impl Query for ListQuestionsForAssignment {
    type Output = Vec<Question>;
    const KIND: QueryKind = QueryKind::QuestionsForAssignment;
}
