use crate::error::ClassroomResult;
use async_trait::async_trait;
use std::fmt;

/// Discriminant identifying each query type
///
/// Closed: every query the core can answer has exactly one variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    StudentById,
    StudentByUsername,
    AllStudents,
    AuthenticateStudent,
    AssignmentById,
    AssignmentByTitle,
    AllAssignments,
    QuestionById,
    QuestionsForAssignment,
}

impl QueryKind {
    pub const ALL: [QueryKind; 9] = [
        QueryKind::StudentById,
        QueryKind::StudentByUsername,
        QueryKind::AllStudents,
        QueryKind::AuthenticateStudent,
        QueryKind::AssignmentById,
        QueryKind::AssignmentByTitle,
        QueryKind::AllAssignments,
        QueryKind::QuestionById,
        QueryKind::QuestionsForAssignment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::StudentById => "StudentById",
            QueryKind::StudentByUsername => "StudentByUsername",
            QueryKind::AllStudents => "AllStudents",
            QueryKind::AuthenticateStudent => "AuthenticateStudent",
            QueryKind::AssignmentById => "AssignmentById",
            QueryKind::AssignmentByTitle => "AssignmentByTitle",
            QueryKind::AllAssignments => "AllAssignments",
            QueryKind::QuestionById => "QuestionById",
            QueryKind::QuestionsForAssignment => "QuestionsForAssignment",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable read request with a statically known result type
pub trait Query: Send + Sync + 'static {
    type Output: Send + 'static;

    const KIND: QueryKind;

    fn kind(&self) -> QueryKind {
        Self::KIND
    }
}

/// The executor bound to one query type
///
/// # Example
/// ```ignore
/// struct Echo;
///
/// #[async_trait]
/// impl QueryHandler<ListStudents> for Echo {
///     async fn execute(&self, _query: &ListStudents) -> ClassroomResult<Vec<Student>> {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    async fn execute(&self, query: &Q) -> ClassroomResult<Q::Output>;
}
