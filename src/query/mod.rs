//! Query dispatch
//!
//! Callers build a typed query and hand it to [`QueryDispatcher::execute`].
//! The dispatcher looks up the handler bound to the query's [`QueryKind`] in
//! an immutable [`HandlerRegistry`] and returns the handler's result
//! unchanged; the result type is fixed by the query type.
//!
//! # Example
//! ```no_run
//! use classroom_core::config::StoreConfig;
//! use classroom_core::query::{AuthenticateStudent, QueryDispatcher};
//! use classroom_core::repository::RepositoryManager;
//!
//! # async fn run() -> classroom_core::error::ClassroomResult<()> {
//! let repositories = RepositoryManager::from_config(&StoreConfig::default());
//! let dispatcher = QueryDispatcher::from_repositories(&repositories);
//!
//! let login = dispatcher
//!     .execute(AuthenticateStudent {
//!         username: "ada_l".into(),
//!         pin: Some("1234".into()),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod dispatcher;
pub mod handlers;
pub mod queries;
pub mod registry;

// Re-export main types
pub use self::core::{Query, QueryHandler, QueryKind};
pub use dispatcher::QueryDispatcher;
pub use handlers::{
    default_registry, AssignmentQueryHandler, QuestionQueryHandler, StudentQueryHandler,
};
pub use queries::{
    AuthenticateStudent, GetAssignmentById, GetAssignmentByTitle, GetQuestionById,
    GetStudentById, GetStudentByUsername, ListAssignments, ListQuestionsForAssignment,
    ListStudents,
};
pub use registry::HandlerRegistry;
