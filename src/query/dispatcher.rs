use super::core::Query;
use super::handlers::default_registry;
use super::registry::HandlerRegistry;
use crate::app_log;
use crate::error::{ClassroomError, ClassroomResult};
use crate::logger::LogLevel;
use crate::repository::RepositoryManager;
use std::sync::Arc;

/// Single entry point for running queries
///
/// # Example
/// ```no_run
/// use classroom_core::config::StoreConfig;
/// use classroom_core::query::{GetStudentByUsername, QueryDispatcher};
/// use classroom_core::repository::RepositoryManager;
///
/// # async fn run() -> classroom_core::error::ClassroomResult<()> {
/// let repositories = RepositoryManager::from_config(&StoreConfig::from_env()?);
/// let dispatcher = QueryDispatcher::from_repositories(&repositories);
///
/// let student = dispatcher
///     .execute(GetStudentByUsername { username: "ada_l".into() })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryDispatcher {
    registry: Arc<HandlerRegistry>,
}

impl QueryDispatcher {
    /// Freeze `registry`; it cannot change after this point.
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Dispatcher with the standard handler for every query kind
    pub fn from_repositories(repositories: &RepositoryManager) -> Self {
        Self::new(default_registry(repositories))
    }

    /// Fail if any query kind has no handler.
    pub fn ensure_complete(&self) -> ClassroomResult<()> {
        let missing = self.registry.missing();
        if missing.is_empty() {
            return Ok(());
        }

        let names: Vec<&str> = missing.iter().map(|kind| kind.as_str()).collect();
        Err(ClassroomError::IncompleteRegistry(names.join(", ")))
    }

    /// Run `query` through its registered handler.
    ///
    /// # Errors
    /// `UnregisteredQuery` if no handler is bound to the query's kind; any
    /// error from the handler is passed through unchanged.
    pub async fn execute<Q: Query>(&self, query: Q) -> ClassroomResult<Q::Output> {
        let handler = match self.registry.resolve::<Q>() {
            Some(handler) => handler,
            None => {
                app_log!(
                    LogLevel::Error,
                    "No handler registered for query {}",
                    Q::KIND
                );
                return Err(ClassroomError::UnregisteredQuery(Q::KIND));
            }
        };

        app_log!(LogLevel::Debug, "Dispatching query {}", Q::KIND);
        handler.execute(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::query::core::QueryKind;
    use crate::query::queries::{ListAssignments, ListStudents};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unregistered_query_fails_loudly() {
        let dispatcher = QueryDispatcher::new(HandlerRegistry::new());

        let result = dispatcher.execute(ListStudents).await;
        assert!(matches!(
            result,
            Err(ClassroomError::UnregisteredQuery(QueryKind::AllStudents))
        ));
    }

    #[test]
    fn test_ensure_complete_names_missing_kinds() {
        let dispatcher = QueryDispatcher::new(HandlerRegistry::new());
        match dispatcher.ensure_complete() {
            Err(ClassroomError::IncompleteRegistry(names)) => {
                assert!(names.contains("StudentById"));
                assert!(names.contains("QuestionsForAssignment"));
            }
            other => panic!("Expected IncompleteRegistry, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_from_repositories_is_complete() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::builder()
            .data_root(temp.path())
            .build()
            .unwrap();
        let repositories = RepositoryManager::from_config(&config);
        let dispatcher = QueryDispatcher::from_repositories(&repositories);

        dispatcher.ensure_complete().unwrap();
        assert!(dispatcher.execute(ListAssignments).await.unwrap().is_empty());
    }
}
