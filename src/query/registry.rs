use super::core::{Query, QueryHandler, QueryKind};
use crate::app_log;
use crate::logger::LogLevel;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Mapping from query kind to its handler
///
/// Built once, by value, then handed to a [`QueryDispatcher`]; there is no
/// global instance. Handlers are stored type-erased and recovered by the
/// query type, so `resolve::<Q>()` always yields a handler for exactly `Q`.
///
/// [`QueryDispatcher`]: super::QueryDispatcher
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<QueryKind, Box<dyn Any + Send + Sync>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `Q`. A later registration for the same kind replaces
    /// the earlier one.
    pub fn register<Q: Query>(mut self, handler: Arc<dyn QueryHandler<Q>>) -> Self {
        if self.handlers.insert(Q::KIND, Box::new(handler)).is_some() {
            app_log!(LogLevel::Debug, "Replaced handler for query {}", Q::KIND);
        }
        self
    }

    pub fn resolve<Q: Query>(&self) -> Option<Arc<dyn QueryHandler<Q>>> {
        self.handlers
            .get(&Q::KIND)?
            .downcast_ref::<Arc<dyn QueryHandler<Q>>>()
            .cloned()
    }

    pub fn contains(&self, kind: QueryKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Kinds with no handler, in declaration order
    pub fn missing(&self) -> Vec<QueryKind> {
        QueryKind::ALL
            .iter()
            .copied()
            .filter(|kind| !self.contains(*kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassroomResult;
    use crate::query::queries::{GetStudentByUsername, ListStudents};
    use crate::schema::Student;
    use async_trait::async_trait;

    struct Fixed(usize);

    #[async_trait]
    impl QueryHandler<ListStudents> for Fixed {
        async fn execute(&self, _query: &ListStudents) -> ClassroomResult<Vec<Student>> {
            Ok(Vec::with_capacity(self.0))
        }
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.resolve::<ListStudents>().is_none());
        assert_eq!(registry.missing().len(), QueryKind::ALL.len());
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let registry = HandlerRegistry::new()
            .register::<ListStudents>(Arc::new(Fixed(1)))
            .register::<ListStudents>(Arc::new(Fixed(64)));

        assert_eq!(registry.len(), 1);
        let handler = registry.resolve::<ListStudents>().unwrap();
        let students = handler.execute(&ListStudents).await.unwrap();
        assert!(students.capacity() >= 64);
    }

    #[test]
    fn test_resolve_is_per_query_type() {
        let registry = HandlerRegistry::new().register::<ListStudents>(Arc::new(Fixed(0)));

        assert!(registry.contains(QueryKind::AllStudents));
        assert!(registry.resolve::<GetStudentByUsername>().is_none());
        assert!(registry.missing().contains(&QueryKind::StudentByUsername));
        assert!(!registry.missing().contains(&QueryKind::AllStudents));
    }
}
