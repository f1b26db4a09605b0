//! Data access core for a classroom app
//!
//! Students, assignments and questions live as one JSON document per record
//! under a data root. Reads go through typed queries dispatched by
//! [`query::QueryDispatcher`]; writes go through the repository ports in
//! [`repository`].

pub mod config;
pub mod error;
pub mod logger;
pub mod query;
pub mod repository;
pub mod schema;

pub use config::StoreConfig;
pub use error::{ClassroomError, ClassroomResult};
pub use query::{Query, QueryDispatcher, QueryKind};
pub use repository::RepositoryManager;
