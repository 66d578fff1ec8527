pub mod connection;
pub mod database;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod repository;
pub mod store;

pub use connection::{ConnectionManager, ConnectionState};
pub use database::{MongoBlogStore, MongoConnector};
pub use error::BlogError;
pub use memory::{MemoryBlogStore, MemoryConnector};
pub use metrics::{get_metrics, init_metrics};
pub use repository::BlogRepository;
pub use store::{BlogStore, StoreConnector};
