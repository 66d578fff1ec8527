pub mod blogs;
pub mod fallback;
pub mod health;
pub mod metrics;

pub use blogs::{create_blog, delete_blog, get_blog, list_blogs, update_blog};
pub use fallback::not_found;
pub use health::health_check;
