pub mod blog;

pub use blog::{Blog, BlogChanges, NewBlog};
