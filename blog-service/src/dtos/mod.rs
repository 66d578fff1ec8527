pub mod blog;

pub use blog::{
    BlogResponse, CreateBlogRequest, HealthResponse, MessageResponse, UpdateBlogRequest,
};
