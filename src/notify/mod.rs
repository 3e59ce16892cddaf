pub mod dispatcher;
pub mod render;
pub mod types;
