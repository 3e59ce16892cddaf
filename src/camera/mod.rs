pub mod dummy;
pub mod error;
pub mod source;
pub mod still;
pub mod types;
