//! src/routes/admin/mod.rs
mod subscribers;
pub use subscribers::*;
