//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the writes that entity supports

pub mod assessment;
pub mod catalog;
pub mod gamification;
pub mod learning_path;
pub mod module_status;
pub mod question;
pub mod user;
