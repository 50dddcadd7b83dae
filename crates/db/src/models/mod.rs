//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Purpose-built DTOs for the generation flow where the wire shape
//!   differs from the row shape

pub mod generation;
pub mod idea;
pub mod painting;
pub mod reference;
pub mod status;
pub mod title;
pub mod user;
