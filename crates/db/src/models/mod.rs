//! Domain model structs and DTOs.
//!
//! - A `FromRow` entity struct matching the database row
//! - A `Serialize` response view that is safe to return to clients
//! - Create / update DTOs consumed by the store

pub mod user;
