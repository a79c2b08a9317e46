//! Domain building blocks shared by the persistence and API crates.
//!
//! Nothing in here performs I/O.

pub mod clock;
pub mod email;
pub mod error;
pub mod types;
pub mod validation;
