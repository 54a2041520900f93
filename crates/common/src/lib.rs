//! Shared helpers used across the dusted applications
//!
//! This crate provides small, dependency-light utilities:
//! - Sorting map keys alphabetically or by value
//! - Slice containment checks
//! - Hashing and MIME sniffing of uploaded files

pub mod array;
pub mod mapsort;
pub mod webfile;

pub use array::{contains, contains_all, contains_more_than};
pub use mapsort::{keys, keys_by_value};
pub use webfile::{hash, mime_type};
