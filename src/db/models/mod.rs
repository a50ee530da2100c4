//! Database operations - split from sqlite.rs for better organization
//!
//! Each module contains `impl Database` blocks for a specific table.

mod notes;
mod tokens;
mod users;
