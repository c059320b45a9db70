//! Persistence for the searchable entities.

pub mod sqlite;
