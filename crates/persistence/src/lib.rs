//! Persistence layer for the company accounts backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - The PostgreSQL invitation store

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
