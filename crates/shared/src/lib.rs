//! Shared utilities and common types for the company accounts backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT claims carrying the caller's company identity
//! - Common validation logic

pub mod jwt;
pub mod validation;
