//! Domain layer for the company accounts backend.
//!
//! This crate contains:
//! - Domain models (Invitation, subscription plans)
//! - The invitation lifecycle engine and checkout derivation
//! - The invitation store contract and domain error types

pub mod error;
pub mod models;
pub mod services;
