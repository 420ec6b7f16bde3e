//! Shared domain types for the VerifAI document verification service.

pub mod catalog;
pub mod id;
pub mod types;
