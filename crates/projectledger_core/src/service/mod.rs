//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Carry the request [`Principal`](crate::model::user::Principal) into
//!   tenant-scoped operations.
//! - Keep transport layers decoupled from storage details.

pub mod category_service;
pub mod project_service;
pub mod response;
pub mod user_service;
