//! Shared utilities and common types for the Course Companion backend.
//!
//! This crate provides functionality used by every other crate:
//! - Password hashing with Argon2id
//! - Signed access/refresh tokens (JWT)
//! - Token fingerprinting (SHA-256)
//! - Cursor pagination for append-only streams
//! - Field validators shared by request DTOs

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
