//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for object storage, transactional email and
//! remote image retrieval.

pub mod email;
pub mod images;
pub mod storage;
