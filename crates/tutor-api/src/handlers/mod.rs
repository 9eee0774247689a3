//! HTTP request handlers.

pub mod ask;

pub use ask::{ask, health_check, liveness, AskRequest, AskResponse};
