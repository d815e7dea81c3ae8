//! Core library for the PMF researcher.
//!
//! This crate provides the interview domain models and the in-memory session
//! state, independent of any transport layer (HTTP, LLM upstreams, etc.).
//!
//! # Usage
//!
//! ```
//! use pmf_core::store::AppState;
//!
//! let state = AppState::new();
//! let session = state.create_session("A CRM for freelancers", vec![]);
//! assert!(state.get_session(&session.id).is_some());
//! ```

pub mod error;
pub mod models;
pub mod store;

// Re-export commonly used types at crate root
pub use error::CoreError;
pub use store::AppState;
