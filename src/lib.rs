//! PMF researcher backend.
//!
//! Orchestrates product-market-fit interviews: generates questions from a
//! product description, ingests live transcript chunks, suggests follow-ups,
//! and produces structured analysis and a summary report by delegating to
//! external LLM and speech-to-text services. All session state is in-memory
//! and process-lifetime.

pub mod api;
pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod research;
pub mod speech;
