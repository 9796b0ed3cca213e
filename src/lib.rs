//! Trip Scout - Conversational Travel Discovery Engine
//!
//! This crate turns an LLM-guided traveler interview into a validated,
//! monotonically-advancing collection of structured trip data and, once the
//! interview completes, into concrete flight-search parameters.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
