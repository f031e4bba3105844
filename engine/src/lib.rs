//! Sahayak engine
//!
//! A Marathi voice assistant that helps citizens find government welfare
//! schemes. Each spoken turn runs through a plan, execute and evaluate
//! cycle backed by an LLM, with deterministic fallbacks whenever the model
//! misbehaves.

pub mod agent;
pub mod cli;
pub mod conductor;
pub mod config;
pub mod eligibility;
pub mod handlers;
pub mod llm;
pub mod secrets;
pub mod telemetry;
pub mod voice;
