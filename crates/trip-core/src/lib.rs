//! Core primitives for the itinerary revision agent: data model, tool set,
//! reply parsing, the revision loop, and LLM/planner adapters.
//!
//! Binaries (the runner, experiments) share this crate so the protocol and
//! its tests live in one place.

pub mod agent;
pub mod llm;
pub mod model;
pub mod planner;
pub mod prompts;
pub mod weather;
