//! Homepage profile pipeline
//!
//! # Overview
//!
//! Builds the data shown on a personal GitHub homepage: profile, totals, README, recently pushed repositories,
//! a twelve-month activity histogram and a ranked, colorized tech stack.
//!
//! The `api` feature exposes only the data types and the [`api::Client`] trait, which is what a GitHub client
//! implementation needs. The `assembler` feature adds the pipeline itself.
//!
//! Every stage has a fixed fallback (default activity, default tech stack, local introduction, default profile),
//! so a GitHub outage or rate limit degrades the page instead of breaking it.

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "api")]
pub mod settings;

#[cfg(feature = "assembler")]
pub mod activity;
#[cfg(feature = "assembler")]
pub mod cache;
#[cfg(feature = "assembler")]
pub mod clock;
#[cfg(feature = "assembler")]
pub mod profile;
#[cfg(feature = "assembler")]
pub mod readme;
#[cfg(feature = "assembler")]
pub mod tech_stack;

#[cfg(all(test, feature = "assembler"))]
mod testing;

#[cfg(feature = "assembler")]
pub use profile::{Profile, ProfileAssembler, RepoSummary};
