#![forbid(unsafe_code)]
//! influence-core library.
//!
//! Computes, from a hit log of page views and registrations, how many
//! distinct users read each article before registering.
//!
//! ```text
//! hit log CSV ──hitlog──▶ Vec<Event>
//!                            │  Approach::{Timestamp, Graph}
//!                            ▼
//!                          Tally ──rank──▶ Ranking ──report──▶ CSV
//! ```
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per module, unified by
//!   [`error::InfluenceError`] and mapped to stable [`error::ErrorCode`]s.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod aggregate;
pub mod config;
pub mod error;
pub mod event;
pub mod hitlog;
pub mod journey;
pub mod pipeline;
pub mod rank;
pub mod report;
pub mod tally;
pub mod timing;

pub use aggregate::{Approach, GraphAggregator, JourneyAggregator, JourneyGraph, TimestampAggregator};
pub use error::{ErrorCode, InfluenceError};
pub use event::Event;
pub use journey::{JourneyRules, RegistrationPolicy};
pub use rank::{ArticleTitles, RankedArticle, Ranking};
pub use tally::Tally;
