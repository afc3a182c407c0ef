/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

//! PTS movers & timely-disclosure monitor.
//!
//! Scrapes the ranking screens of a session, joins them with the day's
//! disclosure listing by security code and hands a ranked table to whatever
//! presents it. Every network call is blocking and best-effort: failures end
//! the affected walk and are reported as typed stop reasons.

pub mod aggregator;
pub mod cache;
pub mod composer;
pub mod config;
pub mod extract;
pub mod models;
pub mod net;
pub mod providers;
pub mod render;
pub mod session;

#[cfg(test)]
mod tests;

pub use aggregator::{Aggregation, RankingAggregator, SourceReport};
pub use composer::compose;
pub use config::AppConfig;
pub use models::{
    AggregationRequest, ComposeOptions, DetailView, DisclosureEntry, DisclosureIndex,
    RankingCandidate, RankingResult, SessionMode, SourceLabel,
};
pub use net::{FetchError, HttpPageSource, PageSource, StopReason};
pub use session::{MonitorSession, Snapshot};
