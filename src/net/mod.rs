/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

pub mod client;
pub mod errors;
pub mod pager;

pub use client::{HttpPageSource, PageSource};
pub use errors::{FetchError, SchemaError};
pub use pager::{PageNaming, PageVerdict, Pager, PagerReport, PagerSettings, StopReason};
