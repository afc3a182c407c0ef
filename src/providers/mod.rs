/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

pub mod disclosures;
pub mod quote;
pub mod screener;

pub use disclosures::{DisclosureScan, build_index};
pub use quote::fetch_daily_quote;
pub use screener::{ScreenSource, screens_for, validate_screens};
