/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// One timely-disclosure announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureEntry {
    /// Source-local clock time, e.g. "15:30".
    pub time: String,
    pub title: String,
    /// Absolute document URL; empty when the row had no link.
    pub document_url: String,
}

/// All disclosures of one day keyed by 4-character security code.
///
/// Entries per code keep scrape order. The index is built once and then only
/// read; there is no mutating API outside the builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisclosureIndex {
    entries: HashMap<String, Vec<DisclosureEntry>>,
}

impl DisclosureIndex {
    /// Truncate a raw listing code ("13010") to its 4-character key ("1301").
    /// Codes shorter than that have no key.
    pub fn key_for(raw_code: &str) -> Option<String> {
        let key: String = raw_code.trim().chars().take(4).collect();
        (key.chars().count() == 4).then_some(key)
    }

    /// Returns false when `raw_code` has no key and nothing was stored.
    pub(crate) fn push(&mut self, raw_code: &str, entry: DisclosureEntry) -> bool {
        let Some(key) = Self::key_for(raw_code) else {
            return false;
        };
        self.entries.entry(key).or_default().push(entry);
        true
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn get(&self, code: &str) -> &[DisclosureEntry] {
        self.entries.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        codes.sort();
        codes
    }

    /// Number of distinct codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_entries(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Which screen produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceLabel {
    Surge,
    Plunge,
}

impl SourceLabel {
    /// Label as shown on the source site.
    pub fn display_name(self) -> &'static str {
        match self {
            SourceLabel::Surge => "急騰",
            SourceLabel::Plunge => "急落",
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingCandidate {
    pub code: String,
    pub name: String,
    pub market: String,
    pub price: f64,
    pub change_amount: f64,
    pub change_percent: f64,
    pub source_label: SourceLabel,
}

impl RankingCandidate {
    pub fn magnitude(&self) -> f64 {
        self.change_percent.abs()
    }
}

/// Trading window being screened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionMode {
    /// PTS night session.
    Night,
    /// PTS day session.
    Day,
    /// Regular exchange session.
    Exchange,
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "night" | "pts-night" => Ok(SessionMode::Night),
            "day" | "pts-day" => Ok(SessionMode::Day),
            "exchange" | "regular" => Ok(SessionMode::Exchange),
            other => Err(format!("unknown session mode `{other}` (night|day|exchange)")),
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionMode::Night => "night",
            SessionMode::Day => "day",
            SessionMode::Exchange => "exchange",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    pub mode: SessionMode,
    /// Inclusive lower bound on |change_percent|.
    pub threshold_percent: f64,
    /// 0 means unbounded.
    pub max_items: usize,
}

impl AggregationRequest {
    /// Admission gate shared by every screen. Exact-zero moves never qualify,
    /// even with a zero threshold.
    pub fn admits(&self, change_percent: f64) -> bool {
        change_percent != 0.0 && change_percent.abs() >= self.threshold_percent
    }

    /// NaN or infinite thresholds would silently admit nothing.
    pub fn threshold_is_valid(&self) -> bool {
        self.threshold_percent.is_finite() && self.threshold_percent >= 0.0
    }
}

impl Default for AggregationRequest {
    fn default() -> Self {
        AggregationRequest {
            mode: SessionMode::Night,
            threshold_percent: 3.0,
            max_items: 0,
        }
    }
}

/// Filters applied by the composer. Zero price bounds are "off".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeOptions {
    pub min_price: f64,
    pub max_price: f64,
    pub disclosures_only: bool,
    pub max_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    #[serde(flatten)]
    pub candidate: RankingCandidate,
    pub has_disclosure: bool,
}

/// Ranked table handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    pub rows: Vec<RankedRow>,
}

impl RankingResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find(&self, code: &str) -> Option<&RankedRow> {
        self.rows.iter().find(|r| r.candidate.code == code)
    }
}

/// Today's four values for one security, as display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl DailyQuote {
    pub const MISSING: &'static str = "-";

    pub fn missing() -> Self {
        DailyQuote {
            open: Self::MISSING.to_string(),
            high: Self::MISSING.to_string(),
            low: Self::MISSING.to_string(),
            close: Self::MISSING.to_string(),
        }
    }
}

/// Everything the detail pane shows for a selected code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailView {
    pub code: String,
    pub name: Option<String>,
    pub quote: DailyQuote,
    pub disclosures: Vec<DisclosureEntry>,
    /// Discussion board link, offered when there are no disclosures.
    pub board_url: String,
}
