/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use crate::config::AppConfig;
use crate::extract::{TablePage, extract_table};
use crate::models::{AggregationRequest, RankingCandidate, SourceLabel};
use crate::net::{PageSource, PageVerdict, Pager, StopReason};
use crate::providers::screener::{ScreenSource, screens_for};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;

/// Per-screen bookkeeping of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: &'static str,
    pub label: SourceLabel,
    pub pages_fetched: u32,
    pub rows_seen: usize,
    pub rows_skipped: usize,
    pub admitted: usize,
    /// Admissible rows dropped because an earlier screen already had the code.
    pub duplicates: usize,
    #[serde(serialize_with = "stop_as_string")]
    pub stop: StopReason,
}

fn stop_as_string<S: serde::Serializer>(stop: &StopReason, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&stop.to_string())
}

/// Merged candidates in first-seen order, not yet ranked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub candidates: Vec<RankingCandidate>,
    pub reports: Vec<SourceReport>,
}

impl Aggregation {
    /// True when any screen stopped on a fetch failure rather than running out of data.
    pub fn had_failures(&self) -> bool {
        self.reports.iter().any(|r| r.stop.is_failure())
    }
}

pub struct RankingAggregator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    config: &'a AppConfig,
}

impl<'a, S: PageSource + ?Sized> RankingAggregator<'a, S> {
    pub fn new(source: &'a S, config: &'a AppConfig) -> Self {
        Self { source, config }
    }

    pub fn aggregate(&self, request: &AggregationRequest) -> Aggregation {
        self.aggregate_screens(screens_for(request.mode), request)
    }

    /// Walk every screen in order, merging by code with first-seen-wins.
    ///
    /// With `max_items > 0` a screen stops paging once `2 * max_items`
    /// candidates are held in total. Rows beyond that point are never looked
    /// at, even if they would outrank what was collected.
    pub fn aggregate_screens(
        &self,
        screens: &[ScreenSource],
        request: &AggregationRequest,
    ) -> Aggregation {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Aggregation::default();
        let early_stop_at = request.max_items.saturating_mul(2);

        for screen in screens {
            let mut report = SourceReport {
                source: screen.name,
                label: screen.label,
                pages_fetched: 0,
                rows_seen: 0,
                rows_skipped: 0,
                admitted: 0,
                duplicates: 0,
                stop: StopReason::EndOfListing,
            };

            let pager = Pager::new(
                self.source,
                screen.naming(&self.config.screen_root),
                self.config.ranking_pager(),
            );

            let walk = pager.walk(|_, body| {
                let (records, total_rows, skipped) = match extract_table(body, &screen.schema) {
                    TablePage::Missing => return PageVerdict::Stop(StopReason::MissingTable),
                    TablePage::Rows {
                        records,
                        total_rows,
                        skipped,
                    } => (records, total_rows, skipped),
                };
                report.rows_seen += total_rows;
                report.rows_skipped += skipped;
                if total_rows == 0 {
                    return PageVerdict::Stop(StopReason::EmptyPage);
                }

                let mut admissible = 0usize;
                for r in records {
                    if !request.admits(r.change_percent) {
                        continue;
                    }
                    admissible += 1;
                    if !seen.insert(r.code.clone()) {
                        report.duplicates += 1;
                        continue;
                    }
                    report.admitted += 1;
                    out.candidates.push(RankingCandidate {
                        code: r.code,
                        name: r.name,
                        market: r.market,
                        price: r.price,
                        change_amount: r.change_amount,
                        change_percent: r.change_percent,
                        source_label: screen.label,
                    });
                }

                if admissible == 0 {
                    return PageVerdict::Stop(StopReason::NoAdmissibleRows);
                }
                if early_stop_at > 0 && out.candidates.len() >= early_stop_at {
                    return PageVerdict::Stop(StopReason::EarlyStop);
                }
                PageVerdict::Continue
            });

            report.pages_fetched = walk.pages_fetched;
            report.stop = walk.stop;

            if report.stop.is_failure() {
                warn!(
                    "{}: kept {} candidate(s) from {} page(s) before failure",
                    screen.name, report.admitted, report.pages_fetched
                );
            } else {
                info!(
                    "{}: {} admitted, {} duplicate(s), {} page(s), {}",
                    screen.name,
                    report.admitted,
                    report.duplicates,
                    report.pages_fetched,
                    report.stop
                );
            }
            out.reports.push(report);
        }

        out
    }
}
