/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use crate::models::{ComposeOptions, DisclosureIndex, RankedRow, RankingCandidate, RankingResult};
use std::cmp::Ordering;

/// Join candidates with the disclosure index, filter, rank and cap.
///
/// Stages run in a fixed order: price floor, price ceiling, disclosure
/// presence, stable sort by |change %| descending, truncation. Zero bounds and
/// a zero cap switch their stage off.
pub fn compose(
    candidates: &[RankingCandidate],
    index: &DisclosureIndex,
    options: &ComposeOptions,
) -> RankingResult {
    let mut rows: Vec<RankedRow> = candidates
        .iter()
        .map(|c| RankedRow {
            has_disclosure: index.contains(&c.code),
            candidate: c.clone(),
        })
        .collect();

    if options.min_price > 0.0 {
        rows.retain(|r| r.candidate.price >= options.min_price);
    }
    if options.max_price > 0.0 {
        rows.retain(|r| r.candidate.price <= options.max_price);
    }
    if options.disclosures_only {
        rows.retain(|r| r.has_disclosure);
    }

    rank(&mut rows, options.max_items);
    RankingResult { rows }
}

/// Stable sort by magnitude, largest first, then cap at `max_items` (0 = no cap).
pub fn rank(rows: &mut Vec<RankedRow>, max_items: usize) {
    rows.sort_by(|a, b| by_magnitude_desc(&a.candidate, &b.candidate));
    if max_items > 0 {
        rows.truncate(max_items);
    }
}

fn by_magnitude_desc(a: &RankingCandidate, b: &RankingCandidate) -> Ordering {
    b.magnitude().total_cmp(&a.magnitude())
}
