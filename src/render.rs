/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use crate::models::{DetailView, DisclosureIndex, RankingResult};
use crate::session::Snapshot;
use std::fmt::Write;

pub const NO_MATCHES: &str = "No matching items. Relax the filters or retry.";
const NEWS_MARK: &str = "📄あり";

/// Plain-text ranking table; Change % and News columns as on the dashboard.
pub fn ranking_table(result: &RankingResult) -> String {
    if result.is_empty() {
        return format!("{NO_MATCHES}\n");
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<20} {:<8} {:>10} {:>9} {:>8}  {:<6} {}",
        "Code", "Name", "Market", "Price", "Change", "Change%", "News", "Label"
    );
    for row in &result.rows {
        let c = &row.candidate;
        let _ = writeln!(
            out,
            "{:<6} {:<20} {:<8} {:>10.1} {:>+9.1} {:>+7.2}%  {:<6} {}",
            c.code,
            truncate(&c.name, 20),
            truncate(&c.market, 8),
            c.price,
            c.change_amount,
            c.change_percent,
            if row.has_disclosure { NEWS_MARK } else { "" },
            c.source_label
        );
    }
    out
}

/// Header line for a snapshot: mode, threshold and update time.
pub fn snapshot_header(snap: &Snapshot) -> String {
    format!(
        "{} session, |change| >= {:.1}%, {} row(s), updated {}",
        snap.request.mode,
        snap.request.threshold_percent,
        snap.result.len(),
        snap.updated_at.format("%H:%M:%S")
    )
}

/// Disclosures grouped by code, or only `code`'s when given.
pub fn disclosure_listing(index: &DisclosureIndex, code: Option<&str>) -> String {
    let mut out = String::new();
    let codes: Vec<&str> = match code {
        Some(c) => vec![c],
        None => index.codes(),
    };

    for c in codes {
        let entries = index.get(c);
        if entries.is_empty() {
            let _ = writeln!(out, "{c}: no disclosures today");
            continue;
        }
        let _ = writeln!(out, "{c}: {} disclosure(s)", entries.len());
        for e in entries {
            let _ = writeln!(out, "  {} {}", e.time, e.title);
            if !e.document_url.is_empty() {
                let _ = writeln!(out, "      {}", e.document_url);
            }
        }
    }
    if out.is_empty() {
        out.push_str("No disclosures found.\n");
    }
    out
}

pub fn detail(view: &DetailView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "### {} {}",
        view.code,
        view.name.as_deref().unwrap_or("")
    );
    let q = &view.quote;
    let _ = writeln!(
        out,
        "Open {}  High {}  Low {}  Close {}",
        q.open, q.high, q.low, q.close
    );

    if view.disclosures.is_empty() {
        let _ = writeln!(out, "No disclosures today.");
        let _ = writeln!(out, "Board: {}", view.board_url);
    } else {
        let _ = writeln!(out, "{} disclosure(s) today", view.disclosures.len());
        for d in &view.disclosures {
            let _ = writeln!(out, "- {} {}", d.time, d.title);
            if d.document_url.is_empty() {
                let _ = writeln!(out, "    (no document link)");
            } else {
                let _ = writeln!(out, "    {}", d.document_url);
            }
        }
    }
    out
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}
