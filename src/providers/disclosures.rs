/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use crate::config::AppConfig;
use crate::extract::norm_text;
use crate::models::{DisclosureEntry, DisclosureIndex};
use crate::net::{PageNaming, PageSource, PageVerdict, Pager, StopReason};
use chrono::NaiveDate;
use log::{debug, info, warn};
use scraper::{Html, Selector};

/// Result of one listing walk. The index is usable whatever the stop reason.
#[derive(Debug, Clone, PartialEq)]
pub struct DisclosureScan {
    pub date: NaiveDate,
    pub index: DisclosureIndex,
    pub pages_fetched: u32,
    pub stop: StopReason,
}

impl DisclosureScan {
    /// The walk reached the listing's natural end (or the cap) without failing.
    pub fn is_complete(&self) -> bool {
        !self.stop.is_failure()
    }
}

/// `I_list_001_20250102.html`, `I_list_002_20250102.html`, ...
pub fn listing_naming(root: &str, date: NaiveDate) -> PageNaming {
    let root = if root.ends_with('/') {
        root.to_string()
    } else {
        format!("{root}/")
    };
    PageNaming::Template {
        pattern: format!("{root}I_list_{{page}}_{}.html", date.format("%Y%m%d")),
    }
}

/// Walk the listing for `date` until the source answers 404.
pub fn build_index<S: PageSource + ?Sized>(
    source: &S,
    config: &AppConfig,
    date: NaiveDate,
) -> DisclosureScan {
    let naming = listing_naming(&config.disclosure_root, date);
    let mut index = DisclosureIndex::default();

    let report = Pager::new(source, naming, config.disclosure_pager()).walk(|page, body| {
        let added = parse_listing_page(body, &config.disclosure_root, &mut index);
        debug!("disclosure page {page}: {added} entries");
        PageVerdict::Continue
    });

    if report.stop.is_failure() {
        warn!(
            "disclosures for {date}: partial index ({} codes) after {}",
            index.len(),
            report.stop
        );
    } else {
        info!(
            "disclosures for {date}: {} entries across {} codes",
            index.total_entries(),
            index.len()
        );
    }

    DisclosureScan {
        date,
        index,
        pages_fetched: report.pages_fetched,
        stop: report.stop,
    }
}

/// Append every listing row of one page to `index`; returns the number added.
///
/// Rows with fewer than four cells are layout rows and ignored.
pub fn parse_listing_page(html: &str, root: &str, index: &mut DisclosureIndex) -> usize {
    let doc = Html::parse_document(html);
    let (Ok(sel_tr), Ok(sel_td), Ok(sel_a)) = (
        Selector::parse("table tr"),
        Selector::parse("td"),
        Selector::parse("a"),
    ) else {
        return 0;
    };

    let mut added = 0usize;
    for tr in doc.select(&sel_tr) {
        let cols: Vec<_> = tr.select(&sel_td).collect();
        if cols.len() < 4 {
            continue;
        }

        let raw_code = norm_text(&cols[1].text().collect::<String>());
        if raw_code.is_empty() {
            continue;
        }
        let title = norm_text(&cols[3].text().collect::<String>());
        let document_url = cols[3]
            .select(&sel_a)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| join_href(root, href))
            .unwrap_or_default();

        let stored = index.push(
            &raw_code,
            DisclosureEntry {
                time: norm_text(&cols[0].text().collect::<String>()),
                title,
                document_url,
            },
        );
        if stored {
            added += 1;
        } else {
            debug!("listing row with short code `{raw_code}` skipped");
        }
    }
    added
}

/// Resolve a listing href against the listing directory.
fn join_href(root: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(path) = href.strip_prefix('/') {
        // origin = scheme://host
        let origin = root
            .find("://")
            .and_then(|i| root[i + 3..].find('/').map(|j| &root[..i + 3 + j]))
            .unwrap_or(root.trim_end_matches('/'));
        return format!("{origin}/{path}");
    }
    if root.ends_with('/') {
        format!("{root}{href}")
    } else {
        format!("{root}/{href}")
    }
}
