/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use super::client::PageSource;
use super::errors::FetchError;
use log::{debug, info, warn};
use std::fmt;
use std::thread;
use std::time::Duration;

/// How page N of a listing is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageNaming {
    /// Page 1 is the bare URL; later pages append `?page=N` (or `&page=N` when
    /// the base already carries a query string).
    QuerySuffix { base: String },
    /// `{page}` in the pattern is replaced by the zero-padded 3-digit page number.
    Template { pattern: String },
}

impl PageNaming {
    pub fn url_for(&self, page: u32) -> String {
        match self {
            PageNaming::QuerySuffix { base } => {
                if page <= 1 {
                    base.clone()
                } else if base.contains('?') {
                    format!("{base}&page={page}")
                } else {
                    format!("{base}?page={page}")
                }
            }
            PageNaming::Template { pattern } => pattern.replace("{page}", &format!("{page:03}")),
        }
    }

    /// Whether a 404 on `page` closes the listing normally.
    ///
    /// Numbered file listings may not exist yet for the day, so any page may
    /// be missing. A screen always serves page 1; a 404 there means the
    /// endpoint moved.
    pub fn missing_page_ends_listing(&self, page: u32) -> bool {
        match self {
            PageNaming::QuerySuffix { .. } => page > 1,
            PageNaming::Template { .. } => true,
        }
    }
}

/// Why a walk ended. Only [`StopReason::Failed`] is a failure; the rest are
/// ordinary ends of data.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The expected table element was not on the page.
    MissingTable,
    /// The table was there but had no rows.
    EmptyPage,
    /// Rows were there but none passed the admission filter.
    NoAdmissibleRows,
    /// The source answered 404 where the listing may legitimately end.
    EndOfListing,
    /// The caller had enough and asked to stop.
    EarlyStop,
    PageCap(u32),
    Failed(FetchError),
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::Failed(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MissingTable => write!(f, "table missing"),
            StopReason::EmptyPage => write!(f, "empty page"),
            StopReason::NoAdmissibleRows => write!(f, "no admissible rows"),
            StopReason::EndOfListing => write!(f, "end of listing"),
            StopReason::EarlyStop => write!(f, "early stop"),
            StopReason::PageCap(cap) => write!(f, "page cap {cap} reached"),
            StopReason::Failed(e) => write!(f, "failed ({}): {e}", e.kind()),
        }
    }
}

/// What the page callback wants the walk to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum PageVerdict {
    Continue,
    Stop(StopReason),
}

#[derive(Debug, Clone, Copy)]
pub struct PagerSettings {
    pub page_cap: u32,
    /// Pause before every page after the first.
    pub delay: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagerReport {
    pub pages_fetched: u32,
    pub stop: StopReason,
}

/// Sequential page walker. One request at a time, never raises: failures end
/// the walk and are reported through [`PagerReport::stop`].
pub struct Pager<'a, S: PageSource + ?Sized> {
    source: &'a S,
    naming: PageNaming,
    settings: PagerSettings,
}

impl<'a, S: PageSource + ?Sized> Pager<'a, S> {
    pub fn new(source: &'a S, naming: PageNaming, settings: PagerSettings) -> Self {
        Self {
            source,
            naming,
            settings,
        }
    }

    pub fn walk<F>(&self, mut on_page: F) -> PagerReport
    where
        F: FnMut(u32, &str) -> PageVerdict,
    {
        let mut pages_fetched = 0u32;

        for page in 1..=self.settings.page_cap {
            if page > 1 && !self.settings.delay.is_zero() {
                thread::sleep(self.settings.delay);
            }

            let url = self.naming.url_for(page);
            debug!("fetching page {page}: {url}");
            pages_fetched += 1;

            let body = match self.source.fetch_page(&url, self.settings.timeout) {
                Ok(b) => b,
                Err(e) if e.is_end_of_data() && self.naming.missing_page_ends_listing(page) => {
                    info!("{url}: end of listing after {} page(s)", page - 1);
                    return PagerReport {
                        pages_fetched,
                        stop: StopReason::EndOfListing,
                    };
                }
                Err(e) => {
                    warn!("{url}: pagination aborted: {e}");
                    return PagerReport {
                        pages_fetched,
                        stop: StopReason::Failed(e),
                    };
                }
            };

            if let PageVerdict::Stop(stop) = on_page(page, &body) {
                if stop.is_failure() {
                    warn!("{url}: stopped on page {page}: {stop}");
                } else {
                    info!("{url}: stopped on page {page}: {stop}");
                }
                return PagerReport {
                    pages_fetched,
                    stop,
                };
            }
        }

        info!(
            "{}: page cap {} reached",
            self.naming.url_for(1),
            self.settings.page_cap
        );
        PagerReport {
            pages_fetched,
            stop: StopReason::PageCap(self.settings.page_cap),
        }
    }
}
