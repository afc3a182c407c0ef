/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use crate::aggregator::{RankingAggregator, SourceReport};
use crate::cache::TtlCache;
use crate::composer::compose;
use crate::config::AppConfig;
use crate::models::{
    AggregationRequest, ComposeOptions, DetailView, DisclosureIndex, RankingResult,
};
use crate::net::{PageSource, SchemaError};
use crate::providers::{build_index, fetch_daily_quote, validate_screens};
use chrono::{DateTime, Local, NaiveDate};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

/// One explicit (or auto-refreshed) ranking fetch and what it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub request: AggregationRequest,
    pub options: ComposeOptions,
    pub disclosure_date: NaiveDate,
    pub result: RankingResult,
    pub reports: Vec<SourceReport>,
    pub updated_at: DateTime<Local>,
}

/// State of one interactive session: caches plus the last ranking shown.
///
/// Everything here is driven by the single foreground caller; nothing is
/// shared across threads or processes.
pub struct MonitorSession<S: PageSource> {
    config: AppConfig,
    source: S,
    disclosures: TtlCache<NaiveDate, Arc<DisclosureIndex>>,
    rankings: TtlCache<String, Arc<Snapshot>>,
    snapshot: Option<Arc<Snapshot>>,
}

impl<S: PageSource> MonitorSession<S> {
    /// Fails only when a built-in column schema is inconsistent.
    pub fn new(config: AppConfig, source: S) -> Result<Self, SchemaError> {
        validate_screens()?;
        Ok(Self {
            config,
            source,
            disclosures: TtlCache::new(),
            rankings: TtlCache::new(),
            snapshot: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Disclosure index for `date`, served from cache while younger than the
    /// disclosure TTL. Partial indexes from failed walks are returned but not kept.
    pub fn disclosures(&mut self, date: NaiveDate) -> Arc<DisclosureIndex> {
        load_disclosures(&self.source, &self.config, &mut self.disclosures, date)
    }

    /// Explicit refresh for today's date; replaces the held snapshot.
    pub fn refresh(
        &mut self,
        request: AggregationRequest,
        options: ComposeOptions,
    ) -> Arc<Snapshot> {
        self.refresh_on(Self::today(), request, options)
    }

    pub fn refresh_on(
        &mut self,
        date: NaiveDate,
        request: AggregationRequest,
        options: ComposeOptions,
    ) -> Arc<Snapshot> {
        let snap = Arc::new(build_snapshot(
            &self.source,
            &self.config,
            &mut self.disclosures,
            date,
            request,
            options,
        ));
        info!(
            "refreshed {} ranking: {} row(s)",
            request.mode,
            snap.result.len()
        );
        self.snapshot = Some(snap.clone());
        snap
    }

    /// Read-through ranking: refetches only when the last identical request is
    /// older than the ranking TTL.
    pub fn ranking_auto(
        &mut self,
        request: AggregationRequest,
        options: ComposeOptions,
    ) -> Arc<Snapshot> {
        let date = Self::today();
        let key = format!("{date}|{request:?}|{options:?}");
        let ttl = self.config.ranking_ttl;
        let (source, config, disclosures) = (&self.source, &self.config, &mut self.disclosures);

        let snap = self.rankings.get_or_fetch(key, ttl, || {
            Arc::new(build_snapshot(
                source,
                config,
                disclosures,
                date,
                request,
                options,
            ))
        });
        self.snapshot = Some(snap.clone());
        snap
    }

    /// Last ranking fetched in this session, if any.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_deref()
    }

    pub fn detail(&mut self, code: &str, name: Option<&str>) -> DetailView {
        self.detail_on(Self::today(), code, name)
    }

    /// Detail pane for a selected code. The name falls back to the held
    /// ranking when the caller doesn't pass one.
    pub fn detail_on(&mut self, date: NaiveDate, code: &str, name: Option<&str>) -> DetailView {
        let name = name.map(str::to_string).or_else(|| {
            self.snapshot
                .as_ref()
                .and_then(|s| s.result.find(code))
                .map(|row| row.candidate.name.clone())
        });
        let index = self.disclosures(date);
        let quote = fetch_daily_quote(&self.source, &self.config, code);

        DetailView {
            code: code.to_string(),
            name,
            quote,
            disclosures: index.get(code).to_vec(),
            board_url: format!(
                "{}/quote/{}.T/bbs",
                self.config.board_root.trim_end_matches('/'),
                code
            ),
        }
    }

    /// Drop both caches and the held snapshot.
    pub fn invalidate_all(&mut self) {
        self.disclosures.invalidate_all();
        self.rankings.invalidate_all();
        self.snapshot = None;
        info!("all caches cleared");
    }
}

fn load_disclosures<S: PageSource + ?Sized>(
    source: &S,
    config: &AppConfig,
    cache: &mut TtlCache<NaiveDate, Arc<DisclosureIndex>>,
    date: NaiveDate,
) -> Arc<DisclosureIndex> {
    let fetched = cache.get_or_try_fetch(date, config.disclosure_ttl, || {
        let scan = build_index(source, config, date);
        let complete = scan.is_complete();
        let index = Arc::new(scan.index);
        if complete { Ok(index) } else { Err(index) }
    });
    match fetched {
        Ok(index) => index,
        Err(partial) => {
            warn!("disclosures for {date} incomplete; not cached");
            partial
        }
    }
}

fn build_snapshot<S: PageSource + ?Sized>(
    source: &S,
    config: &AppConfig,
    disclosures: &mut TtlCache<NaiveDate, Arc<DisclosureIndex>>,
    date: NaiveDate,
    request: AggregationRequest,
    options: ComposeOptions,
) -> Snapshot {
    let index = load_disclosures(source, config, disclosures, date);
    let aggregation = RankingAggregator::new(source, config).aggregate(&request);

    // The request's cap drives both the early stop and the final truncation.
    if options.max_items != request.max_items {
        warn!(
            "row cap {} from compose options overridden by request cap {}",
            options.max_items, request.max_items
        );
    }
    let options = ComposeOptions {
        max_items: request.max_items,
        ..options
    };
    let result = compose(&aggregation.candidates, &index, &options);

    Snapshot {
        request,
        options,
        disclosure_date: date,
        result,
        reports: aggregation.reports,
        updated_at: Local::now(),
    }
}
