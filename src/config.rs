/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use crate::net::PagerSettings;
use log::{info, warn};
use std::str::FromStr;
use std::time::Duration;

/// Politeness floor between two requests to the same site.
pub const MIN_REQUEST_DELAY: Duration = Duration::from_millis(100);
pub const RANKING_PAGE_CAP: u32 = 20;
pub const DISCLOSURE_PAGE_CAP: u32 = 100;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub user_agent: String,
    /// Screening site origin, no trailing slash.
    pub screen_root: String,
    /// Directory holding the disclosure listing pages and documents.
    pub disclosure_root: String,
    /// Discussion board origin for the detail view.
    pub board_root: String,
    pub request_delay: Duration,
    pub ranking_timeout: Duration,
    pub disclosure_timeout: Duration,
    pub quote_timeout: Duration,
    pub ranking_page_cap: u32,
    pub disclosure_page_cap: u32,
    pub disclosure_ttl: Duration,
    pub ranking_ttl: Duration,
    pub threshold_percent: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            screen_root: "https://kabutan.jp".to_string(),
            disclosure_root: "https://www.release.tdnet.info/inbs/".to_string(),
            board_root: "https://finance.yahoo.co.jp".to_string(),
            request_delay: MIN_REQUEST_DELAY,
            ranking_timeout: Duration::from_secs(10),
            disclosure_timeout: Duration::from_secs(5),
            quote_timeout: Duration::from_secs(5),
            ranking_page_cap: RANKING_PAGE_CAP,
            disclosure_page_cap: DISCLOSURE_PAGE_CAP,
            disclosure_ttl: Duration::from_secs(300),
            ranking_ttl: Duration::from_secs(60),
            threshold_percent: 3.0,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `MONITOR_*` variables (a `.env` file is honoured).
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            info!("loaded environment from {}", path.display());
        }
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = AppConfig::default();

        if let Some(v) = lookup("MONITOR_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            cfg.user_agent = v;
        }
        if let Some(v) = lookup("MONITOR_SCREEN_ROOT") {
            cfg.screen_root = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("MONITOR_DISCLOSURE_ROOT") {
            cfg.disclosure_root = if v.ends_with('/') { v } else { format!("{v}/") };
        }
        if let Some(v) = lookup("MONITOR_BOARD_ROOT") {
            cfg.board_root = v.trim_end_matches('/').to_string();
        }

        if let Some(ms) = parsed::<u64, _>(&lookup, "MONITOR_REQUEST_DELAY_MS") {
            cfg.request_delay = Duration::from_millis(ms);
        }
        if let Some(s) = parsed::<u64, _>(&lookup, "MONITOR_RANKING_TIMEOUT_SECS") {
            cfg.ranking_timeout = Duration::from_secs(s);
        }
        if let Some(s) = parsed::<u64, _>(&lookup, "MONITOR_DISCLOSURE_TIMEOUT_SECS") {
            cfg.disclosure_timeout = Duration::from_secs(s);
            cfg.quote_timeout = Duration::from_secs(s);
        }
        if let Some(n) = parsed::<u32, _>(&lookup, "MONITOR_PAGE_CAP") {
            cfg.ranking_page_cap = n;
        }
        if let Some(n) = parsed::<u32, _>(&lookup, "MONITOR_DISCLOSURE_PAGE_CAP") {
            cfg.disclosure_page_cap = n;
        }
        if let Some(s) = parsed::<u64, _>(&lookup, "MONITOR_DISCLOSURE_TTL_SECS") {
            cfg.disclosure_ttl = Duration::from_secs(s);
        }
        if let Some(s) = parsed::<u64, _>(&lookup, "MONITOR_RANKING_TTL_SECS") {
            cfg.ranking_ttl = Duration::from_secs(s);
        }
        if let Some(t) = parsed::<f64, _>(&lookup, "MONITOR_THRESHOLD_PERCENT") {
            if t.is_finite() && t >= 0.0 {
                cfg.threshold_percent = t;
            } else {
                warn!("MONITOR_THRESHOLD_PERCENT must be finite and >= 0, got {t}; ignored");
            }
        }

        cfg
    }

    /// Configured delay, never below [`MIN_REQUEST_DELAY`].
    pub fn request_delay(&self) -> Duration {
        self.request_delay.max(MIN_REQUEST_DELAY)
    }

    pub fn ranking_pager(&self) -> PagerSettings {
        PagerSettings {
            page_cap: self.ranking_page_cap,
            delay: self.request_delay(),
            timeout: self.ranking_timeout,
        }
    }

    pub fn disclosure_pager(&self) -> PagerSettings {
        PagerSettings {
            page_cap: self.disclosure_page_cap,
            delay: self.request_delay(),
            timeout: self.disclosure_timeout,
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("{key}: cannot parse `{raw}`; using default");
            None
        }
    }
}
