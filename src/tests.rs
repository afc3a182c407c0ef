/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

//! Pipeline tests against scripted in-memory sources.

use crate::aggregator::RankingAggregator;
use crate::config::AppConfig;
use crate::models::{AggregationRequest, ComposeOptions, SessionMode, SourceLabel};
use crate::net::{FetchError, PageSource, StopReason};
use crate::providers::build_index;
use crate::session::MonitorSession;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

const SCREEN: &str = "http://screen.test";
const LISTING: &str = "http://tdnet.test/inbs/";

const NIGHT_UP: &str = "http://screen.test/warning/pts_night_price_increase";
const NIGHT_DOWN: &str = "http://screen.test/warning/pts_night_price_decrease";

/// URL-keyed fake. Unknown URLs answer 404; `fallback` (when set) answers
/// everything instead.
struct Scripted {
    pages: HashMap<String, Result<String, FetchError>>,
    fallback: Option<String>,
    calls: RefCell<Vec<String>>,
}

impl Scripted {
    fn new() -> Self {
        Scripted {
            pages: HashMap::new(),
            fallback: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn page(mut self, url: &str, body: String) -> Self {
        self.pages.insert(url.to_string(), Ok(body));
        self
    }

    fn fail(mut self, url: &str, err: FetchError) -> Self {
        self.pages.insert(url.to_string(), Err(err));
        self
    }

    fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|u| u.starts_with(prefix))
            .count()
    }
}

impl PageSource for Scripted {
    fn fetch_page(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        if let Some(r) = self.pages.get(url) {
            return r.clone();
        }
        match &self.fallback {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::EndOfData {
                url: url.to_string(),
            }),
        }
    }
}

fn config() -> AppConfig {
    AppConfig {
        screen_root: SCREEN.to_string(),
        disclosure_root: LISTING.to_string(),
        board_root: "http://board.test".to_string(),
        ..AppConfig::default()
    }
}

fn request(threshold: f64, max_items: usize) -> AggregationRequest {
    AggregationRequest {
        mode: SessionMode::Night,
        threshold_percent: threshold,
        max_items,
    }
}

/// Ranking page in the PTS layout; each row is (code, price, change %).
fn ranking_page(rows: &[(&str, &str, &str)]) -> String {
    let mut body = String::from(
        "<html><body><table class=\"stock_table\"><thead>\
         <tr><th>コード</th><th>銘柄名</th><th>市場</th><th></th><th></th>\
         <th>株価</th><th>PTS株価</th><th>前日比</th><th>前日比%</th><th></th></tr>\
         </thead><tbody>",
    );
    for (code, price, pct) in rows {
        body.push_str(&format!(
            "<tr><td><a href=\"/stock/?code={code}\">{code}</a></td><th>銘柄{code}</th>\
             <td>東Ｐ</td><td></td><td></td><td>1,000</td><td>{price}</td><td>+10</td>\
             <td>{pct}</td><td></td></tr>"
        ));
    }
    body.push_str("</tbody></table></body></html>");
    body
}

fn listing_page(rows: &[(&str, &str, &str, Option<&str>)]) -> String {
    let mut body = String::from(
        "<html><body><table><tr><th>時刻</th><th>コード</th><th>会社名</th><th>表題</th></tr>",
    );
    for (time, code, title, href) in rows {
        let title_cell = match href {
            Some(h) => format!("<a href=\"{h}\">{title}</a>"),
            None => title.to_string(),
        };
        body.push_str(&format!(
            "<tr><td>{time}</td><td>{code}</td><td>社名</td><td>{title_cell}</td><td>東</td></tr>"
        ));
    }
    body.push_str("</table></body></html>");
    body
}

fn listing_url(date: NaiveDate, page: u32) -> String {
    format!("{LISTING}I_list_{page:03}_{}.html", date.format("%Y%m%d"))
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn codes(agg: &crate::aggregator::Aggregation) -> Vec<&str> {
    agg.candidates.iter().map(|c| c.code.as_str()).collect()
}

#[test]
fn threshold_is_inclusive_and_zero_moves_never_qualify() {
    let src = Scripted::new()
        .page(
            NIGHT_UP,
            ranking_page(&[("1111", "100", "+2.9%"), ("2222", "100", "+4.10%")]),
        )
        .page(
            NIGHT_DOWN,
            ranking_page(&[("3333", "100", "-3.0%"), ("4444", "100", "0.00%")]),
        );
    let cfg = config();
    let agg = RankingAggregator::new(&src, &cfg).aggregate(&request(3.0, 0));
    assert_eq!(codes(&agg), vec!["2222", "3333"]);

    let agg = RankingAggregator::new(&src, &cfg).aggregate(&request(0.0, 0));
    assert_eq!(codes(&agg), vec!["1111", "2222", "3333"]);
}

#[test]
fn code_on_both_screens_is_kept_once_with_first_label() {
    let src = Scripted::new()
        .page(NIGHT_UP, ranking_page(&[("1234", "500", "+5.00%")]))
        .page(
            NIGHT_DOWN,
            ranking_page(&[("1234", "480", "-6.00%"), ("5678", "90", "-4.00%")]),
        );
    let cfg = config();
    let agg = RankingAggregator::new(&src, &cfg).aggregate(&request(3.0, 0));

    assert_eq!(codes(&agg), vec!["1234", "5678"]);
    let c = &agg.candidates[0];
    assert_eq!(c.source_label, SourceLabel::Surge);
    assert_eq!(c.change_percent, 5.0);
    assert_eq!(c.price, 500.0);
    assert_eq!(agg.reports[1].duplicates, 1);
    assert_eq!(agg.reports[1].admitted, 1);
}

#[test]
fn dedup_is_scoped_to_one_run() {
    let src = Scripted::new().page(NIGHT_UP, ranking_page(&[("1234", "500", "+5.00%")]));
    let cfg = config();
    let aggregator = RankingAggregator::new(&src, &cfg);
    assert_eq!(codes(&aggregator.aggregate(&request(3.0, 0))), vec!["1234"]);
    assert_eq!(codes(&aggregator.aggregate(&request(3.0, 0))), vec!["1234"]);
}

#[test]
fn endless_source_stops_at_page_cap() {
    let mut src = Scripted::new();
    src.fallback = Some(ranking_page(&[("1111", "100", "+8.00%")]));
    let cfg = config();
    let agg = RankingAggregator::new(&src, &cfg).aggregate(&request(3.0, 0));

    assert_eq!(src.calls_to(NIGHT_UP), 20);
    assert_eq!(src.calls_to(NIGHT_DOWN), 20);
    for r in &agg.reports {
        assert_eq!(r.pages_fetched, 20);
        assert_eq!(r.stop, StopReason::PageCap(20));
    }
    assert_eq!(codes(&agg), vec!["1111"]);
}

#[test]
fn malformed_percent_row_does_not_abort_page() {
    let src = Scripted::new().page(
        NIGHT_UP,
        ranking_page(&[
            ("1001", "100", "+5.0%"),
            ("1002", "200", "+6.0%"),
            ("1003", "300", "-"),
            ("1004", "-", "+7.0%"),
            ("1005", "1,500", "+8.0%"),
        ]),
    );
    let cfg = config();
    let agg = RankingAggregator::new(&src, &cfg).aggregate(&request(3.0, 0));

    assert_eq!(codes(&agg), vec!["1001", "1002", "1004", "1005"]);
    assert_eq!(agg.candidates[2].price, 0.0);
    assert_eq!(agg.candidates[3].price, 1500.0);
    assert_eq!(agg.reports[0].rows_skipped, 1);
}

#[test]
fn early_stop_once_twice_max_items_collected() {
    let src = Scripted::new()
        .page(
            NIGHT_UP,
            ranking_page(&[("1001", "1", "+9%"), ("1002", "1", "+8%"), ("1003", "1", "+7%")]),
        )
        .page(
            &format!("{NIGHT_UP}?page=2"),
            ranking_page(&[("1004", "1", "+6%"), ("1005", "1", "+5%")]),
        )
        .page(
            &format!("{NIGHT_UP}?page=3"),
            ranking_page(&[("1006", "1", "+50%")]),
        )
        .page(NIGHT_DOWN, ranking_page(&[("2001", "1", "-4%")]))
        .page(
            &format!("{NIGHT_DOWN}?page=2"),
            ranking_page(&[("2002", "1", "-40%")]),
        );
    let cfg = config();
    let agg = RankingAggregator::new(&src, &cfg).aggregate(&request(3.0, 2));

    assert_eq!(agg.reports[0].stop, StopReason::EarlyStop);
    assert_eq!(agg.reports[0].pages_fetched, 2);
    assert_eq!(agg.reports[1].stop, StopReason::EarlyStop);
    assert_eq!(agg.reports[1].pages_fetched, 1);
    // 1006 and 2002 sit past the cutoff and are never seen.
    assert_eq!(codes(&agg), vec!["1001", "1002", "1003", "1004", "1005", "2001"]);
}

#[test]
fn fetch_failure_keeps_what_was_collected() {
    let src = Scripted::new()
        .page(NIGHT_UP, ranking_page(&[("1001", "1", "+9%")]))
        .fail(
            &format!("{NIGHT_UP}?page=2"),
            FetchError::Transport {
                url: format!("{NIGHT_UP}?page=2"),
                message: "connection reset".into(),
            },
        )
        .page(NIGHT_DOWN, ranking_page(&[("2001", "1", "-4%")]));
    let cfg = config();
    let agg = RankingAggregator::new(&src, &cfg).aggregate(&request(3.0, 0));

    assert_eq!(codes(&agg), vec!["1001", "2001"]);
    assert!(matches!(
        agg.reports[0].stop,
        StopReason::Failed(FetchError::Transport { .. })
    ));
    assert_eq!(agg.reports[1].stop, StopReason::EndOfListing);
    assert!(agg.had_failures());
}

#[test]
fn moved_screen_endpoint_is_reported_as_failure() {
    let src = Scripted::new();
    let cfg = config();
    let agg = RankingAggregator::new(&src, &cfg).aggregate(&request(3.0, 0));

    assert!(agg.candidates.is_empty());
    assert!(agg.had_failures());
    for r in &agg.reports {
        assert_eq!(r.pages_fetched, 1);
        assert!(matches!(r.stop, StopReason::Failed(FetchError::EndOfData { .. })));
    }
}

#[test]
fn bare_table_header_rows_never_become_candidates() {
    let bare = "<html><body><table class=\"stock_table\">\
        <tr><th>コード</th><th>銘柄名</th></tr>\
        <tr><td>1</td><td>2</td><td>3</td><td>4</td><td>5</td><td>6</td><td>7</td>\
        <td>8</td><td>9.0</td><td>10</td></tr>\
        <tr><td><a href=\"/stock/?code=1001\">1001</a></td><td>銘柄</td><td>東Ｐ</td>\
        <td></td><td></td><td>1,000</td><td>1,050</td><td>+50</td><td>+5.00%</td><td></td></tr>\
        </table></body></html>";
    let src = Scripted::new().page(NIGHT_UP, bare.to_string());
    let cfg = config();
    let agg = RankingAggregator::new(&src, &cfg).aggregate(&request(3.0, 0));

    assert_eq!(codes(&agg), vec!["1001"]);
    assert_eq!(agg.reports[0].rows_seen, 1);
    assert_eq!(agg.reports[0].rows_skipped, 0);
}

#[test]
fn disclosure_walk_ends_at_404() {
    let d = date();
    let src = Scripted::new()
        .page(
            &listing_url(d, 1),
            listing_page(&[
                ("15:00", "13010", "決算短信", Some("140120250314500001.pdf")),
                ("15:00", "72030", "業績予想", None),
            ]),
        )
        .page(
            &listing_url(d, 2),
            listing_page(&[("15:30", "13010", "配当", Some("140120250314500002.pdf"))]),
        );
    let scan = build_index(&src, &config(), d);

    assert_eq!(scan.pages_fetched, 3);
    assert_eq!(scan.stop, StopReason::EndOfListing);
    assert!(scan.is_complete());
    assert_eq!(scan.index.codes(), vec!["1301", "7203"]);
    let titles: Vec<&str> = scan.index.get("1301").iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["決算短信", "配当"]);
    assert_eq!(
        scan.index.get("1301")[1].document_url,
        format!("{LISTING}140120250314500002.pdf")
    );
}

#[test]
fn disclosure_timeout_returns_partial_index() {
    let d = date();
    let src = Scripted::new()
        .page(
            &listing_url(d, 1),
            listing_page(&[("09:00", "99840", "お知らせ", None)]),
        )
        .fail(
            &listing_url(d, 2),
            FetchError::Timeout {
                url: listing_url(d, 2),
            },
        );
    let scan = build_index(&src, &config(), d);
    assert!(!scan.is_complete());
    assert!(scan.index.contains("9984"));
}

#[test]
fn session_joins_disclosures_and_caches_listing() {
    let d = date();
    let src = Scripted::new()
        .page(
            NIGHT_UP,
            ranking_page(&[("1301", "4,100", "+6.0%"), ("2222", "300", "+3.5%")]),
        )
        .page(NIGHT_DOWN, ranking_page(&[("3333", "90", "-12.0%")]))
        .page(
            &listing_url(d, 1),
            listing_page(&[("15:00", "13010", "決算短信", None)]),
        );
    let mut session = MonitorSession::new(config(), &src).unwrap();

    let snap = session.refresh_on(d, request(3.0, 0), ComposeOptions::default());
    let order: Vec<&str> = snap.result.rows.iter().map(|r| r.candidate.code.as_str()).collect();
    assert_eq!(order, vec!["3333", "1301", "2222"]);
    assert!(snap.result.find("1301").unwrap().has_disclosure);
    assert!(!snap.result.find("3333").unwrap().has_disclosure);

    let only_news = ComposeOptions {
        disclosures_only: true,
        ..ComposeOptions::default()
    };
    let snap = session.refresh_on(d, request(3.0, 0), only_news);
    assert_eq!(snap.result.len(), 1);
    assert_eq!(src.calls_to(LISTING), 2, "listing walked once: page 1 + 404");
    assert_eq!(src.calls_to(NIGHT_UP), 4, "explicit refresh always refetches");

    session.invalidate_all();
    assert!(session.snapshot().is_none());
    session.refresh_on(d, request(3.0, 0), ComposeOptions::default());
    assert_eq!(src.calls_to(LISTING), 4);
}

#[test]
fn partial_disclosure_index_is_not_cached() {
    let d = date();
    let src = Scripted::new().fail(
        &listing_url(d, 1),
        FetchError::Http {
            url: listing_url(d, 1),
            status: 503,
        },
    );
    let mut session = MonitorSession::new(config(), &src).unwrap();
    assert!(session.disclosures(d).is_empty());
    assert!(session.disclosures(d).is_empty());
    assert_eq!(src.calls_to(LISTING), 2);
}

#[test]
fn auto_ranking_is_served_from_cache_within_ttl() {
    let src = Scripted::new().page(NIGHT_UP, ranking_page(&[("1111", "10", "+5%")]));
    let mut session = MonitorSession::new(config(), &src).unwrap();

    let a = session.ranking_auto(request(3.0, 10), ComposeOptions::default());
    let b = session.ranking_auto(request(3.0, 10), ComposeOptions::default());
    assert_eq!(a.result, b.result);
    assert_eq!(src.calls_to(NIGHT_UP), 2, "page 1 + 404, once");
    assert_eq!(session.snapshot().unwrap().result.len(), 1);
}

#[test]
fn request_cap_truncates_result() {
    let rows: Vec<(String, String)> = (1..=12)
        .map(|i| (format!("{}", 1000 + i), format!("+{i}.0%")))
        .collect();
    let refs: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|(c, p)| (c.as_str(), "100", p.as_str()))
        .collect();
    let mut cfg = config();
    cfg.ranking_page_cap = 1;
    let src = Scripted::new().page(NIGHT_UP, ranking_page(&refs));
    let mut session = MonitorSession::new(cfg, &src).unwrap();

    let snap = session.refresh_on(date(), request(0.0, 5), ComposeOptions::default());
    let order: Vec<&str> = snap.result.rows.iter().map(|r| r.candidate.code.as_str()).collect();
    assert_eq!(order, vec!["1012", "1011", "1010", "1009", "1008"]);

    let wider = ComposeOptions {
        max_items: 10,
        ..ComposeOptions::default()
    };
    let snap = session.refresh_on(date(), request(0.0, 3), wider);
    assert_eq!(snap.result.len(), 3);
    assert_eq!(snap.options.max_items, 3);
}

#[test]
fn detail_uses_quote_page_and_snapshot_name() {
    let d = date();
    let src = Scripted::new()
        .page(NIGHT_UP, ranking_page(&[("1301", "4,100", "+6.0%")]))
        .page(
            &listing_url(d, 1),
            listing_page(&[("15:00", "13010", "決算短信", Some("x.pdf"))]),
        )
        .page(
            "http://screen.test/stock/?code=1301",
            "<table><tr><th>始値</th><td>4,000</td></tr><tr><th>高値</th><td>4,150</td></tr>\
             <tr><th>安値</th><td>3,990</td></tr><tr><th>終値</th><td>4,100</td></tr></table>"
                .to_string(),
        );
    let mut session = MonitorSession::new(config(), &src).unwrap();
    session.refresh_on(d, request(3.0, 0), ComposeOptions::default());

    let view = session.detail_on(d, "1301", None);
    assert_eq!(view.name.as_deref(), Some("銘柄1301"));
    assert_eq!(view.quote.open, "4,000");
    assert_eq!(view.quote.close, "4,100");
    assert_eq!(view.disclosures.len(), 1);
    assert_eq!(view.disclosures[0].document_url, format!("{LISTING}x.pdf"));
    assert_eq!(view.board_url, "http://board.test/quote/1301.T/bbs");

    let unknown = session.detail_on(d, "9999", Some("名無し"));
    assert!(unknown.disclosures.is_empty());
    assert_eq!(unknown.quote.close, "-");
}
