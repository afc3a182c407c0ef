/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use crate::config::AppConfig;
use crate::extract::norm_text;
use crate::models::DailyQuote;
use crate::net::PageSource;
use log::warn;
use scraper::{ElementRef, Html, Selector};

const OPEN: &str = "始値";
const HIGH: &str = "高値";
const LOW: &str = "安値";
const CLOSE: &str = "終値";

pub fn quote_url(config: &AppConfig, code: &str) -> String {
    format!(
        "{}/stock/?code={}",
        config.screen_root.trim_end_matches('/'),
        code
    )
}

/// Today's four values for `code`; all `-` when the page can't be had.
pub fn fetch_daily_quote<S: PageSource + ?Sized>(
    source: &S,
    config: &AppConfig,
    code: &str,
) -> DailyQuote {
    let url = quote_url(config, code);
    match source.fetch_page(&url, config.quote_timeout) {
        Ok(body) => parse_daily_quote(&body),
        Err(e) => {
            warn!("quote for {code} unavailable: {e}");
            DailyQuote::missing()
        }
    }
}

/// Values sit in `<th>label</th><td>value</td>` pairs; the label has to match
/// exactly. Without a close, the current-price element stands in.
pub fn parse_daily_quote(html: &str) -> DailyQuote {
    let doc = Html::parse_document(html);
    let mut quote = DailyQuote {
        open: labeled_value(&doc, OPEN),
        high: labeled_value(&doc, HIGH),
        low: labeled_value(&doc, LOW),
        close: labeled_value(&doc, CLOSE),
    };

    if quote.close == DailyQuote::MISSING {
        if let Ok(sel) = Selector::parse("span.kabuka") {
            if let Some(span) = doc.select(&sel).next() {
                let text = norm_text(&span.text().collect::<String>());
                if !text.is_empty() {
                    quote.close = text;
                }
            }
        }
    }
    quote
}

fn labeled_value(doc: &Html, label: &str) -> String {
    let Ok(sel_th) = Selector::parse("th") else {
        return DailyQuote::MISSING.to_string();
    };
    doc.select(&sel_th)
        .find(|th| norm_text(&th.text().collect::<String>()) == label)
        .and_then(|th| {
            th.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "td")
        })
        .map(|td| norm_text(&td.text().collect::<String>()))
        .unwrap_or_else(|| DailyQuote::MISSING.to_string())
}
