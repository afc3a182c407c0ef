/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use crate::extract::ColumnSchema;
use crate::models::{SessionMode, SourceLabel};
use crate::net::{PageNaming, SchemaError};

/// PTS ranking tables: code, name, market, two icon columns, previous close,
/// PTS price, change, change %.
const PTS_SCHEMA: ColumnSchema = ColumnSchema {
    table_selector: "table.stock_table",
    code: 0,
    name: 1,
    market: 2,
    price: 6,
    change_amount: 7,
    change_percent: 8,
    min_columns: 10,
};

/// Regular-session tables have no PTS column; the cell after the price holds
/// the limit-up/down marker.
const EXCHANGE_SCHEMA: ColumnSchema = ColumnSchema {
    table_selector: "table.stock_table",
    code: 0,
    name: 1,
    market: 2,
    price: 5,
    change_amount: 7,
    change_percent: 8,
    min_columns: 10,
};

/// One labeled upstream screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSource {
    pub name: &'static str,
    /// Path and query relative to the screening site origin.
    pub path: &'static str,
    pub label: SourceLabel,
    pub schema: ColumnSchema,
}

impl ScreenSource {
    pub fn url(&self, root: &str) -> String {
        format!("{}{}", root.trim_end_matches('/'), self.path)
    }

    pub fn naming(&self, root: &str) -> PageNaming {
        PageNaming::QuerySuffix {
            base: self.url(root),
        }
    }
}

static NIGHT: [ScreenSource; 2] = [
    ScreenSource {
        name: "pts_night_increase",
        path: "/warning/pts_night_price_increase",
        label: SourceLabel::Surge,
        schema: PTS_SCHEMA,
    },
    ScreenSource {
        name: "pts_night_decrease",
        path: "/warning/pts_night_price_decrease",
        label: SourceLabel::Plunge,
        schema: PTS_SCHEMA,
    },
];

static DAY: [ScreenSource; 2] = [
    ScreenSource {
        name: "pts_day_increase",
        path: "/warning/pts_day_price_increase",
        label: SourceLabel::Surge,
        schema: PTS_SCHEMA,
    },
    ScreenSource {
        name: "pts_day_decrease",
        path: "/warning/pts_day_price_decrease",
        label: SourceLabel::Plunge,
        schema: PTS_SCHEMA,
    },
];

static EXCHANGE: [ScreenSource; 2] = [
    ScreenSource {
        name: "exchange_increase",
        path: "/warning/?mode=2_1",
        label: SourceLabel::Surge,
        schema: EXCHANGE_SCHEMA,
    },
    ScreenSource {
        name: "exchange_decrease",
        path: "/warning/?mode=2_2",
        label: SourceLabel::Plunge,
        schema: EXCHANGE_SCHEMA,
    },
];

/// Screens for a session, upward screen first.
pub fn screens_for(mode: SessionMode) -> &'static [ScreenSource] {
    match mode {
        SessionMode::Night => &NIGHT,
        SessionMode::Day => &DAY,
        SessionMode::Exchange => &EXCHANGE,
    }
}

/// Validate every built-in schema; run once at startup.
pub fn validate_screens() -> Result<(), SchemaError> {
    for mode in [SessionMode::Night, SessionMode::Day, SessionMode::Exchange] {
        for s in screens_for(mode) {
            s.schema.validate(s.name)?;
        }
    }
    Ok(())
}
