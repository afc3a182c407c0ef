/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("http status {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("could not parse {url}: {message}")]
    Parse { url: String, message: String },

    /// 404 on a paginated listing; the designed end of the walk.
    #[error("no more pages at {url}")]
    EndOfData { url: String },
}

impl FetchError {
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, FetchError::EndOfData { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::Http { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Parse { url, .. }
            | FetchError::EndOfData { url } => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "timeout",
            FetchError::Http { .. } => "http",
            FetchError::Transport { .. } => "transport",
            FetchError::Parse { .. } => "parse",
            FetchError::EndOfData { .. } => "end_of_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema `{source_name}`: invalid table selector `{selector}`")]
    BadSelector { source_name: String, selector: String },

    #[error("schema `{source_name}`: min_columns {min_columns} does not cover column index {index}")]
    ColumnOutOfRange {
        source_name: String,
        min_columns: usize,
        index: usize,
    },

    #[error("schema `{source_name}`: columns `{a}` and `{b}` share index {index}")]
    DuplicateColumn {
        source_name: String,
        a: &'static str,
        b: &'static str,
        index: usize,
    },
}
