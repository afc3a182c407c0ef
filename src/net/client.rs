/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use super::errors::FetchError;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use log::warn;
use std::time::Duration;

/// The seam between the pipeline and the network.
///
/// Implementations return the decoded page body, or a typed failure. A 404 must
/// surface as [`FetchError::EndOfData`] because paginated listings use it as
/// their terminator.
pub trait PageSource {
    fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        (**self).fetch_page(url, timeout)
    }
}

impl<T: PageSource + ?Sized> PageSource for Box<T> {
    fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        (**self).fetch_page(url, timeout)
    }
}

/// Blocking HTTP source backed by `reqwest`.
pub struct HttpPageSource {
    http: Client,
}

impl HttpPageSource {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ja,en;q=0.8"));
        headers.insert(USER_AGENT, user_agent_header(user_agent));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: format!("reqwest client: {e}"),
            })?;

        Ok(Self { http })
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| classify(url, e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::EndOfData {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Always UTF-8, whatever the content-type says.
        let body = resp.bytes().map_err(|e| classify(url, e))?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

const FALLBACK_USER_AGENT: &str = "pts-monitor/0.1";

fn user_agent_header(user_agent: &str) -> HeaderValue {
    match HeaderValue::from_str(user_agent) {
        Ok(v) => v,
        Err(e) => {
            warn!("user agent {user_agent:?} rejected ({e}); using {FALLBACK_USER_AGENT}");
            HeaderValue::from_static(FALLBACK_USER_AGENT)
        }
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_decode() || e.is_body() {
        FetchError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
