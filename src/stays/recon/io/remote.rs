//! Exhaustive paginated reads from the remote reservation store.
//!
//! Pages are requested with `limit`/`offset` until a page comes back shorter
//! than the page size, so a final full page is always followed by one more
//! request. Results are only handed out once every page has been read.

use std::collections::BTreeSet;
use std::fmt;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::stays::recon::config::RemoteConfig;
use crate::stays::recon::error::{ReconError, Result, excerpt};
use crate::stays::recon::model::{DateRange, Identifier, ReserveCode, ReserveCodeIndex};
use crate::stays::recon::normalize::{normalize_reserve_code, normalize_strict_id};

/// One page request against the reservations table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub select: &'static str,
    pub order: &'static str,
    pub limit: usize,
    pub offset: usize,
    /// PostgREST filters as `(column, operator.value)` pairs.
    pub filters: Vec<(String, String)>,
}

impl PageQuery {
    /// Query-string pairs in request order.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("select".to_string(), self.select.to_string()),
            ("order".to_string(), self.order.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        params.extend(self.filters.iter().cloned());
        params
    }
}

/// Anything that can answer a [`PageQuery`] with a decoded JSON body.
pub trait PageSource {
    fn fetch_page(&mut self, query: &PageQuery) -> Result<Value>;
}

/// [`PageSource`] backed by the store's REST endpoint.
pub struct HttpPageSource {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl HttpPageSource {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("stays-recon/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/rest/v1/{}", config.base_url, config.table),
            api_key: config.api_key.clone(),
        })
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&mut self, query: &PageQuery) -> Result<Value> {
        let response = self
            .http
            .get(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&query.params())
            .send()?;

        let status = response.status();
        let url = response.url().to_string();
        let text = response.text()?;
        if !status.is_success() {
            return Err(ReconError::Http {
                status: status.as_u16(),
                url,
                excerpt: excerpt(&text),
            });
        }

        serde_json::from_str(text.trim_start_matches('\u{feff}')).map_err(|err| {
            ReconError::UnexpectedShape {
                offset: query.offset,
                excerpt: format!("malformed JSON ({err}): {}", excerpt(&text)),
            }
        })
    }
}

/// Row id as returned by the store: text or numeric.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RowId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Text(value) => f.write_str(value),
            RowId::Number(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExternalIdRow {
    #[serde(default)]
    external_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ReserveLinkRow {
    id: RowId,
    #[serde(default)]
    external_url: Option<String>,
}

/// Reads complete record sets through a [`PageSource`].
pub struct RemoteFetcher<S> {
    source: S,
    page_size: usize,
}

impl<S: PageSource> RemoteFetcher<S> {
    pub fn new(source: S, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
        }
    }

    /// Strict `external_id`s of reservations checking in within `range`,
    /// deduplicated and sorted.
    #[instrument(level = "info", skip(self), fields(from = %range.from, to = %range.to))]
    pub fn fetch_external_ids(
        &mut self,
        range: DateRange,
        only_imported: bool,
    ) -> Result<Vec<Identifier>> {
        let rows: Vec<ExternalIdRow> = self.fetch_all(
            "external_id",
            "external_id.asc",
            check_in_filters(range, only_imported),
        )?;

        let ids: BTreeSet<Identifier> = rows
            .into_iter()
            .filter_map(|row| row.external_id.as_ref().and_then(scalar_text))
            .filter_map(|text| normalize_strict_id(&text))
            .collect();
        info!(count = ids.len(), "fetched remote external ids");
        Ok(ids.into_iter().collect())
    }

    /// Reserve codes embedded in `external_url`, with the first row id seen
    /// for each code.
    #[instrument(level = "info", skip(self), fields(from = %range.from, to = %range.to))]
    pub fn fetch_reserve_codes(
        &mut self,
        range: DateRange,
        only_imported: bool,
    ) -> Result<ReserveCodeIndex> {
        let rows: Vec<ReserveLinkRow> = self.fetch_all(
            "id,external_url",
            "check_in.asc",
            check_in_filters(range, only_imported),
        )?;

        let mut index = ReserveCodeIndex::default();
        for row in rows {
            let row_id = row.id.to_string();
            if row_id.is_empty() {
                continue;
            }
            let Some(code) = row.external_url.as_deref().and_then(reserve_code_from_url) else {
                debug!(row_id = %row_id, "row without reserve code");
                continue;
            };
            if let Some(existing) = index.row_ids.get(&code) {
                warn!(code = %code, kept = %existing, ignored = %row_id, "duplicate reserve code");
            } else {
                index.row_ids.insert(code.clone(), row_id);
            }
            index.codes.insert(code);
        }
        info!(count = index.codes.len(), "fetched remote reserve codes");
        Ok(index)
    }

    fn fetch_all<T: DeserializeOwned>(
        &mut self,
        select: &'static str,
        order: &'static str,
        filters: Vec<(String, String)>,
    ) -> Result<Vec<T>> {
        let mut query = PageQuery {
            select,
            order,
            limit: self.page_size,
            offset: 0,
            filters,
        };
        let mut out = Vec::new();

        loop {
            let rows = match self.source.fetch_page(&query)? {
                Value::Array(rows) => rows,
                other => {
                    return Err(ReconError::UnexpectedShape {
                        offset: query.offset,
                        excerpt: excerpt(&other.to_string()),
                    });
                }
            };

            let page_len = rows.len();
            debug!(offset = query.offset, rows = page_len, "fetched page");
            for (idx, row) in rows.into_iter().enumerate() {
                let record = serde_json::from_value(row).map_err(|err| ReconError::InvalidRecord {
                    offset: query.offset + idx,
                    message: err.to_string(),
                })?;
                out.push(record);
            }

            if page_len < self.page_size {
                break;
            }
            query.offset += self.page_size;
        }

        Ok(out)
    }
}

fn check_in_filters(range: DateRange, only_imported: bool) -> Vec<(String, String)> {
    let mut filters = vec![
        ("check_in".to_string(), format!("gte.{}", range.from)),
        ("check_in".to_string(), format!("lte.{}", range.to)),
    ];
    if only_imported {
        filters.push(("external_id".to_string(), "not.is.null".to_string()));
    }
    filters
}

/// Text form of a scalar JSON field; `null` and empty strings yield nothing.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

const PLACEHOLDER_BASE: &str = "http://placeholder.invalid/";

/// Extracts and normalizes the `reserve` query parameter of a URL.
///
/// Links without a scheme, or relative links, are resolved against a
/// placeholder base so their query string is still read.
pub fn reserve_code_from_url(url: &str) -> Option<ReserveCode> {
    let trimmed = url.trim();
    let parsed = match Url::parse(trimmed) {
        Ok(parsed) => parsed,
        Err(_) => Url::parse(PLACEHOLDER_BASE).ok()?.join(trimmed).ok()?,
    };
    parsed
        .query_pairs()
        .find(|(key, value)| key == "reserve" && !value.is_empty())
        .and_then(|(_, value)| normalize_reserve_code(&value))
}
