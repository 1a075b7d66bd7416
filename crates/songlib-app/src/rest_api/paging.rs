//! Decoding of listing query parameters.
//!
//! Malformed values never fail a request, they are dropped and the
//! corresponding default (or no filter) applies. When a key is repeated
//! only its first value is used.

use std::collections::{hash_map::Entry, HashMap};

use axum::extract::{FromRequestParts, Query};
use http::request::Parts;
use songlib_dal::{FilterField, FilterValue, Pagination, PagingDefaults, SongFilter};
use songlib_types::DayMonthYear;
use tracing::debug;

use crate::error::ApiError;

const OFFSET: &str = "offset";
const LIMIT: &str = "limit";

/// Raw query parameters, keyed by name
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut params = HashMap::new();
        for (key, value) in pairs {
            match params.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(value);
                }
                Entry::Occupied(entry) => {
                    debug!(
                        "Ignoring repeated parameter {}={value}, using {}",
                        entry.key(),
                        entry.get()
                    );
                }
            }
        }
        QueryParams(params)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn pagination(&self, defaults: PagingDefaults) -> Pagination {
        let offset = parse_count(OFFSET, self.get(OFFSET)).unwrap_or(defaults.offset);
        let limit = parse_count(LIMIT, self.get(LIMIT)).unwrap_or(defaults.limit);
        Pagination::new(offset, limit)
    }

    pub fn filters(&self) -> Vec<SongFilter> {
        FilterField::ALL
            .into_iter()
            .filter_map(|field| {
                let raw = self
                    .get(field.param_name())
                    .filter(|v| !v.trim().is_empty())?;
                SongFilter::from_field_value(field, decode_value(field, raw))
            })
            .collect()
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(QueryParams::from_pairs(pairs))
    }
}

fn parse_count(name: &str, raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    match raw.parse() {
        Ok(n) => Some(n),
        Err(e) => {
            debug!("Ignoring {name}={raw}: {e}");
            None
        }
    }
}

/// Decodes raw value into the type the field expects, falling back to text.
fn decode_value(field: FilterField, raw: &str) -> FilterValue {
    match field {
        FilterField::GroupName | FilterField::Title | FilterField::Text => {
            FilterValue::Text(raw.to_string())
        }
        FilterField::ReleaseYear => raw
            .trim()
            .parse()
            .map(FilterValue::Integer)
            .unwrap_or_else(|_| FilterValue::Text(raw.to_string())),
        FilterField::ReleaseDate | FilterField::ReleasedAfter | FilterField::ReleasedBefore => raw
            .parse::<DayMonthYear>()
            .map(|d| FilterValue::Date(d.date()))
            .unwrap_or_else(|_| FilterValue::Text(raw.to_string())),
    }
}

/// Paging of verses, for API documentation
#[cfg(feature = "openapi")]
#[derive(utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[allow(dead_code)]
pub struct PagingParams {
    /// Number of items to skip, invalid value means default
    offset: Option<u64>,
    /// Maximum number of items, invalid value means default
    limit: Option<u64>,
}

/// Song listing filters, for API documentation
#[cfg(feature = "openapi")]
#[derive(utoipa::IntoParams)]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
#[allow(dead_code)]
pub struct ListParams {
    /// Case-insensitive substring of group name
    group_name: Option<String>,
    /// Case-insensitive substring of song name
    name: Option<String>,
    release_year: Option<i32>,
    /// Exact release date, `dd.mm.yyyy`
    release_date: Option<String>,
    /// Released strictly after, `dd.mm.yyyy`
    release_date_after: Option<String>,
    /// Released strictly before, `dd.mm.yyyy`
    release_date_before: Option<String>,
    /// Case-insensitive substring of lyrics
    text: Option<String>,
    offset: Option<u64>,
    limit: Option<u64>,
}
