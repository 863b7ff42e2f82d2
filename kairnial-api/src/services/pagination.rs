//! Uniform pagination over facets that do and do not page natively.
//!
//! Native facets receive `LIMITSKIP`/`LIMITTAKE` in their filter object and
//! answer `{total, items, LIMITSKIP, LIMITTAKE}`. Everything else returns the
//! full list, which is sliced here.

use crate::config::PaginationSettings;
use crate::mapping::{map_filter, map_in, FieldKind, MappingTable};
use crate::services::error::ServiceError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const PAGE_OFFSET: &str = "page_offset";
pub const PAGE_LIMIT: &str = "page_limit";
pub const SEARCH: &str = "search";

pub const LIMIT_SKIP: &str = "LIMITSKIP";
pub const LIMIT_TAKE: &str = "LIMITTAKE";
pub const UPSTREAM_SEARCH: &str = "SEARCH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListCapability {
    pub supports_pagination: bool,
}

impl ListCapability {
    pub const NATIVE: ListCapability = ListCapability {
        supports_pagination: true,
    };
    pub const CLIENT: ListCapability = ListCapability {
        supports_pagination: false,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T = Value> {
    pub total: i64,
    pub page_offset: i64,
    pub page_limit: i64,
    pub items: Vec<T>,
}

impl Page<Value> {
    /// Translate every item through an entity table.
    pub fn map_items(self, table: &'static MappingTable) -> Result<Page<Value>, ServiceError> {
        let items = self
            .items
            .iter()
            .map(|item| map_in(table, item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { items, ..self })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Apply the defaults and the hard cap.
    pub fn clamped(offset: Option<i64>, limit: Option<i64>, settings: &PaginationSettings) -> Self {
        let offset = offset.unwrap_or(0).max(0);
        let limit = match limit {
            Some(l) if l > 0 => l.min(settings.max_page_size),
            _ => settings.default_page_size,
        };
        Self { offset, limit }
    }
}

/// Pagination, free-text search and mapped filters from the query string.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: PageRequest,
    pub search: Option<String>,
    /// Already translated to upstream names.
    pub filters: Map<String, Value>,
}

impl ListQuery {
    pub fn parse(
        params: &HashMap<String, String>,
        filter_table: &'static MappingTable,
        settings: &PaginationSettings,
    ) -> Result<Self, ServiceError> {
        let offset = parse_int(params, PAGE_OFFSET)?;
        let limit = parse_int(params, PAGE_LIMIT)?;

        let mut search = None;
        let mut filters = Map::new();
        for (key, raw) in params {
            match key.as_str() {
                PAGE_OFFSET | PAGE_LIMIT => {}
                SEARCH => search = Some(raw.clone()).filter(|s| !s.trim().is_empty()),
                _ => {
                    let (upstream, value) = map_filter(filter_table, key, raw)?;
                    filters.insert(upstream.to_string(), value);
                }
            }
        }

        Ok(Self {
            page: PageRequest::clamped(offset, limit, settings),
            search,
            filters,
        })
    }

    /// Filter object for client-paginated actions.
    pub fn filter_object(&self) -> Map<String, Value> {
        let mut obj = self.filters.clone();
        if let Some(search) = &self.search {
            obj.insert(UPSTREAM_SEARCH.to_string(), Value::from(search.as_str()));
        }
        obj
    }

    /// Filter object with the page window merged in, for native actions.
    pub fn paged_filter_object(&self) -> Map<String, Value> {
        let mut obj = self.filter_object();
        obj.insert(LIMIT_SKIP.to_string(), Value::from(self.page.offset));
        obj.insert(LIMIT_TAKE.to_string(), Value::from(self.page.limit));
        obj
    }
}

fn parse_int(params: &HashMap<String, String>, key: &str) -> Result<Option<i64>, ServiceError> {
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ServiceError::InvalidRequest(format!("{} must be an integer", key))),
    }
}

/// Build a page from a raw upstream answer according to the capability.
pub fn paginate(
    capability: ListCapability,
    raw: Value,
    request: PageRequest,
) -> Result<Page, ServiceError> {
    if capability.supports_pagination {
        native_page(raw, request)
    } else {
        client_page(into_items(raw)?, request)
    }
}

fn native_page(raw: Value, request: PageRequest) -> Result<Page, ServiceError> {
    let Value::Object(mut obj) = raw else {
        return Err(ServiceError::invalid_response());
    };

    let mut items = into_items(obj.remove("items").unwrap_or(Value::Null))?;

    let page_offset = obj
        .get(LIMIT_SKIP)
        .and_then(lenient_int)
        .filter(|o| *o >= 0)
        .unwrap_or(request.offset);
    let page_limit = obj
        .get(LIMIT_TAKE)
        .and_then(lenient_int)
        .filter(|l| *l > 0)
        .unwrap_or(request.limit);

    items.truncate(usize::try_from(page_limit).unwrap_or(usize::MAX));

    let seen = page_offset + items.len() as i64;
    // `total` may be missing, a numeric string, or "NaN".
    let total = obj.get("total").and_then(lenient_int).unwrap_or(seen).max(seen);

    Ok(Page {
        total,
        page_offset,
        page_limit,
        items,
    })
}

fn client_page(all: Vec<Value>, request: PageRequest) -> Result<Page, ServiceError> {
    let total = all.len() as i64;
    let start = usize::try_from(request.offset).unwrap_or(usize::MAX);
    let take = usize::try_from(request.limit).unwrap_or(usize::MAX);

    let items = all.into_iter().skip(start).take(take).collect();

    Ok(Page {
        total,
        page_offset: request.offset,
        page_limit: request.limit,
        items,
    })
}

/// Accept an array, an id-keyed object of rows, or null.
pub fn into_items(raw: Value) -> Result<Vec<Value>, ServiceError> {
    match raw {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        Value::Object(obj) if obj.values().all(Value::is_object) => Ok(obj.into_iter().map(|(_, v)| v).collect()),
        _ => Err(ServiceError::invalid_response()),
    }
}

/// Keep rows whose upstream fields equal every filter, compared textually.
/// A row without the filtered field is kept: the action already scoped it.
pub fn retain_matching(rows: Vec<Value>, filters: &Map<String, Value>) -> Vec<Value> {
    if filters.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| {
            filters
                .iter()
                .all(|(key, wanted)| match row.get(key) {
                    Some(value) => as_text(value) == as_text(wanted),
                    None => true,
                })
        })
        .collect()
}

/// Keep rows where any string field of the table contains `search`,
/// ignoring case.
pub fn retain_searched(rows: Vec<Value>, search: Option<&str>, table: &MappingTable) -> Vec<Value> {
    let Some(needle) = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()) else {
        return rows;
    };
    rows.into_iter()
        .filter(|row| {
            table
                .fields
                .iter()
                .filter(|field| matches!(field.kind, FieldKind::String))
                .filter_map(|field| row.get(field.upstream).and_then(Value::as_str))
                .any(|text| text.to_lowercase().contains(&needle))
        })
        .collect()
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
