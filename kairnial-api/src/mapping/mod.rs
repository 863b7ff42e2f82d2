//! Declarative translation between upstream WS payloads and public DTOs.
//!
//! Every entity declares a static [`MappingTable`]: an ordered list of
//! [`FieldMapping`]s pairing a public name with its upstream name and a
//! [`FieldKind`] describing how the value is coerced. The same table is used
//! in both directions; [`map_in`] decodes upstream objects, [`map_out`] and
//! [`map_out_partial`] encode client input.

pub mod tables;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Upstream response to public DTO.
    Inbound,
    /// Client input to upstream parameters.
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("inbound"),
            Direction::Outbound => f.write_str("outbound"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{direction} mapping failed for {table}.{field}: {reason}")]
pub struct MappingError {
    pub direction: Direction,
    pub table: &'static str,
    pub field: String,
    pub reason: String,
}

impl MappingError {
    pub fn new(
        direction: Direction,
        table: &'static str,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            direction,
            table,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    Int,
    Bool,
    Date,
    DateTime,
    Uuid,
    Nested(&'static MappingTable),
    List(&'static FieldKind),
    /// Upstream stores JSON as text. Decoded, then mapped through the table
    /// when one is given, otherwise passed through as-is.
    JsonString(Option<&'static MappingTable>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Null,
    Bool(bool),
    Int(i64),
    Str(&'static str),
    EmptyList,
    EmptyObject,
}

impl FieldDefault {
    fn to_value(self) -> Value {
        match self {
            FieldDefault::Null => Value::Null,
            FieldDefault::Bool(b) => Value::Bool(b),
            FieldDefault::Int(i) => Value::from(i),
            FieldDefault::Str(s) => Value::from(s),
            FieldDefault::EmptyList => Value::Array(Vec::new()),
            FieldDefault::EmptyObject => Value::Object(Map::new()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub public: &'static str,
    pub upstream: &'static str,
    pub kind: FieldKind,
    pub default: Option<FieldDefault>,
    pub required: bool,
    pub read_only: bool,
}

impl FieldMapping {
    pub const fn new(public: &'static str, upstream: &'static str, kind: FieldKind) -> Self {
        Self {
            public,
            upstream,
            kind,
            default: None,
            required: false,
            read_only: false,
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Emitted in responses, never accepted from clients.
    pub const fn read_only(self) -> Self {
        Self {
            read_only: true,
            ..self
        }
    }

    pub const fn default(self, default: FieldDefault) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    fn default_value(&self) -> Value {
        self.default.map(FieldDefault::to_value).unwrap_or(Value::Null)
    }
}

#[derive(Debug)]
pub struct MappingTable {
    pub name: &'static str,
    pub fields: &'static [FieldMapping],
}

impl MappingTable {
    pub fn by_public(&self, public: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.public == public)
    }

    pub fn by_upstream(&self, upstream: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.upstream == upstream)
    }
}

/// Decode one upstream object into its public shape.
pub fn map_in(table: &'static MappingTable, upstream: &Value) -> Result<Value, MappingError> {
    let obj = upstream.as_object().ok_or_else(|| {
        MappingError::new(Direction::Inbound, table.name, "", "expected an object")
    })?;

    let mut out = Map::with_capacity(table.fields.len());
    for field in table.fields {
        let value = match obj.get(field.upstream) {
            None => {
                if field.required {
                    return Err(MappingError::new(
                        Direction::Inbound,
                        table.name,
                        field.public,
                        format!("missing required field `{}`", field.upstream),
                    ));
                }
                field.default_value()
            }
            Some(raw) => match coerce_in(&field.kind, raw) {
                Ok(v) => v,
                Err(reason) if field.required => {
                    return Err(MappingError::new(
                        Direction::Inbound,
                        table.name,
                        field.public,
                        reason,
                    ));
                }
                Err(reason) => {
                    tracing::debug!(
                        table = table.name,
                        field = field.public,
                        %reason,
                        "Optional field degraded to default"
                    );
                    field.default_value()
                }
            },
        };
        out.insert(field.public.to_string(), value);
    }

    Ok(Value::Object(out))
}

/// Decode an upstream array (or a single object) into public items.
pub fn map_in_list(
    table: &'static MappingTable,
    upstream: &Value,
) -> Result<Vec<Value>, MappingError> {
    match upstream {
        Value::Array(items) => items.iter().map(|item| map_in(table, item)).collect(),
        Value::Null => Ok(Vec::new()),
        // Some actions return an id-keyed object instead of an array.
        Value::Object(obj) if obj.values().all(Value::is_object) && !obj.is_empty() => {
            obj.values().map(|item| map_in(table, item)).collect()
        }
        _ => Err(MappingError::new(
            Direction::Inbound,
            table.name,
            "",
            "expected an array",
        )),
    }
}

/// Encode a full client object, enforcing required fields.
pub fn map_out(table: &'static MappingTable, public: &Value) -> Result<Value, MappingError> {
    encode(table, public, true)
}

/// Encode only the keys present in `public`; used for updates.
pub fn map_out_partial(
    table: &'static MappingTable,
    public: &Value,
) -> Result<Value, MappingError> {
    encode(table, public, false)
}

fn encode(table: &'static MappingTable, public: &Value, full: bool) -> Result<Value, MappingError> {
    let obj = public.as_object().ok_or_else(|| {
        MappingError::new(Direction::Outbound, table.name, "", "expected an object")
    })?;

    let mut out = Map::new();
    for field in table.fields.iter().filter(|f| !f.read_only) {
        match obj.get(field.public) {
            None | Some(Value::Null) => {
                if !full {
                    continue;
                }
                if field.required {
                    return Err(MappingError::new(
                        Direction::Outbound,
                        table.name,
                        field.public,
                        "missing required field",
                    ));
                }
                if let Some(default) = field.default.filter(|d| *d != FieldDefault::Null) {
                    // Defaults go through the same encoding as client values.
                    let value = coerce_out(&field.kind, &default.to_value()).map_err(|reason| {
                        MappingError::new(Direction::Outbound, table.name, field.public, reason)
                    })?;
                    out.insert(field.upstream.to_string(), value);
                }
            }
            Some(raw) => {
                let value = coerce_out(&field.kind, raw).map_err(|reason| {
                    MappingError::new(Direction::Outbound, table.name, field.public, reason)
                })?;
                out.insert(field.upstream.to_string(), value);
            }
        }
    }

    Ok(Value::Object(out))
}

/// Translate one query-string filter into its upstream key and value.
pub fn map_filter(
    table: &'static MappingTable,
    public: &str,
    raw: &str,
) -> Result<(&'static str, Value), MappingError> {
    let field = table
        .by_public(public)
        .filter(|f| !f.read_only)
        .ok_or_else(|| {
            MappingError::new(Direction::Outbound, table.name, public, "unknown filter")
        })?;

    let value = coerce_out(&field.kind, &Value::String(raw.to_string()))
        .map_err(|reason| MappingError::new(Direction::Outbound, table.name, public, reason))?;

    Ok((field.upstream, value))
}

fn coerce_in(kind: &FieldKind, raw: &Value) -> Result<Value, String> {
    if raw.is_null() {
        return match kind {
            FieldKind::Bool => Ok(Value::Bool(false)),
            _ => Err("null value".to_string()),
        };
    }

    match kind {
        FieldKind::String => as_string(raw).map(Value::String),
        FieldKind::Int => as_int(raw).map(Value::from),
        FieldKind::Bool => as_bool(raw).map(Value::Bool),
        FieldKind::Date => parse_datetime(raw)
            .map(|dt| Value::String(dt.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| format!("invalid date {}", raw)),
        FieldKind::DateTime => parse_datetime(raw)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .ok_or_else(|| format!("invalid datetime {}", raw)),
        FieldKind::Uuid => as_uuid(raw).map(Value::String),
        FieldKind::Nested(table) => map_in(table, raw).map_err(|e| e.to_string()),
        FieldKind::List(inner) => match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_in(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err("expected an array".to_string()),
        },
        FieldKind::JsonString(table) => {
            let decoded = match raw {
                Value::String(s) if s.trim().is_empty() => return Ok(Value::Null),
                Value::String(s) => serde_json::from_str::<Value>(s)
                    .map_err(|e| format!("invalid embedded json: {}", e))?,
                other => other.clone(),
            };
            match (table, &decoded) {
                (None, _) => Ok(decoded),
                (Some(t), Value::Array(_)) => map_in_list(t, &decoded)
                    .map(Value::Array)
                    .map_err(|e| e.to_string()),
                (Some(t), _) => map_in(t, &decoded).map_err(|e| e.to_string()),
            }
        }
    }
}

fn coerce_out(kind: &FieldKind, raw: &Value) -> Result<Value, String> {
    match kind {
        FieldKind::String => as_string(raw).map(Value::String),
        FieldKind::Int => as_int(raw).map(Value::from),
        FieldKind::Bool => as_bool(raw).map(|b| Value::from(i64::from(b))),
        FieldKind::Date => parse_datetime(raw)
            .map(|dt| Value::String(dt.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| format!("invalid date {}", raw)),
        FieldKind::DateTime => parse_datetime(raw)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .ok_or_else(|| format!("invalid datetime {}", raw)),
        FieldKind::Uuid => as_uuid(raw).map(Value::String),
        FieldKind::Nested(table) => map_out(table, raw).map_err(|e| e.to_string()),
        FieldKind::List(inner) => match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_out(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err("expected an array".to_string()),
        },
        FieldKind::JsonString(table) => {
            let structured = match raw {
                // Already encoded by the client; only check it parses.
                Value::String(s) => {
                    serde_json::from_str::<Value>(s)
                        .map_err(|e| format!("invalid embedded json: {}", e))?;
                    return Ok(raw.clone());
                }
                other => match (table, other) {
                    (None, _) => other.clone(),
                    (Some(t), Value::Array(items)) => Value::Array(
                        items
                            .iter()
                            .map(|item| map_out(t, item))
                            .collect::<Result<Vec<_>, _>>()
                            .map_err(|e| e.to_string())?,
                    ),
                    (Some(t), _) => map_out(t, other).map_err(|e| e.to_string())?,
                },
            };
            serde_json::to_string(&structured)
                .map(Value::String)
                .map_err(|e| e.to_string())
        }
    }
}

fn as_string(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, got {}", other)),
    }
}

fn as_int(raw: &Value) -> Result<i64, String> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| format!("expected an integer, got {}", n)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("expected an integer, got {:?}", s)),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(format!("expected an integer, got {}", other)),
    }
}

fn as_bool(raw: &Value) -> Result<bool, String> {
    match raw {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(format!("expected a boolean, got {}", n)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            _ => Err(format!("expected a boolean, got {:?}", s)),
        },
        other => Err(format!("expected a boolean, got {}", other)),
    }
}

fn as_uuid(raw: &Value) -> Result<String, String> {
    let s = raw
        .as_str()
        .ok_or_else(|| format!("expected a uuid, got {}", raw))?;
    uuid::Uuid::parse_str(s.trim())
        .map(|u| u.to_string())
        .map_err(|_| format!("invalid uuid {:?}", s))
}

fn parse_datetime(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if s.bytes().all(|b| b.is_ascii_digit()) {
                return s
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(naive.and_utc());
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static TAG: MappingTable = MappingTable {
        name: "tag",
        fields: &[
            FieldMapping::new("label", "t_label", FieldKind::String).required(),
            FieldMapping::new("weight", "t_weight", FieldKind::Int).default(FieldDefault::Int(0)),
        ],
    };

    static SAMPLE: MappingTable = MappingTable {
        name: "sample",
        fields: &[
            FieldMapping::new("id", "s_id", FieldKind::Int).required().read_only(),
            FieldMapping::new("name", "s_name", FieldKind::String).required(),
            FieldMapping::new("active", "s_active", FieldKind::Bool),
            FieldMapping::new("created_at", "s_created", FieldKind::DateTime),
            FieldMapping::new("due", "s_due", FieldKind::Date),
            FieldMapping::new("owner", "s_owner", FieldKind::Uuid),
            FieldMapping::new("tags", "s_tags", FieldKind::JsonString(Some(&TAG)))
                .default(FieldDefault::EmptyList),
            FieldMapping::new("codes", "s_codes", FieldKind::List(&FieldKind::Int))
                .default(FieldDefault::EmptyList),
            FieldMapping::new("primary", "s_primary", FieldKind::Nested(&TAG)),
        ],
    };

    #[test]
    fn decodes_upstream_encodings() {
        let upstream = json!({
            "s_id": "42",
            "s_name": 7,
            "s_active": "1",
            "s_created": "1700000000",
            "s_due": "2024-03-05 10:11:12",
            "s_owner": "7D3C2A8E-0F51-4A55-9B1C-3C1B3E0B5F10",
            "s_tags": "[{\"t_label\":\"a\",\"t_weight\":\"3\"}]",
            "s_codes": ["1", 2],
            "s_primary": {"t_label": "main"},
        });

        let mapped = map_in(&SAMPLE, &upstream).unwrap();

        assert_eq!(mapped["id"], json!(42));
        assert_eq!(mapped["name"], json!("7"));
        assert_eq!(mapped["active"], json!(true));
        assert_eq!(mapped["created_at"], json!("2023-11-14T22:13:20Z"));
        assert_eq!(mapped["due"], json!("2024-03-05"));
        assert_eq!(mapped["owner"], json!("7d3c2a8e-0f51-4a55-9b1c-3c1b3e0b5f10"));
        assert_eq!(mapped["tags"], json!([{"label": "a", "weight": 3}]));
        assert_eq!(mapped["codes"], json!([1, 2]));
        assert_eq!(mapped["primary"], json!({"label": "main", "weight": 0}));
    }

    #[test]
    fn absent_optional_fields_take_defaults() {
        let mapped = map_in(&SAMPLE, &json!({"s_id": 1, "s_name": "x"})).unwrap();

        assert_eq!(mapped["active"], Value::Null);
        assert_eq!(mapped["tags"], json!([]));
        assert_eq!(mapped["codes"], json!([]));
        assert_eq!(mapped["primary"], Value::Null);
    }

    #[test]
    fn null_bool_is_false() {
        let mapped = map_in(&SAMPLE, &json!({"s_id": 1, "s_name": "x", "s_active": null})).unwrap();
        assert_eq!(mapped["active"], json!(false));
    }

    #[test]
    fn bad_optional_value_degrades_to_default() {
        let mapped = map_in(
            &SAMPLE,
            &json!({"s_id": 1, "s_name": "x", "s_due": "0000-00-00", "s_owner": "nope"}),
        )
        .unwrap();

        assert_eq!(mapped["due"], Value::Null);
        assert_eq!(mapped["owner"], Value::Null);
    }

    #[test]
    fn missing_required_field_is_inbound_error() {
        let err = map_in(&SAMPLE, &json!({"s_name": "x"})).unwrap_err();

        assert_eq!(err.direction, Direction::Inbound);
        assert_eq!(err.table, "sample");
        assert_eq!(err.field, "id");
    }

    #[test]
    fn unparseable_required_int_is_an_error() {
        let err = map_in(&SAMPLE, &json!({"s_id": "abc", "s_name": "x"})).unwrap_err();
        assert_eq!(err.field, "id");
    }

    #[test]
    fn encodes_for_upstream() {
        let public = json!({
            "id": 99,
            "name": "folder",
            "active": true,
            "due": "2024-03-05T00:00:00Z",
            "tags": [{"label": "a", "weight": 2}],
        });

        let out = map_out(&SAMPLE, &public).unwrap();

        assert!(out.get("s_id").is_none(), "read-only fields are not sent");
        assert_eq!(out["s_name"], json!("folder"));
        assert_eq!(out["s_active"], json!(1));
        assert_eq!(out["s_due"], json!("2024-03-05"));
        assert_eq!(out["s_tags"], json!("[{\"t_label\":\"a\",\"t_weight\":2}]"));
        assert_eq!(out["s_codes"], json!([]));
    }

    #[test]
    fn outbound_required_and_type_errors() {
        let missing = map_out(&SAMPLE, &json!({"active": true})).unwrap_err();
        assert_eq!(missing.direction, Direction::Outbound);
        assert_eq!(missing.field, "name");

        let bad = map_out(&SAMPLE, &json!({"name": "x", "active": "maybe"})).unwrap_err();
        assert_eq!(bad.field, "active");
    }

    #[test]
    fn partial_encoding_only_touches_present_keys() {
        let out = map_out_partial(&SAMPLE, &json!({"active": "false"})).unwrap();
        assert_eq!(out, json!({"s_active": 0}));
    }

    #[test]
    fn encode_then_decode_preserves_lossless_fields() {
        let public = json!({
            "id": 5,
            "name": "n",
            "active": false,
            "created_at": "2024-01-02T03:04:05Z",
            "due": "2024-01-02",
            "owner": "7d3c2a8e-0f51-4a55-9b1c-3c1b3e0b5f10",
            "tags": [{"label": "x", "weight": 1}],
            "codes": [3, 4],
            "primary": {"label": "p", "weight": 9},
        });

        let mut upstream = map_out(&SAMPLE, &public).unwrap();
        upstream["s_id"] = json!(5);
        let back = map_in(&SAMPLE, &upstream).unwrap();

        assert_eq!(back, public);
    }

    #[test]
    fn filters_translate_through_table() {
        assert_eq!(
            map_filter(&SAMPLE, "active", "true").unwrap(),
            ("s_active", json!(1))
        );
        assert_eq!(map_filter(&SAMPLE, "name", "x").unwrap(), ("s_name", json!("x")));

        let unknown = map_filter(&SAMPLE, "colour", "red").unwrap_err();
        assert_eq!(unknown.reason, "unknown filter");
        assert!(map_filter(&SAMPLE, "id", "1").is_err(), "read-only fields are not filters");
    }

    #[test]
    fn list_decoding_accepts_keyed_objects() {
        let items = map_in_list(
            &TAG,
            &json!({"a": {"t_label": "x"}, "b": {"t_label": "y"}}),
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert!(map_in_list(&TAG, &json!("nope")).is_err());
        assert!(map_in_list(&TAG, &Value::Null).unwrap().is_empty());
    }
}
