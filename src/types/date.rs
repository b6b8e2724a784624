use crate::error::{DepotError, Result};
use crate::types::{
    base_query_operator, base_update_operator, require, resolve_missing, type_name, value_cmp,
    QueryOperator, SchemaType, TypeOptions, UpdateOperator,
};
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};

/// Date fields. In memory a date is an integer epoch-millisecond number;
/// the persisted form is an RFC 3339 string.
pub struct DateType {
    options: TypeOptions,
}

impl DateType {
    pub fn new(options: TypeOptions) -> Self {
        DateType { options }
    }
}

/// Decode either representation to epoch milliseconds. Accepts RFC 3339
/// strings and plain `YYYY-MM-DD` dates (midnight UTC).
fn to_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.timestamp_millis())
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc().timestamp_millis())
            }),
        _ => None,
    }
}

fn to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(to_millis(value)?).single()
}

enum Part {
    Year,
    Month,
    Day,
}

fn matches_part(value: Option<&Value>, query: &Value, part: Part) -> bool {
    let Some(dt) = value.and_then(to_datetime) else {
        return false;
    };
    let component = match part {
        Part::Year => dt.year() as i64,
        Part::Month => dt.month() as i64,
        Part::Day => dt.day() as i64,
    };
    query.as_i64() == Some(component)
}

fn shift_millis(value: Option<&Value>, arg: &Value, sign: i64) -> Result<Option<Value>> {
    let delta = arg
        .as_i64()
        .ok_or_else(|| DepotError::Type("date operator expects a millisecond argument".into()))?;
    let base = value.and_then(to_millis).unwrap_or(0);
    Ok(Some(Value::Number(Number::from(base + sign * delta))))
}

impl SchemaType for DateType {
    fn name(&self) -> &'static str {
        "Date"
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn cast(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        resolve_missing(value, &self.options).map(|v| match to_millis(&v) {
            Some(ms) => Value::Number(Number::from(ms)),
            None => v,
        })
    }

    fn validate(&self, value: Option<&Value>, _doc: &mut Value) -> Result<Option<Value>> {
        let value = require(resolve_missing(value, &self.options), &self.options)?;
        match &value {
            Some(v) if !v.is_null() => match to_millis(v) {
                Some(ms) => Ok(Some(Value::Number(Number::from(ms)))),
                None => Err(DepotError::Validation(format!(
                    "expected date, got {}",
                    type_name(v)
                ))),
            },
            _ => Ok(value),
        }
    }

    fn parse(&self, value: Option<&Value>) -> Option<Value> {
        let v = value?;
        match to_millis(v) {
            Some(ms) => Some(Value::Number(Number::from(ms))),
            None => Some(v.clone()),
        }
    }

    fn export(&self, value: Option<&Value>, _doc: &Value) -> Option<Value> {
        let v = value?;
        match to_datetime(v) {
            Some(dt) => Some(Value::String(
                dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            None => Some(v.clone()),
        }
    }

    fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
        match (a.and_then(to_millis), b.and_then(to_millis)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => value_cmp(a, b),
        }
    }

    fn matches(&self, value: Option<&Value>, query: &Value, _doc: &Value) -> bool {
        match (value.and_then(to_millis), to_millis(query)) {
            (Some(x), Some(y)) => x == y,
            _ => match value {
                Some(v) => v == query,
                None => query.is_null(),
            },
        }
    }

    fn query_operator(&self, name: &str) -> Option<QueryOperator> {
        let op: QueryOperator = match name {
            "$year" => |_ty, value, query, _doc| matches_part(value, query, Part::Year),
            "$month" => |_ty, value, query, _doc| matches_part(value, query, Part::Month),
            "$day" => |_ty, value, query, _doc| matches_part(value, query, Part::Day),
            _ => return base_query_operator(name),
        };
        Some(op)
    }

    fn update_operator(&self, name: &str) -> Option<UpdateOperator> {
        let op: UpdateOperator = match name {
            "$inc" => |_ty, value, arg, _doc, _path| shift_millis(value, arg, 1),
            "$dec" => |_ty, value, arg, _doc, _path| shift_millis(value, arg, -1),
            _ => return base_update_operator(name),
        };
        Some(op)
    }
}
