//! Literal Coercer: wire-format text to a typed [`Literal`].
//!
//! Coercion is total: anything that does not parse yields `None`, and the
//! caller drops the owning condition.

use crate::reflect::{EnumInfo, Type};
use crate::value::Literal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

type ParseFn = fn(&str) -> Option<Literal>;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Coerces `text` to the type of a resolved member.
///
/// A nullable target accepts `None`; every other target rejects it.
pub fn coerce(text: Option<&str>, target: &Type) -> Option<Literal> {
    match (text, target) {
        (None, Type::Nullable(_)) => Some(Literal::Null),
        (None, _) => None,
        (Some(text), Type::Nullable(inner)) => coerce(Some(text), inner),
        (Some(text), Type::Enum(info)) => parse_enum(text, info),
        (Some(text), other) => parser_for(other).and_then(|parse| parse(text)),
    }
}

/// Dispatch table from scalar kind to its parser.
fn parser_for(target: &Type) -> Option<ParseFn> {
    let parse: ParseFn = match target {
        Type::String => |s| Some(Literal::Str(s.to_string())),
        Type::Bool => parse_bool,
        Type::I8 => |s| s.trim().parse::<i8>().ok().map(|v| Literal::Int(v.into())),
        Type::I16 => |s| s.trim().parse::<i16>().ok().map(|v| Literal::Int(v.into())),
        Type::I32 => |s| s.trim().parse::<i32>().ok().map(|v| Literal::Int(v.into())),
        Type::I64 => |s| s.trim().parse::<i64>().ok().map(Literal::Int),
        Type::F32 => |s| s.trim().parse::<f32>().ok().map(|v| Literal::Float(v.into())),
        Type::F64 => |s| s.trim().parse::<f64>().ok().map(Literal::Float),
        Type::Decimal => parse_decimal,
        Type::Uuid => |s| Uuid::parse_str(s.trim()).ok().map(Literal::Uuid),
        Type::DateTime => |s| parse_date_time(s.trim()).map(Literal::DateTime),
        Type::DateTimeOffset => |s| parse_date_time_offset(s.trim()).map(Literal::DateTimeOffset),
        Type::Enum(_) | Type::Nullable(_) | Type::Object(_) | Type::Collection(_) => return None,
    };
    Some(parse)
}

fn parse_bool(text: &str) -> Option<Literal> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(Literal::Bool(true))
    } else if text.eq_ignore_ascii_case("false") {
        Some(Literal::Bool(false))
    } else {
        None
    }
}

fn parse_decimal(text: &str) -> Option<Literal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .map(Literal::Decimal)
}

fn parse_enum(text: &str, info: &'static EnumInfo) -> Option<Literal> {
    info.ordinal_of(text.trim())
        .map(|ordinal| Literal::Enum { info, ordinal })
}

/// RFC 3339 input is normalised to UTC.
fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    parse_naive(text)
}

/// Input without an offset is taken as UTC.
fn parse_date_time_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    parse_naive(text).map(|naive| naive.and_utc().fixed_offset())
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Decodes the JSON array carried by an `In` condition.
///
/// `None` when the payload is not an array of strings or nulls.
pub fn decode_in_list(text: Option<&str>) -> Option<Vec<Option<String>>> {
    serde_json::from_str(text?).ok()
}
