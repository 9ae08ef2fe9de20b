//! Host value model used by compiled and interpreted serializers
//!
//! Instances are JSON objects keyed by getter method name (`getName`) or field name, with an
//! optional `@type` entry naming the runtime class. An optional is `{"@optional": content}`
//! where a `null` content means empty. A JSON `null` anywhere is a null reference. Dates,
//! strings, characters and enum constants are strings; collections are arrays; maps are
//! objects.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use error_stack::Report;
use serde_json::{Map, Value};

use super::json_generator::JsonGenerator;
use crate::config::DateFormat;
use crate::error::{Error, Result};
use crate::ir::ScalarKind;
use crate::type_descriptor::ClassName;

/// Key naming the runtime class of an instance
pub const TYPE_MARKER: &str = "@type";

/// Key holding the content of an optional
pub const OPTIONAL_MARKER: &str = "@optional";

static NULL: Value = Value::Null;

fn member<'v>(target: &'v Value, name: &str, what: &str) -> Result<&'v Value> {
    match target {
        Value::Object(members) => Ok(members.get(name).unwrap_or(&NULL)),
        other => Err(Report::new(Error::shape_mismatch(what, other))),
    }
}

/// Invoke a getter; an absent entry reads as `null`
///
/// # Errors
///
/// Returns an error when `target` is not an object.
pub fn invoke_getter<'v>(target: &'v Value, method: &str) -> Result<&'v Value> {
    member(target, method, "an instance with getters")
}

/// Read a public field; an absent entry reads as `null`
///
/// # Errors
///
/// Returns an error when `target` is not an object.
pub fn read_field<'v>(target: &'v Value, name: &str) -> Result<&'v Value> {
    member(target, name, "an instance with fields")
}

/// The runtime class recorded on an instance
#[must_use]
pub fn runtime_class(value: &Value) -> Option<&str> {
    value.get(TYPE_MARKER).and_then(Value::as_str)
}

/// Cast an instance onto `class`, failing when it records a different runtime class
///
/// # Errors
///
/// Returns an error when `value` records a runtime class other than `class`.
pub fn checked_cast<'v>(value: &'v Value, class: &ClassName) -> Result<&'v Value> {
    match runtime_class(value) {
        Some(actual) if actual != class.as_str() => Err(Report::new(Error::Serialization(
            format!("cannot cast instance of `{actual}` to `{class}`"),
        ))),
        _ => Ok(value),
    }
}

/// Whether `value` is an optional wrapper, empty or not
#[must_use]
pub fn is_optional(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|members| members.contains_key(OPTIONAL_MARKER))
}

/// Content of an optional, `None` when empty
///
/// # Errors
///
/// Returns an error when `value` is not an optional wrapper.
pub fn optional_content(value: &Value) -> Result<Option<&Value>> {
    match value.get(OPTIONAL_MARKER) {
        Some(Value::Null) => Ok(None),
        Some(content) => Ok(Some(content)),
        None => Err(Report::new(Error::shape_mismatch("an optional", value))),
    }
}

/// Elements of a collection or array value
///
/// # Errors
///
/// Returns an error when `value` is not an array.
pub fn elements(value: &Value) -> Result<&[Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| Report::new(Error::shape_mismatch("a collection", value)))
}

/// Entries of a map value
///
/// # Errors
///
/// Returns an error when `value` is not an object.
pub fn entries(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Report::new(Error::shape_mismatch("a map", value)))
}

/// Write a non-null scalar
///
/// # Errors
///
/// Returns an error when `value` does not have the JSON type `kind` calls for, or the
/// generator rejects the write.
pub fn write_scalar(
    generator: &mut dyn JsonGenerator,
    value: &Value,
    kind: ScalarKind,
) -> Result<()> {
    match (kind, value) {
        (ScalarKind::Boolean, Value::Bool(flag)) => generator.write_bool(*flag),
        (ScalarKind::Number, Value::Number(number)) => generator.write_number(number),
        (ScalarKind::Text | ScalarKind::EnumConstant, Value::String(text)) => {
            generator.write_string(text)
        }
        (ScalarKind::Boolean, other) => Err(Report::new(Error::shape_mismatch("a boolean", other))),
        (ScalarKind::Number, other) => Err(Report::new(Error::shape_mismatch("a number", other))),
        (ScalarKind::Text | ScalarKind::EnumConstant, other) => {
            Err(Report::new(Error::shape_mismatch("a string", other)))
        }
    }
}

/// Write a non-null date or time value
///
/// # Errors
///
/// Returns an error when `value` is not a string or cannot be rendered through `format`.
pub fn write_date(
    generator: &mut dyn JsonGenerator,
    value: &Value,
    format: &DateFormat,
) -> Result<()> {
    let text = value
        .as_str()
        .ok_or_else(|| Report::new(Error::shape_mismatch("a date string", value)))?;
    generator.write_string(&format_date(text, format)?)
}

/// Render ISO date or time text through `format`
///
/// Offset date-times, local date-times, dates and times are tried in that order. A pattern
/// asking for fields the value does not have is an error.
///
/// # Errors
///
/// Returns an error when `text` is not an ISO date or time, or `format` needs fields it lacks.
pub fn format_date(text: &str, format: &DateFormat) -> Result<String> {
    let DateFormat::Pattern(pattern) = format else {
        return Ok(text.to_string());
    };

    let mut rendered = String::new();
    let written = if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        write!(rendered, "{}", date_time.format(pattern))
    } else if let Ok(date_time) = text.parse::<NaiveDateTime>() {
        write!(rendered, "{}", date_time.format(pattern))
    } else if let Ok(date) = text.parse::<NaiveDate>() {
        write!(rendered, "{}", date.format(pattern))
    } else if let Ok(time) = text.parse::<NaiveTime>() {
        write!(rendered, "{}", time.format(pattern))
    } else {
        return Err(Report::new(Error::Serialization(format!(
            "`{text}` is not an ISO date or time"
        ))));
    };

    written.map_err(|_| {
        Report::new(Error::Serialization(format!(
            "date format `{pattern}` does not apply to `{text}`"
        )))
    })?;
    Ok(rendered)
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test assertions")]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_members_default_to_null() {
        let person = json!({ "@type": "com.acme.Person", "getName": "Ada" });
        assert_eq!(invoke_getter(&person, "getName").ok(), Some(&json!("Ada")));
        assert_eq!(invoke_getter(&person, "getAge").ok(), Some(&Value::Null));
        assert!(read_field(&json!(3), "x").is_err());
    }

    #[test]
    fn test_checked_cast() {
        let circle = json!({ "@type": "com.acme.Circle" });
        assert!(checked_cast(&circle, &ClassName::from("com.acme.Circle")).is_ok());
        assert!(checked_cast(&circle, &ClassName::from("com.acme.Square")).is_err());
        assert!(checked_cast(&json!({}), &ClassName::from("com.acme.Square")).is_ok());
    }

    #[test]
    fn test_optional_content() {
        let empty = json!({ "@optional": null });
        let present = json!({ "@optional": 4 });
        assert!(is_optional(&empty));
        assert_eq!(optional_content(&empty).expect("optional"), None);
        assert_eq!(optional_content(&present).expect("optional"), Some(&json!(4)));
        assert!(optional_content(&json!(4)).is_err());
    }

    #[test]
    fn test_format_date() {
        let pattern = DateFormat::Pattern("%d.%m.%Y".to_string());
        assert_eq!(
            format_date("2024-03-09", &pattern).expect("date"),
            "09.03.2024"
        );
        assert_eq!(
            format_date("2024-03-09T10:15:30Z", &pattern).expect("instant"),
            "09.03.2024"
        );
        assert_eq!(
            format_date("2024-03-09T10:15:30", &DateFormat::Iso).expect("iso"),
            "2024-03-09T10:15:30"
        );
        assert!(format_date("10:15", &pattern).is_err());
        assert!(format_date("not a date", &pattern).is_err());
    }
}
