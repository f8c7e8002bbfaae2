use std::fmt::Write as _;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::Value;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Sequence(seq) => {
                let mut out = serializer.serialize_seq(Some(seq.len()))?;
                for item in seq {
                    out.serialize_element(item)?;
                }
                out.end()
            },
            Self::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, item) in map {
                    out.serialize_entry(key, item)?;
                }
                out.end()
            },
            Self::Deferred(deferred) => deferred.evaluate().serialize(serializer),
        }
    }
}

/// Render a composite value on one line, for keys that are not scalars.
pub(super) fn to_compact_string(val: &Value) -> String {
    let mut out = String::new();
    write_compact(&mut out, val);
    out
}

fn write_compact(out: &mut String, val: &Value) {
    match val {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        },
        Value::Integer(i) => {
            let _ = write!(out, "{i}");
        },
        Value::Float(f) => {
            let _ = write!(out, "{f:?}");
        },
        Value::String(s) => out.push_str(s),
        Value::Sequence(seq) => {
            out.push('[');
            for (i, item) in seq.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_compact(out, item);
            }
            out.push(']');
        },
        Value::Mapping(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                write_compact(out, item);
            }
            out.push('}');
        },
        Value::Deferred(_) => out.push_str("<deferred>"),
    }
}
