//! Conversions from format-specific trees into the shared `serde_json::Value`.
//!
//! YAML and TOML both carry types JSON cannot express directly (non-string
//! mapping keys, tagged values, datetimes). These are lowered explicitly
//! instead of going through serde, so the result never contains
//! format-private artifacts.

use serde_json::{Map, Number, Value};

/// Lower a YAML tree. Non-string mapping keys are stringified, tags dropped.
pub fn from_yaml(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(from_yaml).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(k), from_yaml(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        // NaN and infinities have no JSON form
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Null => "null".into(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

/// Lower a TOML table. Datetimes become their RFC 3339 text.
pub fn from_toml_table(table: toml::Table) -> Value {
    Value::Object(
        table
            .into_iter()
            .map(|(k, v)| (k, from_toml(v)))
            .collect::<Map<_, _>>(),
    )
}

fn from_toml(value: toml::Value) -> Value {
    use toml::Value as Toml;

    match value {
        Toml::String(s) => Value::String(s),
        Toml::Integer(i) => Value::from(i),
        Toml::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        Toml::Boolean(b) => Value::Bool(b),
        Toml::Datetime(dt) => Value::String(dt.to_string()),
        Toml::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        Toml::Table(table) => from_toml_table(table),
    }
}

/// Short type name used in error messages.
pub const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
