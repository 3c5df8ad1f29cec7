use crate::{data::Parameters, error::Error};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::debug;

const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Decodes a Ruby-style hash literal (`{"page"=>"1"}`) by turning every `=>` into `:` and
/// reading the result as JSON.
pub fn decode(literal: &str) -> Result<Parameters, Error> {
    let json = literal.replace("=>", ":");
    Ok(serde_json::from_str(&json)?)
}

/// Like [`decode`], but a literal that can't be represented as JSON (unicode escapes Rails
/// writes as `\xE4`, non-string keys, `nil`...) becomes an empty mapping.
pub fn decode_or_default(literal: &str) -> Parameters {
    decode(literal).unwrap_or_else(|e| {
        debug!("Omitting parameters {}: {}", literal, e);
        Parameters::new()
    })
}

/// Form-encodes the parameters. Nested objects and arrays use the bracket notation Rails
/// reads back (`entries[0][id]=1`, `tags[]=a`).
pub fn url_encode(parameters: &Parameters) -> String {
    let mut pairs = Vec::new();

    for (key, value) in parameters {
        collect_pairs(key.clone(), value, &mut pairs);
    }

    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn collect_pairs(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (nested_key, nested_value) in map {
                collect_pairs(format!("{}[{}]", key, nested_key), nested_value, pairs);
            }
        }
        Value::Array(values) => {
            for nested_value in values {
                collect_pairs(format!("{}[]", key), nested_value, pairs);
            }
        }
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Null => pairs.push((key, String::new())),
        other => pairs.push((key, other.to_string())),
    }
}

fn encode_component(component: &str) -> String {
    // '%' itself is escaped, so "%20" can only come from a space
    utf8_percent_encode(component, FORM_VALUE)
        .to_string()
        .replace("%20", "+")
}
