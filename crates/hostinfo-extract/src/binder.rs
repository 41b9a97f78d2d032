//! Parameter binding.
//!
//! [`bind`] turns the raw inputs of a request (path segments captured by the
//! router, the query string and the headers) into [`BoundParams`] typed
//! according to an operation's parameter schema.
//!
//! Binding is a pure function of its inputs. Parameters are checked in the
//! order the contract declares them and the first failure is reported.
//! Inputs the operation does not declare are ignored.

use crate::{BindingError, PathParams};
use hostinfo_core::{BoundParams, Operation, ParamLocation, ParamSpec, ParamType, ParamValue};
use http::{HeaderMap, Uri};
use std::borrow::Cow;
use std::collections::HashMap;

/// Binds a request's inputs to `operation`'s declared parameters.
///
/// # Example
///
/// ```
/// use hostinfo_core::{Operation, ParamSpec, ParamType};
/// use hostinfo_extract::{bind, PathParams};
/// use http::{HeaderMap, Uri};
///
/// let op = Operation::builder("listItems")
///     .path("/items")
///     .param(ParamSpec::query("limit", ParamType::Integer))
///     .build();
///
/// let uri: Uri = "/items?limit=10&unused=x".parse().unwrap();
/// let params = bind(&op, &uri, &HeaderMap::new(), &PathParams::new()).unwrap();
///
/// assert_eq!(params.get("limit").and_then(|v| v.as_i64()), Some(10));
/// assert!(!params.contains("unused"));
/// ```
pub fn bind(
    operation: &Operation,
    uri: &Uri,
    headers: &HeaderMap,
    path_params: &PathParams,
) -> Result<BoundParams, BindingError> {
    let mut bound = BoundParams::new();
    if operation.parameters().is_empty() {
        return Ok(bound);
    }

    let query = split_query(uri.query());

    for spec in operation.parameters() {
        let raw = match spec.location() {
            ParamLocation::Path => path_value(spec, path_params)?,
            ParamLocation::Query => query_value(spec, &query)?,
            ParamLocation::Header => header_value(spec, headers)?.map(Cow::Borrowed),
        };

        match raw {
            Some(raw) => {
                let value = parse_value(spec, &raw)?;
                bound.insert(spec.name(), value);
            }
            None if spec.is_required() => {
                return Err(BindingError::missing(spec.location(), spec.name()));
            }
            None => bound.insert_absent(spec.name()),
        }
    }

    Ok(bound)
}

/// Splits the query string into pairs keyed by decoded name. Values stay
/// percent-encoded until a declared parameter asks for them. The first
/// occurrence of a repeated key wins; keys that do not decode cannot name a
/// declared parameter and are skipped.
fn split_query(query: Option<&str>) -> HashMap<String, &str> {
    let mut map = HashMap::new();
    for pair in query.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if let Ok(key) = decode_component(key) {
            map.entry(key.into_owned()).or_insert(value);
        }
    }
    map
}

fn query_value<'a>(
    spec: &ParamSpec,
    query: &HashMap<String, &'a str>,
) -> Result<Option<Cow<'a, str>>, BindingError> {
    query
        .get(spec.name())
        .copied()
        .map(|raw| {
            decode_component(raw)
                .map_err(|e| BindingError::malformed(ParamLocation::Query, spec.name(), e))
        })
        .transpose()
}

/// Form-decodes one query component: `+` is a space, then percent escapes
/// are resolved and the bytes must be UTF-8.
fn decode_component(raw: &str) -> Result<Cow<'_, str>, std::string::FromUtf8Error> {
    if raw.contains('+') {
        urlencoding::decode(&raw.replace('+', " ")).map(|s| Cow::Owned(s.into_owned()))
    } else {
        urlencoding::decode(raw)
    }
}

fn path_value<'a>(
    spec: &ParamSpec,
    path_params: &'a PathParams,
) -> Result<Option<Cow<'a, str>>, BindingError> {
    path_params
        .get(spec.name())
        .map(|raw| {
            urlencoding::decode(raw)
                .map_err(|e| BindingError::malformed(ParamLocation::Path, spec.name(), e))
        })
        .transpose()
}

fn header_value<'a>(
    spec: &ParamSpec,
    headers: &'a HeaderMap,
) -> Result<Option<&'a str>, BindingError> {
    headers
        .get(spec.name().to_ascii_lowercase().as_str())
        .map(|value| {
            value.to_str().map_err(|_| {
                BindingError::malformed(
                    ParamLocation::Header,
                    spec.name(),
                    "value is not visible ASCII",
                )
            })
        })
        .transpose()
}

fn parse_value(spec: &ParamSpec, raw: &str) -> Result<ParamValue, BindingError> {
    let invalid =
        || BindingError::invalid_type(spec.location(), spec.name(), spec.param_type(), raw);

    match spec.param_type() {
        ParamType::String => Ok(ParamValue::String(raw.to_string())),
        ParamType::Integer => raw
            .parse::<i64>()
            .map(ParamValue::Integer)
            .map_err(|_| invalid()),
        ParamType::Number => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(ParamValue::Number(n)),
            _ => Err(invalid()),
        },
        ParamType::Boolean => match raw {
            "true" => Ok(ParamValue::Boolean(true)),
            "false" => Ok(ParamValue::Boolean(false)),
            _ => Err(invalid()),
        },
    }
}
