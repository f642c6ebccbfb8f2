//! Query-string routing for templates.

use std::collections::HashMap;

use serde_json::Value;
use tera::{Error, Function, Result};

/// Tera function generating self-referential URLs of the form
/// `{base_path}?{target}&key=value`, matching the query-string routing
/// convention of the application front controller.
///
/// Extra named arguments are appended as query pairs in key order so
/// generated URLs are stable.
#[derive(Debug, Clone)]
pub struct QueryRouteFunction {
    base_path: String,
    debug: bool,
}

impl QueryRouteFunction {
    pub fn new(base_path: impl Into<String>, debug: bool) -> Self {
        Self {
            base_path: base_path.into(),
            debug,
        }
    }

    fn query_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl Function for QueryRouteFunction {
    fn call(&self, args: &HashMap<String, Value>) -> Result<Value> {
        let to = args
            .get("to")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::msg("route() requires a string `to` argument"))?;

        let mut url = format!("{}?{}", self.base_path, to.trim_start_matches('?'));

        let mut extra: Vec<_> = args.iter().filter(|(key, _)| key.as_str() != "to").collect();
        extra.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in extra {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&Self::query_value(value));
        }

        if self.debug {
            tracing::debug!(target = %to, url = %url, "resolved template route");
        }

        Ok(Value::String(url))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(function: &QueryRouteFunction, args: &[(&str, Value)]) -> Result<Value> {
        let args = args
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        function.call(&args)
    }

    #[test]
    fn test_routes_through_base_path() {
        let function = QueryRouteFunction::new("/index", false);
        let url = call(&function, &[("to", Value::String("/users".to_string()))]).unwrap();
        assert_eq!(url, Value::String("/index?/users".to_string()));
    }

    #[test]
    fn test_leading_question_mark_is_stripped() {
        let function = QueryRouteFunction::new("/index", false);
        let url = call(&function, &[("to", Value::String("?/users".to_string()))]).unwrap();
        assert_eq!(url, Value::String("/index?/users".to_string()));
    }

    #[test]
    fn test_extra_arguments_append_in_key_order() {
        let function = QueryRouteFunction::new("/", false);
        let url = call(
            &function,
            &[
                ("to", Value::String("/search".to_string())),
                ("q", Value::String("rust".to_string())),
                ("page", Value::from(2)),
            ],
        )
        .unwrap();
        assert_eq!(url, Value::String("/?/search&page=2&q=rust".to_string()));
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let function = QueryRouteFunction::new("/", true);
        assert!(call(&function, &[("q", Value::String("x".to_string()))]).is_err());
    }
}
