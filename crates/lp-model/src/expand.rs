//! Expansion of constant sources into plain numbers.
//!
//! Each entry of an expansion config names where its value comes from:
//!
//! | prefix                          | source                                      |
//! |---------------------------------|---------------------------------------------|
//! | `value:<number>`                | literal                                     |
//! | `param:<KEY>` / `config_pid:`   | key/value parameter file                    |
//! | `json:<a.b[0].c>` / `config_drone:` | dotted path into a JSON document        |
//! | `calc:<expr>`                   | expression over already expanded entries   |
//!
//! `calc:` entries run after every direct entry. They are retried in passes
//! like resolved constants, so one may refer to any other entry regardless of
//! key order. Entries still unresolved after a pass without progress are
//! reported together.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::expr::{Expr, ExprError};

pub struct ConstantSources<'a> {
    pub params: &'a BTreeMap<String, f64>,
    pub document: &'a Value,
}

/// Parse `KEY value` lines. Blank lines and `#` comments are skipped.
pub fn parse_param_file(text: &str) -> ModelResult<BTreeMap<String, f64>> {
    let mut out = BTreeMap::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let key = parts.next().unwrap_or_default();
        let value = parts.next().map(str::trim).unwrap_or_default();
        let value: f64 = value.parse().map_err(|_| {
            ModelError::config(format!(
                "parameter line {}: expected 'KEY number', got '{line}'",
                lineno + 1
            ))
        })?;
        out.insert(key.to_string(), value);
    }
    Ok(out)
}

/// Follow a dotted path such as `rotors[2].arm_length` through `doc`.
pub fn lookup_path(doc: &Value, path: &str) -> Option<f64> {
    let mut cur = doc;
    for segment in path.split('.') {
        let (key, indices) = match segment.find('[') {
            Some(i) => (&segment[..i], &segment[i..]),
            None => (segment, ""),
        };
        if !key.is_empty() {
            cur = cur.get(key)?;
        }
        for index in indices.split('[').filter(|s| !s.is_empty()) {
            let i: usize = index.strip_suffix(']')?.trim().parse().ok()?;
            cur = cur.get(i)?;
        }
    }
    cur.as_f64()
}

pub fn expand_constants(
    config: &BTreeMap<String, String>,
    sources: &ConstantSources<'_>,
) -> ModelResult<BTreeMap<String, f64>> {
    let mut expanded = BTreeMap::new();
    let mut calcs = Vec::new();

    for (name, spec) in config {
        let (prefix, rest) = spec
            .split_once(':')
            .ok_or_else(|| ModelError::config(format!("{name}: missing source prefix in '{spec}'")))?;
        let value = match prefix {
            "value" => rest.trim().parse::<f64>().map_err(|_| {
                ModelError::config(format!("{name}: '{rest}' is not a number"))
            })?,
            "param" | "config_pid" => sources.params.get(rest.trim()).copied().ok_or_else(|| {
                ModelError::config(format!("{name}: parameter '{rest}' not found"))
            })?,
            "json" | "config_drone" => lookup_path(sources.document, rest.trim()).ok_or_else(|| {
                ModelError::config(format!("{name}: no number at JSON path '{rest}'"))
            })?,
            "calc" => {
                calcs.push((name, rest));
                continue;
            }
            other => {
                return Err(ModelError::config(format!(
                    "{name}: unknown source prefix '{other}'"
                )));
            }
        };
        expanded.insert(name.clone(), value);
    }

    let mut pending = calcs
        .into_iter()
        .map(|(name, src)| {
            Expr::parse(src)
                .map(|e| (name, e))
                .map_err(|e| ModelError::expression(name, e))
        })
        .collect::<ModelResult<Vec<_>>>()?;

    while !pending.is_empty() {
        let before = pending.len();
        let mut deferred = Vec::new();
        for (name, expr) in pending {
            match expr.eval(&expanded) {
                Ok(value) => {
                    debug!(name = %name, value, "calculated constant");
                    expanded.insert(name.clone(), value);
                }
                Err(ExprError::UnknownName { .. }) => deferred.push((name, expr)),
                Err(e) => return Err(ModelError::expression(name, e)),
            }
        }
        if deferred.len() == before {
            return Err(ModelError::CircularOrUndefinedConstant {
                names: deferred.into_iter().map(|(n, _)| n.clone()).collect(),
            });
        }
        pending = deferred;
    }

    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_parameter_file() {
        let text = "# gains\nKP 1.5\n\nKD   0.25  \n";
        let params = parse_param_file(text).unwrap();
        assert_eq!(params.get("KP"), Some(&1.5));
        assert_eq!(params.get("KD"), Some(&0.25));

        assert!(parse_param_file("KP fast\n").is_err());
    }

    #[test]
    fn looks_up_nested_paths() {
        let doc = json!({ "body": { "mass": 1.2, "rotors": [{ "arm": 0.1 }, { "arm": 0.2 }] } });
        assert_eq!(lookup_path(&doc, "body.mass"), Some(1.2));
        assert_eq!(lookup_path(&doc, "body.rotors[1].arm"), Some(0.2));
        assert_eq!(lookup_path(&doc, "body.rotors[5].arm"), None);
        assert_eq!(lookup_path(&doc, "body.missing"), None);
    }

    #[test]
    fn expands_all_sources() {
        let params: BTreeMap<String, f64> = [("KP".to_string(), 2.0)].into_iter().collect();
        let doc = json!({ "body": { "mass": 4.0 } });
        let config: BTreeMap<String, String> = [
            ("a", "value:3"),
            ("b", "param:KP"),
            ("c", "config_drone:body.mass"),
            ("d", "calc:a * b + c"),
            ("e", "calc:d / 2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let out = expand_constants(
            &config,
            &ConstantSources {
                params: &params,
                document: &doc,
            },
        )
        .unwrap();

        assert_eq!(out["a"], 3.0);
        assert_eq!(out["b"], 2.0);
        assert_eq!(out["c"], 4.0);
        assert_eq!(out["d"], 10.0);
        assert_eq!(out["e"], 5.0);
    }

    #[test]
    fn reports_missing_sources() {
        let params = BTreeMap::new();
        let doc = json!({});
        let sources = ConstantSources {
            params: &params,
            document: &doc,
        };
        let one = |spec: &str| {
            let config: BTreeMap<String, String> = [("x".to_string(), spec.to_string())].into();
            expand_constants(&config, &sources)
        };

        assert!(matches!(one("param:NOPE"), Err(ModelError::Config { .. })));
        assert!(matches!(one("json:a.b"), Err(ModelError::Config { .. })));
        assert!(matches!(one("url:http"), Err(ModelError::Config { .. })));
        assert!(matches!(
            one("calc:y + 1"),
            Err(ModelError::CircularOrUndefinedConstant { names }) if names == ["x"]
        ));
        assert!(matches!(one("calc:1 +"), Err(ModelError::Expression { .. })));
    }

    #[test]
    fn calc_entries_resolve_against_key_order() {
        let params = BTreeMap::new();
        let doc = json!({});
        let config: BTreeMap<String, String> = [
            ("z", "calc:2"),
            ("a", "calc:z * 3"),
            ("tau", "calc:a + z"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let out = expand_constants(
            &config,
            &ConstantSources {
                params: &params,
                document: &doc,
            },
        )
        .unwrap();

        assert_eq!(out["z"], 2.0);
        assert_eq!(out["a"], 6.0);
        assert_eq!(out["tau"], 8.0);
    }
}
