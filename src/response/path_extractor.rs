//! Path-based value extraction from JSON
//!
//! Paths are dotted field names with optional bracket suffixes:
//! - Object field access: "status"
//! - Nested access: "stats.created"
//! - Indexing: "codes[0]", "objectReports[-1]"
//! - All elements: "objectReports[]" or "objectReports[*]"
//! - Array flattening: a field applied to an array is applied to every item,
//!   so "objectReports.uid" yields the uid of each report in document order

use serde_json::Value;

/// One parsed path segment
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(i64),
    All,
}

/// Result of evaluating a path against a JSON document.
///
/// `multi` is set when the path went through an array without picking a
/// single element, in which case `values` holds one entry per match.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub values: Vec<&'a Value>,
    pub multi: bool,
}

impl<'a> Selection<'a> {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Collapse the selection into a single JSON value.
    ///
    /// Multi-valued selections become an array, an empty single selection
    /// becomes `Value::Null`.
    pub fn to_value(&self) -> Value {
        if self.multi {
            Value::Array(self.values.iter().map(|v| (*v).clone()).collect())
        } else {
            self.values.first().map(|v| (*v).clone()).unwrap_or(Value::Null)
        }
    }
}

fn parse_path(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    for part in path.split('.').filter(|s| !s.is_empty()) {
        let (name, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };

        if !name.is_empty() {
            segments.push(Segment::Field(name.to_string()));
        }

        // Any number of bracket suffixes: "matrix[0][1]"
        while let Some(stripped) = rest.strip_prefix('[') {
            let Some(end) = stripped.find(']') else {
                // Unterminated bracket, treat the remainder as a literal field name
                segments.push(Segment::Field(rest.to_string()));
                break;
            };
            let inner = stripped[..end].trim();
            let segment = match inner {
                "" | "*" => Segment::All,
                n => n
                    .parse::<i64>()
                    .map(Segment::Index)
                    .unwrap_or_else(|_| Segment::Field(n.to_string())),
            };
            segments.push(segment);
            rest = &stripped[end + 1..];
        }
    }

    segments
}

/// Evaluate a path expression against a JSON value.
pub fn select<'a>(json: &'a Value, path: &str) -> Selection<'a> {
    let segments = parse_path(path);
    let mut current = vec![json];
    let mut multi = false;

    for segment in &segments {
        let mut next = Vec::new();

        match segment {
            Segment::Field(name) => {
                for value in current {
                    match value {
                        Value::Object(map) => {
                            if let Some(v) = map.get(name) {
                                next.push(v);
                            }
                        }
                        Value::Array(arr) => {
                            // When we hit an array, extract from each item and flatten
                            multi = true;
                            for item in arr {
                                match item.get(name.as_str()) {
                                    Some(Value::Array(inner)) => next.extend(inner.iter()),
                                    Some(v) => next.push(v),
                                    None => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Segment::Index(idx) => {
                for value in current {
                    if let Value::Array(arr) = value {
                        let len = arr.len() as i64;
                        let resolved = if *idx < 0 { len + idx } else { *idx };
                        if (0..len).contains(&resolved) {
                            next.push(&arr[resolved as usize]);
                        }
                    }
                }
            }
            Segment::All => {
                multi = true;
                for value in current {
                    match value {
                        Value::Array(arr) => next.extend(arr.iter()),
                        other => next.push(other),
                    }
                }
            }
        }

        current = next;
        if current.is_empty() {
            break;
        }
    }

    Selection {
        values: current,
        multi,
    }
}

/// Extract a value from JSON using a path expression.
///
/// # Returns
/// The selected value, an array for multi-valued paths, or `Value::Null` if
/// nothing matched
pub fn extract_by_path(json: &Value, path: &str) -> Value {
    select(json, path).to_value()
}

/// Extract a list of values from JSON using a path expression.
///
/// A single array match is expanded into its elements, a single scalar or
/// object becomes a one-element list and no match is an empty list.
pub fn extract_list(json: &Value, path: &str) -> Vec<Value> {
    let selection = select(json, path);

    if selection.multi {
        return selection.values.into_iter().cloned().collect();
    }

    match selection.values.first() {
        Some(Value::Array(arr)) => arr.clone(),
        Some(Value::Null) | None => vec![],
        Some(value) => vec![(*value).clone()],
    }
}

/// Extract the first leaf value at a path as a string.
///
/// Returns `None` when nothing matches or the first match is JSON null.
pub fn extract_first_string(json: &Value, path: &str) -> Option<String> {
    extract_list(json, path)
        .first()
        .and_then(value_to_string)
}

/// Convert a JSON value to a string representation
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> Value {
        json!({
            "status": "OK",
            "stats": {"created": 2, "ignored": 0},
            "bundleReport": {
                "typeReportMap": {
                    "EVENT": {
                        "objectReports": [
                            {"uid": "ev1", "errorReports": []},
                            {"uid": "ev2", "errorReports": [{"message": "late"}]}
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn test_extract_simple_path() {
        let json = report();

        assert_eq!(extract_by_path(&json, "status"), json!("OK"));
        assert_eq!(extract_by_path(&json, "stats.created"), json!(2));
        assert_eq!(extract_by_path(&json, "missing"), Value::Null);
        assert_eq!(extract_by_path(&json, "stats.missing.deeper"), Value::Null);
    }

    #[test]
    fn test_empty_path_selects_root() {
        let json = json!({"a": 1});
        assert_eq!(extract_by_path(&json, ""), json);
    }

    #[test]
    fn test_field_on_array_flattens_in_document_order() {
        let json = report();

        let uids = extract_list(&json, "bundleReport.typeReportMap.EVENT.objectReports.uid");
        assert_eq!(uids, vec![json!("ev1"), json!("ev2")]);

        // Explicit wildcard forms select the same values
        assert_eq!(
            extract_list(&json, "bundleReport.typeReportMap.EVENT.objectReports[].uid"),
            uids
        );
        assert_eq!(
            extract_list(&json, "bundleReport.typeReportMap.EVENT.objectReports[*].uid"),
            uids
        );
    }

    #[test]
    fn test_nested_arrays_are_flattened() {
        let json = report();
        let messages = extract_list(
            &json,
            "bundleReport.typeReportMap.EVENT.objectReports.errorReports.message",
        );
        assert_eq!(messages, vec![json!("late")]);
    }

    #[test]
    fn test_index_access() {
        let json = json!({"codes": ["a", "b", "c"]});

        assert_eq!(extract_by_path(&json, "codes[0]"), json!("a"));
        assert_eq!(extract_by_path(&json, "codes[-1]"), json!("c"));
        assert_eq!(extract_by_path(&json, "codes[7]"), Value::Null);
    }

    #[test]
    fn test_index_after_field_on_array() {
        let json = report();
        assert_eq!(
            extract_by_path(&json, "bundleReport.typeReportMap.EVENT.objectReports[1].uid"),
            json!("ev2")
        );
    }

    #[test]
    fn test_extract_list_no_match_is_empty() {
        let json = report();
        let enrollments = "bundleReport.typeReportMap.ENROLLMENT.objectReports.uid";
        assert!(extract_list(&json, enrollments).is_empty());
        assert!(extract_list(&json, "validationReport.errorReports").is_empty());
    }

    #[test]
    fn test_extract_list_single_values() {
        let json = json!({"completed": true, "items": [1, 2]});

        assert_eq!(extract_list(&json, "completed"), vec![json!(true)]);
        assert_eq!(extract_list(&json, "items"), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_extract_first_string() {
        let json = json!({"name": "test", "count": 42, "flag": false, "gone": null});

        assert_eq!(extract_first_string(&json, "name").as_deref(), Some("test"));
        assert_eq!(extract_first_string(&json, "count").as_deref(), Some("42"));
        assert_eq!(extract_first_string(&json, "flag").as_deref(), Some("false"));
        assert_eq!(extract_first_string(&json, "gone"), None);
        assert_eq!(extract_first_string(&json, "missing"), None);
    }

    #[test]
    fn test_selection_multi_flag() {
        let json = report();

        assert!(!select(&json, "stats.created").multi);
        assert!(select(&json, "bundleReport.typeReportMap.EVENT.objectReports.uid").multi);
        assert!(!select(&json, "bundleReport.typeReportMap.EVENT.objectReports[0].uid").multi);
    }
}
