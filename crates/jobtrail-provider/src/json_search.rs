//! Generic recursive search through arbitrarily nested JSON.
//!
//! Careers pages bury their payloads at unpredictable depths inside embedded
//! state objects, and the nesting shifts between deployments. Rather than
//! hard-coding a path per provider, adapters look up the first occurrence of
//! a named key anywhere in the document.

use scraper::{Html, Selector};
use serde_json::Value;

/// Find the value of the first occurrence of `key` anywhere in `value`,
/// depth-first, objects before their siblings.
#[must_use]
pub fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if let Some(found) = map.get(key) {
                return Some(found);
            }
            map.values().find_map(|child| find_key(child, key))
        }
        Value::Array(items) => items.iter().find_map(|item| find_key(item, key)),
        _ => None,
    }
}

/// Parse every `<script type="application/json">` block in `html` into a
/// JSON value. Blocks that fail to parse are skipped.
#[must_use]
pub fn extract_script_json(html: &str) -> Vec<Value> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(r#"script[type="application/json"]"#).expect("valid script selector");

    document
        .select(&selector)
        .filter_map(|script| {
            let text: String = script.text().collect();
            serde_json::from_str(&text).ok()
        })
        .collect()
}

/// Search every embedded JSON block of a page for `key`, returning the
/// first hit.
#[must_use]
pub fn find_key_in_page(html: &str, key: &str) -> Option<Value> {
    extract_script_json(html)
        .iter()
        .find_map(|value| find_key(value, key).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_key_top_level() {
        let value = json!({"count": 42});
        assert_eq!(find_key(&value, "count"), Some(&json!(42)));
    }

    #[test]
    fn test_find_key_deeply_nested() {
        let value = json!({
            "data": {
                "payload": [
                    {"irrelevant": 1},
                    {"wrapper": {"job_post_list": [{"id": "1"}]}}
                ]
            }
        });
        let found = find_key(&value, "job_post_list").expect("key present");
        assert_eq!(found, &json!([{"id": "1"}]));
    }

    #[test]
    fn test_find_key_absent() {
        let value = json!({"data": {"other": []}});
        assert!(find_key(&value, "job_post_list").is_none());
    }

    #[test]
    fn test_find_key_inside_array_of_scalars() {
        let value = json!([1, "two", null, {"target": true}]);
        assert_eq!(find_key(&value, "target"), Some(&json!(true)));
    }

    #[test]
    fn test_extract_script_json() {
        let html = r#"
            <html><head>
            <script type="application/json">{"a": 1}</script>
            <script type="text/javascript">var x = 1;</script>
            <script type="application/json">not json</script>
            <script type="application/json">{"b": {"c": 2}}</script>
            </head><body></body></html>
        "#;

        let blocks = extract_script_json(html);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_find_key_in_page() {
        let html = r#"
            <html><body>
            <script type="application/json">{"noise": []}</script>
            <script type="application/json">{"outer": {"prospective_applications": [{"id": "9"}]}}</script>
            </body></html>
        "#;

        let found = find_key_in_page(html, "prospective_applications").expect("key present");
        assert_eq!(found, json!([{"id": "9"}]));
    }
}
