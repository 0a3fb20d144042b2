use serde_json::{Map, Value};

/// Largest integer every JSON consumer can hold without losing precision.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Rewrites integers outside `±MAX_SAFE_INTEGER` as decimal strings, at any
/// depth of the payload.
pub fn sanitize_payload(value: Value) -> Value {
    match value {
        Value::Number(number) => {
            let unsafe_int = match (number.as_i64(), number.as_u64()) {
                (Some(v), _) => !(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&v),
                (None, Some(_)) => true,
                (None, None) => false,
            };
            if unsafe_int {
                Value::String(number.to_string())
            } else {
                Value::Number(number)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_payload).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, sanitize_payload(value)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn stringifies_large_integers_at_any_depth() {
        let payload = json!([
            { "user_id": 9_007_199_254_740_993i64, "nested": { "ids": [1, u64::MAX] } },
            { "user_id": -9_007_199_254_740_993i64 }
        ]);

        let sanitized = sanitize_payload(payload);

        assert_eq!(sanitized[0]["user_id"], json!("9007199254740993"));
        assert_eq!(sanitized[0]["nested"]["ids"], json!([1, "18446744073709551615"]));
        assert_eq!(sanitized[1]["user_id"], json!("-9007199254740993"));
    }

    #[test]
    fn leaves_safe_values_untouched() {
        let payload = json!({
            "user_id": MAX_SAFE_INTEGER,
            "avg_completion_ratio": 0.8,
            "label": "x",
            "flag": true,
            "none": null
        });
        assert_eq!(sanitize_payload(payload.clone()), payload);
    }
}
