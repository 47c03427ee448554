use serde_json::Value;

/// Masks subscriber numbers and credentials in JSON payloads for logging
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

/// Keeps the network prefix and last two digits of a phone number.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 5 {
        return "****".to_string();
    }

    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 5), tail)
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "phone" | "phone_number" | "msisdn" | "password" | "secret" | "token" | "api_key" | "authorization"
    )
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask_phone(s)),
        Value::Number(n) => Value::String(mask_phone(&n.to_string())),
        _ => Value::String("****".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("0971234567"), "097*****67");
        assert_eq!(mask_phone("12345"), "****");
    }

    #[test]
    fn test_sanitize_phone() {
        let input = json!({
            "phone": "0971234567",
            "amount": "100.00"
        });

        let sanitized = sanitize_json(&input);

        assert_eq!(sanitized["phone"], "097*****67");
        assert_eq!(sanitized["amount"], "100.00");
    }

    #[test]
    fn test_sanitize_nested() {
        let input = json!({
            "subscriber": {
                "msisdn": 260971234567u64,
                "name": "Mwansa"
            },
            "events": [{"token": "abc"}]
        });

        let sanitized = sanitize_json(&input);
        assert_eq!(sanitized["subscriber"]["msisdn"], "260*******67");
        assert_eq!(sanitized["subscriber"]["name"], "Mwansa");
        assert_eq!(sanitized["events"][0]["token"], "****");
    }
}
