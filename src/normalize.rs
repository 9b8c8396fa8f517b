use serde_json::{Map, Value};

/// The address-line fields whose names collide with the `FromFull`/`ToFull`
/// address collections. They are suffixed before conversion so they land on
/// the `from_email`/`to_email`/`cc_email`/`bcc_email` columns.
const ADDRESS_LINE_KEYS: [&str; 4] = ["From", "To", "Cc", "Bcc"];

/// Convert a CapitalizedWords key to lowercase_underscore form.
///
/// A separator is inserted before an uppercase letter that starts an
/// uppercase-then-lowercase run, and before an uppercase letter that follows
/// a lowercase letter or digit. `MessageID` becomes `message_id`,
/// `OriginalRecipient` becomes `original_recipient`.
pub fn camel_to_underscore(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut converted = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars
                .get(i + 1)
                .map_or(false, |next| next.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || next_is_lower {
                converted.push('_');
            }
        }
        converted.push(c.to_ascii_lowercase());
    }

    converted
}

/// Recursively rewrite every object key in the payload from Postmark's
/// capitalized naming to our internal naming. Arrays and scalars pass
/// through untouched apart from the recursion. Applying this to an already
/// normalized tree is a no-op.
pub fn underscoreize(value: Value) -> Value {
    match value {
        Value::Object(fields) => {
            let mut converted = Map::with_capacity(fields.len());
            for (key, value) in fields {
                let key = if ADDRESS_LINE_KEYS.contains(&key.as_str()) {
                    format!("{key}Email")
                } else {
                    key
                };
                converted.insert(camel_to_underscore(&key), underscoreize(value));
            }
            Value::Object(converted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(underscoreize).collect()),
        scalar => scalar,
    }
}
