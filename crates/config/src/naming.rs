//! Conversion of external naming conventions to record field names.
//!
//! CSV header titles, XML attributes and similar external tokens arrive in
//! whatever convention the producing system uses. Bound record types on this
//! side use snake_case fields, so all of `POSTAL_ADDRESS`, `postal-address`,
//! `Postal Address` and `postalAddress` must resolve to `postal_address`.

/// Converts an external token to a snake_case field name.
///
/// Words are split on `_`, `-`, `.`, whitespace and on camel-case
/// transitions, then lowercased and joined with `_`. Acronym runs keep their
/// last capital with the following word, so `HTTPServer` becomes
/// `http_server`.
pub fn to_field_name(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (index, &ch) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' || ch == '.' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[index - 1];
            let next_is_lower = chars
                .get(index + 1)
                .is_some_and(|next| next.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join("_")
}
