//! String helpers shared by the generators and the printer.

/// Whether a property key must be quoted in an object type or literal.
pub fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    !(first.is_ascii_alphabetic() || first == '_' || first == '$')
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape backslashes and double quotes for a double-quoted string literal.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a property key if it is not a plain identifier.
pub fn quote_if_needed(name: &str) -> String {
    if needs_quoting(name) {
        format!("\"{}\"", escape_js_string(name))
    } else {
        name.to_string()
    }
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_quoting() {
        assert!(!needs_quoting("userName"));
        assert!(!needs_quoting("_bestFriend"));
        assert!(!needs_quoting("$it"));
        assert!(needs_quoting(""));
        assert!(needs_quoting("1st"));
        assert!(needs_quoting("User-Name"));
        assert!(needs_quoting("odata.type"));
    }

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("name"), "name");
        assert_eq!(quote_if_needed("User Name"), "\"User Name\"");
        assert_eq!(quote_if_needed("say\"hi"), "\"say\\\"hi\"");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("getNearestAirport"), "GetNearestAirport");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("ABC"), "ABC");
    }
}
