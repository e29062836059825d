//! SQL literal and identifier quoting utilities
//!
//! Table names in this workflow are trusted constants and are substituted
//! verbatim. Values that come from configuration (storage URIs, regions,
//! credentials, JSON paths) go through these helpers instead.

/// Quote a SQL identifier, doubling any embedded double quotes.
///
/// # Examples
/// ```
/// use sf_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("time"), r#""time""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a value as a complete single-quoted SQL string literal.
///
/// # Examples
/// ```
/// use sf_core::sql_utils::quote_literal;
/// assert_eq!(quote_literal("us-west-2"), "'us-west-2'");
/// assert_eq!(quote_literal("it's"), "'it''s'");
/// ```
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_simple() {
        assert_eq!(quote_ident("level"), r#""level""#);
    }

    #[test]
    fn test_escape_sql_string_injection() {
        let escaped = escape_sql_string("x'; DROP TABLE songplays; --");
        assert_eq!(escaped, "x''; DROP TABLE songplays; --");
    }

    #[test]
    fn test_quote_literal_empty() {
        assert_eq!(quote_literal(""), "''");
    }
}
