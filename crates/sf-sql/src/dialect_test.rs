use super::*;

#[test]
fn test_duckdb_parse() {
    let dialect = DuckDbDialect::new();
    let stmts = dialect
        .parse(r#"SELECT COUNT(DISTINCT "level") FROM songplays"#)
        .unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_quote_ident() {
    let dialect = DuckDbDialect::new();
    assert_eq!(dialect.quote_ident("time"), "\"time\"");
    assert_eq!(dialect.quote_ident("a\"b"), "\"a\"\"b\"");
}

#[test]
fn test_location_from_message() {
    assert_eq!(
        location_from_message("Expected: an expression, found: ) at Line: 3, Column: 14"),
        (3, 14)
    );
    assert_eq!(location_from_message("sql parser error: boom"), (0, 0));
}

#[test]
fn test_parse_error_carries_message() {
    let dialect = DuckDbDialect::new();
    let err = dialect.parse("SELECT COUNT( FROM songs").unwrap_err();
    match err {
        SqlError::ParseError { message, .. } => assert!(!message.is_empty()),
        other => panic!("expected parse error, got {other:?}"),
    }
}
