use super::*;
use crate::parser::SqlParser;

fn parse_and_extract(sql: &str) -> Vec<String> {
    let stmts = SqlParser::duckdb().parse(sql).unwrap();
    extract_dependencies(&stmts).into_iter().collect()
}

#[test]
fn test_extract_from_simple_select() {
    assert_eq!(
        parse_and_extract("SELECT COUNT(*) FROM songs WHERE title IS NULL"),
        vec!["songs"]
    );
}

#[test]
fn test_extract_quoted_name_is_unquoted() {
    assert_eq!(
        parse_and_extract(r#"SELECT COUNT(*) FROM "time" WHERE weekday IS NULL"#),
        vec!["time"]
    );
}

#[test]
fn test_extract_from_left_join() {
    let deps = parse_and_extract(
        "SELECT COUNT(*) FROM songplays sp LEFT OUTER JOIN users us ON us.userid = sp.userid WHERE us.userid IS NULL",
    );
    assert_eq!(deps, vec!["songplays", "users"]);
}

#[test]
fn test_extract_from_subquery() {
    let deps = parse_and_extract(
        "SELECT e.userid FROM (SELECT * FROM staging_events WHERE page = 'NextSong') e JOIN staging_songs s ON e.song = s.title",
    );
    assert_eq!(deps, vec!["staging_events", "staging_songs"]);
}

#[test]
fn test_extract_schema_qualified() {
    let deps = parse_and_extract("SELECT COUNT(*) FROM public.artists");
    assert_eq!(deps, vec!["public.artists"]);
    assert_eq!(unqualified(&deps[0]), "artists");
    assert_eq!(unqualified("artists"), "artists");
}

#[test]
fn test_extract_from_union() {
    let deps = parse_and_extract("SELECT userid FROM users UNION SELECT userid FROM songplays");
    assert_eq!(deps, vec!["songplays", "users"]);
}
