//! SQL template library
//!
//! The SELECT statements that populate the fact and dimension tables from
//! the staging tables, the DDL for every table, and the two statement
//! builders used by the load tasks.
//!
//! All table names here are fixed constants. [`insert_into`] and
//! [`delete_all`] substitute their arguments into SQL text without escaping
//! anything beyond identifier quoting, and must only be called with trusted
//! table names and statement bodies.

use sf_core::sql_utils::quote_ident;
use sf_core::TableName;

pub const STAGING_EVENTS: &str = "staging_events";
pub const STAGING_SONGS: &str = "staging_songs";
pub const SONGPLAYS: &str = "songplays";
pub const USERS: &str = "users";
pub const SONGS: &str = "songs";
pub const ARTISTS: &str = "artists";
pub const TIME: &str = "time";

/// Rows of the `songplays` fact table: one per `NextSong` event, matched to
/// song metadata on title, artist name and duration where possible.
pub const SONGPLAY_TABLE_INSERT: &str = r#"SELECT
    md5(CAST(events.sessionid AS VARCHAR) || CAST(events.start_time AS VARCHAR)) AS playid,
    events.start_time,
    events.userid,
    events."level",
    songs.song_id,
    songs.artist_id,
    events.sessionid,
    events.location,
    events.useragent
FROM (
    SELECT epoch_ms(ts) AS start_time, *
    FROM staging_events
    WHERE page = 'NextSong'
) events
LEFT JOIN staging_songs songs
    ON events.song = songs.title
    AND events.artist = songs.artist_name
    AND events.length = songs.duration"#;

pub const USER_TABLE_INSERT: &str = r#"SELECT DISTINCT userid, firstname, lastname, gender, "level"
FROM staging_events
WHERE page = 'NextSong'"#;

pub const SONG_TABLE_INSERT: &str = r#"SELECT DISTINCT song_id, title, artist_id, "year", duration
FROM staging_songs"#;

pub const ARTIST_TABLE_INSERT: &str = r#"SELECT DISTINCT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM staging_songs"#;

pub const TIME_TABLE_INSERT: &str = r#"SELECT DISTINCT
    start_time,
    hour(start_time),
    day(start_time),
    week(start_time),
    month(start_time),
    year(start_time),
    CAST(dayofweek(start_time) AS VARCHAR)
FROM songplays"#;

/// Column order matches the JSONPaths document for the event log, since
/// that format maps fields to columns by position.
pub const CREATE_STAGING_EVENTS: &str = r#"CREATE TABLE IF NOT EXISTS staging_events (
    artist VARCHAR,
    auth VARCHAR,
    firstname VARCHAR,
    gender VARCHAR,
    iteminsession INTEGER,
    lastname VARCHAR,
    length DOUBLE,
    "level" VARCHAR,
    location VARCHAR,
    "method" VARCHAR,
    page VARCHAR,
    registration DOUBLE,
    sessionid INTEGER,
    song VARCHAR,
    status INTEGER,
    ts BIGINT,
    useragent VARCHAR,
    userid INTEGER
)"#;

pub const CREATE_STAGING_SONGS: &str = r#"CREATE TABLE IF NOT EXISTS staging_songs (
    num_songs INTEGER,
    artist_id VARCHAR,
    artist_name VARCHAR,
    artist_latitude DOUBLE,
    artist_longitude DOUBLE,
    artist_location VARCHAR,
    song_id VARCHAR,
    title VARCHAR,
    duration DOUBLE,
    "year" INTEGER
)"#;

// No primary key: the fact table is append-only and a re-run of the same
// interval appends the same plays again.
pub const CREATE_SONGPLAYS: &str = r#"CREATE TABLE IF NOT EXISTS songplays (
    playid VARCHAR NOT NULL,
    start_time TIMESTAMP NOT NULL,
    userid INTEGER,
    "level" VARCHAR,
    songid VARCHAR,
    artistid VARCHAR,
    sessionid INTEGER,
    location VARCHAR,
    user_agent VARCHAR
)"#;

pub const CREATE_USERS: &str = r#"CREATE TABLE IF NOT EXISTS users (
    userid INTEGER NOT NULL,
    first_name VARCHAR,
    last_name VARCHAR,
    gender VARCHAR,
    "level" VARCHAR
)"#;

pub const CREATE_SONGS: &str = r#"CREATE TABLE IF NOT EXISTS songs (
    songid VARCHAR NOT NULL,
    title VARCHAR,
    artistid VARCHAR,
    "year" INTEGER,
    duration DOUBLE
)"#;

pub const CREATE_ARTISTS: &str = r#"CREATE TABLE IF NOT EXISTS artists (
    artistid VARCHAR NOT NULL,
    name VARCHAR,
    location VARCHAR,
    lattitude DOUBLE,
    longitude DOUBLE
)"#;

pub const CREATE_TIME: &str = r#"CREATE TABLE IF NOT EXISTS "time" (
    start_time TIMESTAMP NOT NULL,
    "hour" INTEGER,
    "day" INTEGER,
    week INTEGER,
    "month" INTEGER,
    "year" INTEGER,
    weekday VARCHAR
)"#;

/// A table and the statement that creates it
#[derive(Debug, Clone, Copy)]
pub struct TableDefinition {
    pub name: &'static str,
    pub ddl: &'static str,
}

/// Every table the workflow reads or writes, staging tables first
pub fn table_definitions() -> [TableDefinition; 7] {
    [
        TableDefinition {
            name: STAGING_EVENTS,
            ddl: CREATE_STAGING_EVENTS,
        },
        TableDefinition {
            name: STAGING_SONGS,
            ddl: CREATE_STAGING_SONGS,
        },
        TableDefinition {
            name: SONGPLAYS,
            ddl: CREATE_SONGPLAYS,
        },
        TableDefinition {
            name: USERS,
            ddl: CREATE_USERS,
        },
        TableDefinition {
            name: SONGS,
            ddl: CREATE_SONGS,
        },
        TableDefinition {
            name: ARTISTS,
            ddl: CREATE_ARTISTS,
        },
        TableDefinition {
            name: TIME,
            ddl: CREATE_TIME,
        },
    ]
}

/// Every load SELECT, keyed by the table it populates
pub fn load_selects() -> [(&'static str, &'static str); 5] {
    [
        (SONGPLAYS, SONGPLAY_TABLE_INSERT),
        (USERS, USER_TABLE_INSERT),
        (SONGS, SONG_TABLE_INSERT),
        (ARTISTS, ARTIST_TABLE_INSERT),
        (TIME, TIME_TABLE_INSERT),
    ]
}

/// Render a table name as SQL, quoting each dot-separated part
pub fn render_table(table: &TableName) -> String {
    table
        .split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// `INSERT INTO <table>\n<select>;`
///
/// Trusted input only: neither argument is validated or escaped.
pub fn insert_into(table: &TableName, select: &str) -> String {
    let body = select.trim().trim_end_matches(';').trim_end();
    format!("INSERT INTO {}\n{};", render_table(table), body)
}

/// `DELETE FROM <table>;`
///
/// Trusted input only.
pub fn delete_all(table: &TableName) -> String {
    format!("DELETE FROM {};", render_table(table))
}

#[cfg(test)]
#[path = "templates_test.rs"]
mod tests;
