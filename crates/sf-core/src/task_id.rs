//! Strongly-typed identifiers for tasks and warehouse tables.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Identity of a task within a workflow graph (e.g. `Stage_events`).
    pub struct TaskId;
}

define_newtype_string! {
    /// A warehouse table name, optionally schema-qualified.
    ///
    /// Table names are substituted into SQL text without escaping, so they
    /// must only ever come from trusted, fixed definitions.
    pub struct TableName;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_rejects_empty() {
        assert!(TaskId::try_new("").is_none());
        assert_eq!(TaskId::try_new("Stage_events").unwrap(), "Stage_events");
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        let err = serde_yaml::from_str::<TableName>("''").unwrap_err();
        assert!(err.to_string().contains("TableName must not be empty"));

        let table: TableName = serde_yaml::from_str("songplays").unwrap();
        assert_eq!(table.as_str(), "songplays");
    }

    #[test]
    fn test_display_and_deref() {
        let id = TaskId::new("Load_users_table");
        assert_eq!(id.to_string(), "Load_users_table");
        assert!(id.starts_with("Load_"));
    }

    #[test]
    fn test_compare_through_references() {
        let table = TableName::new("staging_songs");
        let borrowed: Option<&TableName> = Some(&table);
        assert_eq!(borrowed.unwrap(), "staging_songs");
        assert_eq!(table, "staging_songs");
        assert!(table != *"songs");
    }
}
