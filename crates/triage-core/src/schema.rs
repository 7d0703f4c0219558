/// Arrow schema definitions for the tabular files the pipeline writes.
pub mod tables {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Columns of the source export that loading depends on.
    pub mod source {
        pub const ID: &str = "id";
        pub const PRIORITY: &str = "Priority";
        pub const CATEGORY: &str = "Service Category";
        pub const COMMENT: &str = "Service Comments";
        pub const TIMESTAMP: &str = "SR start date/time";

        pub const REQUIRED: &[&str] = &[ID, PRIORITY, CATEGORY, COMMENT, TIMESTAMP];
    }

    pub mod snapshot {
        pub const ID: &str = "id";
        pub const PRIORITY: &str = "Priority";
        pub const CATEGORY: &str = "Service_Category";
        pub const SUGGESTED_ACTIONS: &str = "Suggested_Actions";

        pub const REQUIRED: &[&str] = &[ID, PRIORITY, CATEGORY, SUGGESTED_ACTIONS];
    }

    pub mod demo {
        pub const ID: &str = "id";
        pub const RESIDENT_PRIORITY: &str = "resident_selected_priority";
        pub const RESIDENT_CATEGORY: &str = "resident_selected_category";
        pub const COMMENT: &str = "comment";
        pub const AI_PRIORITY: &str = "ai_priority";
        pub const AI_CATEGORY: &str = "ai_service_category";
        pub const SUGGESTED_ACTIONS: &str = "suggested_actions";

        pub const REQUIRED: &[&str] = &[
            ID,
            RESIDENT_PRIORITY,
            RESIDENT_CATEGORY,
            COMMENT,
            AI_PRIORITY,
            AI_CATEGORY,
            SUGGESTED_ACTIONS,
        ];
    }

    /// Schema for the deduplicated prediction snapshot.
    pub fn snapshot_schema() -> Schema {
        Schema::new(vec![
            Field::new(snapshot::ID, DataType::Int64, false),
            Field::new(snapshot::PRIORITY, DataType::Utf8, false),
            Field::new(snapshot::CATEGORY, DataType::Utf8, false),
            Field::new(snapshot::SUGGESTED_ACTIONS, DataType::Utf8, false),
        ])
    }

    /// Schema for the curated demo artifact.
    pub fn demo_schema() -> Schema {
        let mut fields = vec![Field::new(demo::ID, DataType::Int64, false)];
        fields.extend(
            demo::REQUIRED[1..]
                .iter()
                .map(|name| Field::new(*name, DataType::Utf8, false)),
        );
        Schema::new(fields)
    }

    /// All-text schema for reading a CSV whose header is `columns`.
    ///
    /// Everything is read as nullable UTF-8 so ids and labels can be
    /// normalised by the loader instead of failing type inference.
    pub fn text_schema<S: AsRef<str>>(columns: &[S]) -> Schema {
        Schema::new(
            columns
                .iter()
                .map(|name| Field::new(name.as_ref(), DataType::Utf8, true))
                .collect::<Vec<_>>(),
        )
    }
}
