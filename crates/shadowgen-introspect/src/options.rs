/// Options that control how introspection behaves.
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    /// Namespace whose tables are read.
    pub schema: String,
    /// Restrict introspection to these tables.
    pub tables: Option<Vec<String>>,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            tables: None,
        }
    }
}

/// Bounds for the aggregate source profile.
#[derive(Debug, Clone)]
pub struct ProfileOptions {
    pub schema: String,
    /// Leading columns per table whose null counts are collected.
    pub null_columns_per_table: usize,
    /// Real values sampled per PII column.
    pub sample_limit: usize,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            null_columns_per_table: 3,
            sample_limit: 1000,
        }
    }
}

/// Destination load settings.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub schema: String,
    pub batch_size: usize,
    /// Drop every enum type of the destination namespace before loading.
    pub drop_enum_types: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            batch_size: 500,
            drop_enum_types: true,
        }
    }
}
