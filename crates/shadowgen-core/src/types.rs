use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed set of column type categories the synthesizer understands.
///
/// Declared SQL types are folded into one of these variants when the schema is
/// loaded. Anything that does not map cleanly lands in `Other`, which carries the
/// raw declared type and is synthesized as a generic text token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Decimal,
    Boolean,
    Text,
    Date,
    Timestamp,
    Enum,
    Array(Box<ColumnKind>),
    Other(String),
}

impl ColumnKind {
    /// Map a declared SQL type (as reported by the catalog) to a column kind.
    ///
    /// Enum columns cannot be recognized from the type name alone; the
    /// introspection layer switches the kind to `Enum` when it finds labels.
    pub fn from_sql_type(raw: &str) -> ColumnKind {
        let lowered = raw.trim().to_lowercase();

        if let Some(inner) = lowered.strip_suffix("[]") {
            return ColumnKind::Array(Box::new(ColumnKind::from_sql_type(inner)));
        }
        if let Some(inner) = lowered.strip_prefix('_') {
            return ColumnKind::Array(Box::new(ColumnKind::from_sql_type(inner)));
        }
        if lowered == "array" {
            return ColumnKind::Array(Box::new(ColumnKind::Text));
        }

        match base_type(&lowered) {
            "smallint" | "integer" | "bigint" | "int" | "int2" | "int4" | "int8"
            | "smallserial" | "serial" | "bigserial" | "serial4" | "serial8" => {
                ColumnKind::Integer
            }
            "numeric" | "decimal" | "real" | "double precision" | "float" | "float4"
            | "float8" | "money" => ColumnKind::Decimal,
            "boolean" | "bool" => ColumnKind::Boolean,
            "character varying" | "varchar" | "character" | "char" | "bpchar" | "text"
            | "citext" | "name" => ColumnKind::Text,
            "date" => ColumnKind::Date,
            "timestamp" | "timestamp without time zone" | "timestamp with time zone"
            | "timestamptz" | "datetime" => ColumnKind::Timestamp,
            "user-defined" | "enum" => ColumnKind::Enum,
            _ => ColumnKind::Other(raw.trim().to_string()),
        }
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnKind::Text | ColumnKind::Enum | ColumnKind::Other(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnKind::Date | ColumnKind::Timestamp)
    }
}

/// Extract `n` from `varchar(n)` / `character(n)` style declarations.
pub fn parse_max_length(raw: &str) -> Option<u32> {
    let lowered = raw.to_lowercase();
    if !(lowered.starts_with("character") || lowered.starts_with("varchar") || lowered.starts_with("char"))
    {
        return None;
    }
    let (_, rest) = lowered.split_once('(')?;
    let (digits, _) = rest.split_once(')')?;
    digits.trim().parse::<u32>().ok()
}

fn base_type(lowered: &str) -> &str {
    lowered.split('(').next().unwrap_or(lowered).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_postgres_types() {
        assert_eq!(ColumnKind::from_sql_type("integer"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_sql_type("SMALLINT"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_sql_type("numeric(5,2)"), ColumnKind::Decimal);
        assert_eq!(
            ColumnKind::from_sql_type("character varying(45)"),
            ColumnKind::Text
        );
        assert_eq!(
            ColumnKind::from_sql_type("timestamp without time zone"),
            ColumnKind::Timestamp
        );
        assert_eq!(ColumnKind::from_sql_type("date"), ColumnKind::Date);
        assert_eq!(ColumnKind::from_sql_type("boolean"), ColumnKind::Boolean);
    }

    #[test]
    fn maps_arrays_recursively() {
        assert_eq!(
            ColumnKind::from_sql_type("text[]"),
            ColumnKind::Array(Box::new(ColumnKind::Text))
        );
        assert_eq!(
            ColumnKind::from_sql_type("_int4"),
            ColumnKind::Array(Box::new(ColumnKind::Integer))
        );
    }

    #[test]
    fn unknown_types_are_kept_verbatim() {
        assert_eq!(
            ColumnKind::from_sql_type("tsvector"),
            ColumnKind::Other("tsvector".to_string())
        );
        assert_eq!(
            ColumnKind::from_sql_type("interval"),
            ColumnKind::Other("interval".to_string())
        );
    }

    #[test]
    fn parses_varchar_lengths() {
        assert_eq!(parse_max_length("character varying(45)"), Some(45));
        assert_eq!(parse_max_length("varchar(20)"), Some(20));
        assert_eq!(parse_max_length("numeric(5,2)"), None);
        assert_eq!(parse_max_length("text"), None);
    }
}
