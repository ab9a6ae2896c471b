use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shadowgen_eval::EvaluateOptions;
use shadowgen_generate::GenerateOptions;

use crate::CliError;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "shadowgen.toml";

/// Contents of `shadowgen.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowgenConfig {
    pub generate: GenerateOptions,
    pub evaluate: EvaluateOptions,
    /// Explicit per-table row counts.
    pub rows: BTreeMap<String, u64>,
}

/// Load the config. An explicit path must exist; the default file is
/// optional and falls back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<ShadowgenConfig, CliError> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if !path.exists() {
        if required {
            return Err(CliError::InvalidConfig(format!(
                "config file '{}' not found",
                path.display()
            )));
        }
        return Ok(ShadowgenConfig::default());
    }
    let content = std::fs::read_to_string(&path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<ShadowgenConfig, CliError> {
    toml::from_str(content).map_err(|err| CliError::InvalidConfig(err.to_string()))
}

/// Generation flags that override the config file.
#[derive(Debug, Clone, Default)]
pub struct GenerateOverrides {
    pub seed: Option<u64>,
    pub null_probability: Option<f64>,
    pub row_scale: Option<f64>,
    pub default_rows: Option<u64>,
    pub rows: Vec<(String, u64)>,
}

impl ShadowgenConfig {
    pub fn apply(&mut self, overrides: &GenerateOverrides) {
        if let Some(seed) = overrides.seed {
            self.generate.seed = seed;
        }
        if let Some(null_probability) = overrides.null_probability {
            self.generate.null_probability = null_probability;
        }
        if let Some(row_scale) = overrides.row_scale {
            self.generate.row_scale = row_scale;
        }
        if let Some(default_rows) = overrides.default_rows {
            self.generate.default_rows = default_rows;
        }
        for (table, rows) in &overrides.rows {
            self.rows.insert(table.clone(), *rows);
        }
    }
}

/// Parse a `table=rows` flag value.
pub fn parse_row_count(raw: &str) -> Result<(String, u64), String> {
    let (table, rows) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TABLE=ROWS, got '{raw}'"))?;
    let table = table.trim();
    if table.is_empty() {
        return Err(format!("missing table name in '{raw}'"));
    }
    let rows = rows
        .trim()
        .parse::<u64>()
        .map_err(|err| format!("invalid row count in '{raw}': {err}"))?;
    Ok((table.to_string(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sections_keep_defaults() {
        let config = parse_config(
            r#"
            [generate]
            seed = 7
            null_probability = 0.2

            [evaluate]
            skew_threshold_pct = 40.0

            [rows]
            customer = 120
            "#,
        )
        .expect("parse");
        assert_eq!(config.generate.seed, 7);
        assert_eq!(config.generate.null_probability, 0.2);
        assert_eq!(config.generate.default_rows, 50);
        assert_eq!(config.evaluate.skew_threshold_pct, 40.0);
        assert_eq!(config.evaluate.null_gap_threshold_pct, 5.0);
        assert_eq!(config.rows.get("customer"), Some(&120));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = parse_config("").expect("parse");
        assert_eq!(config.generate.seed, 42);
        assert!(config.rows.is_empty());
    }

    #[test]
    fn unknown_value_types_are_rejected() {
        let err = parse_config("[generate]\nseed = \"abc\"").unwrap_err();
        assert!(matches!(err, CliError::InvalidConfig(_)));
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = parse_config("[generate]\nseed = 7\n[rows]\nfilm = 10").expect("parse");
        config.apply(&GenerateOverrides {
            seed: Some(99),
            null_probability: Some(0.0),
            rows: vec![("film".to_string(), 25), ("actor".to_string(), 5)],
            ..GenerateOverrides::default()
        });
        assert_eq!(config.generate.seed, 99);
        assert_eq!(config.generate.null_probability, 0.0);
        assert_eq!(config.rows["film"], 25);
        assert_eq!(config.rows["actor"], 5);
    }

    #[test]
    fn parses_row_count_flags() {
        assert_eq!(parse_row_count("rental=200"), Ok(("rental".to_string(), 200)));
        assert!(parse_row_count("rental").is_err());
        assert!(parse_row_count("=3").is_err());
        assert!(parse_row_count("rental=-1").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join(format!("missing_{}.toml", uuid::Uuid::new_v4()));
        assert!(matches!(
            load_config(Some(missing.as_path())),
            Err(CliError::InvalidConfig(_))
        ));
    }
}
