//! Column value synthesis.
//!
//! Each column kind owns an ordered rule table of `(predicate, generator)`
//! pairs evaluated top to bottom against the lower-cased column name. The
//! last rule of every table matches any name, so dispatch is total.

pub mod primitives;
pub mod semantic;

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;

use shadowgen_core::{ColumnKind, ColumnSpec, TableSpec, Value};

/// Random stream used by every generator; one per table.
pub type SynthRng = ChaCha8Rng;

/// Inputs for synthesizing one column value.
#[derive(Debug, Clone, Copy)]
pub struct ColumnContext<'a> {
    pub table: &'a TableSpec,
    pub column: &'a ColumnSpec,
    /// Lower-cased column name, matched by rule predicates.
    pub name: &'a str,
    pub base_date: NaiveDate,
}

impl<'a> ColumnContext<'a> {
    pub fn new(
        table: &'a TableSpec,
        column: &'a ColumnSpec,
        name: &'a str,
        base_date: NaiveDate,
    ) -> Self {
        Self {
            table,
            column,
            name,
            base_date,
        }
    }
}

/// A keyword rule: when `matches` accepts the lower-cased column name,
/// `generate` produces the value.
pub struct Rule {
    pub id: &'static str,
    pub matches: fn(&str) -> bool,
    pub generate: fn(&ColumnContext<'_>, &mut SynthRng) -> Value,
}

/// Predicate for the fallback rule at the end of every table.
pub fn any_name(_: &str) -> bool {
    true
}

/// A synthesized value plus which rule produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    pub value: Value,
    pub rule: &'static str,
    /// The column type could not be confidently mapped and a generic
    /// fallback was used.
    pub degraded: bool,
}

impl Synthesized {
    fn exact(value: Value, rule: &'static str) -> Self {
        Self {
            value,
            rule,
            degraded: false,
        }
    }

    fn degraded(value: Value, rule: &'static str) -> Self {
        Self {
            value,
            rule,
            degraded: true,
        }
    }
}

/// Produce one non-key value for a column. Never fails: unknown types
/// degrade to a generic text token.
pub fn synthesize_value(ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Synthesized {
    let mut synthesized = synthesize_kind(&ctx.column.kind, ctx, rng);
    if let (Value::Text(text), Some(max_length)) = (&synthesized.value, ctx.column.max_length) {
        let truncated = truncate_chars(text, max_length as usize);
        synthesized.value = Value::Text(truncated);
    }
    synthesized
}

fn synthesize_kind(kind: &ColumnKind, ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Synthesized {
    match kind {
        ColumnKind::Integer => apply_rules(primitives::INTEGER_RULES, ctx, rng),
        ColumnKind::Decimal => apply_rules(primitives::DECIMAL_RULES, ctx, rng),
        ColumnKind::Boolean => apply_rules(primitives::BOOLEAN_RULES, ctx, rng),
        ColumnKind::Date => apply_rules(primitives::DATE_RULES, ctx, rng),
        ColumnKind::Timestamp => apply_rules(primitives::TIMESTAMP_RULES, ctx, rng),
        ColumnKind::Text => apply_rules(semantic::TEXT_RULES, ctx, rng),
        ColumnKind::Enum => pick_enum(ctx, rng),
        ColumnKind::Array(element) => {
            let len = rng.random_range(1..=3);
            let mut items = Vec::with_capacity(len);
            let mut degraded = false;
            for _ in 0..len {
                let item = synthesize_kind(element, ctx, rng);
                degraded |= item.degraded;
                items.push(item.value);
            }
            Synthesized {
                value: Value::Array(items),
                rule: "primitive.array",
                degraded,
            }
        }
        ColumnKind::Other(_) => Synthesized::degraded(generic_token(ctx, rng), "fallback.token"),
    }
}

fn apply_rules(rules: &[Rule], ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Synthesized {
    match rules.iter().find(|rule| (rule.matches)(ctx.name)) {
        Some(rule) => Synthesized::exact((rule.generate)(ctx, rng), rule.id),
        None => Synthesized::degraded(generic_token(ctx, rng), "fallback.token"),
    }
}

fn pick_enum(ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Synthesized {
    let domain = ctx.column.enum_domain.as_deref().unwrap_or(&[]);
    match domain.choose(rng) {
        Some(label) => Synthesized::exact(Value::Text(label.clone()), "primitive.enum"),
        None => {
            let label = format!("{}_{}", ctx.column.name, rng.random_range(1..=5));
            Synthesized::degraded(Value::Text(label), "fallback.enum_label")
        }
    }
}

/// Generic text token for columns whose type is not understood.
pub fn generic_token(ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Value {
    Value::Text(format!("{}_{:08x}", ctx.column.name, rng.random::<u32>()))
}

/// Truncate on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn synth(column: ColumnSpec, seed: u64) -> Synthesized {
        let table = TableSpec::new("t").column(column.clone());
        let name = column.name.to_lowercase();
        let ctx = ColumnContext::new(
            &table,
            &column,
            &name,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let mut rng = SynthRng::seed_from_u64(seed);
        synthesize_value(&ctx, &mut rng)
    }

    #[test]
    fn unknown_types_degrade_to_text_tokens() {
        let out = synth(ColumnSpec::from_sql("fulltext", "tsvector", false), 1);
        assert!(out.degraded);
        assert!(out.value.as_str().unwrap().starts_with("fulltext_"));
    }

    #[test]
    fn enum_samples_declared_domain() {
        let column =
            ColumnSpec::new("rating", ColumnKind::Enum).with_enum_domain(["G", "PG", "R"]);
        for seed in 0..20 {
            let out = synth(column.clone(), seed);
            assert!(["G", "PG", "R"].contains(&out.value.as_str().unwrap()));
            assert!(!out.degraded);
        }
    }

    #[test]
    fn enum_without_domain_gets_synthetic_label() {
        let out = synth(ColumnSpec::new("mood", ColumnKind::Enum), 5);
        assert!(out.degraded);
        let label = out.value.as_str().unwrap().to_string();
        let suffix: i64 = label.strip_prefix("mood_").unwrap().parse().unwrap();
        assert!((1..=5).contains(&suffix));
    }

    #[test]
    fn arrays_hold_one_to_three_elements() {
        for seed in 0..20 {
            let out = synth(ColumnSpec::from_sql("special_features", "text[]", false), seed);
            let Value::Array(items) = out.value else {
                panic!("expected array");
            };
            assert!((1..=3).contains(&items.len()));
        }
    }

    #[test]
    fn text_respects_max_length() {
        for seed in 0..20 {
            let column = ColumnSpec::from_sql("description", "character varying(12)", false);
            let out = synth(column, seed);
            assert!(out.value.as_str().unwrap().chars().count() <= 12);
        }
    }

    #[test]
    fn same_seed_same_value() {
        let column = ColumnSpec::from_sql("email", "character varying(50)", false);
        assert_eq!(synth(column.clone(), 9), synth(column, 9));
    }
}
