use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use rand::Rng;

use shadowgen_core::Value;

use crate::generators::{ColumnContext, Rule, SynthRng, any_name};

const DATE_SPAN_DAYS: i64 = 10 * 365;
const TIMESTAMP_SPAN_SECONDS: i64 = 2 * 365 * 86_400;
const EARLIEST_YEAR: i32 = 1970;

pub const INTEGER_RULES: &[Rule] = &[
    Rule {
        id: "primitive.int.year",
        matches: |name| name.contains("year"),
        generate: year,
    },
    Rule {
        id: "primitive.int.rating",
        matches: |name| name.contains("rating"),
        generate: |_, rng| Value::Int(rng.random_range(1..=5)),
    },
    Rule {
        id: "primitive.int.duration",
        matches: |name| name.contains("duration"),
        generate: |_, rng| Value::Int(rng.random_range(1..=7)),
    },
    Rule {
        id: "primitive.int.length",
        matches: |name| name.contains("length"),
        generate: |_, rng| Value::Int(rng.random_range(60..=180)),
    },
    Rule {
        id: "primitive.int.active",
        matches: |name| name.contains("active"),
        generate: |_, rng| Value::Int(if rng.random_bool(0.9) { 1 } else { 0 }),
    },
    Rule {
        id: "primitive.int",
        matches: any_name,
        generate: |_, rng| Value::Int(rng.random_range(1..=100)),
    },
];

pub const DECIMAL_RULES: &[Rule] = &[
    Rule {
        id: "primitive.decimal.amount",
        matches: |name| name.contains("amount") || name.contains("rate") || name.contains("cost"),
        generate: |_, rng| Value::Decimal(round2(rng.random_range(0.99..=299.99))),
    },
    Rule {
        id: "primitive.decimal",
        matches: any_name,
        generate: |_, rng| Value::Decimal(round2(rng.random_range(0.0..=1000.0))),
    },
];

pub const BOOLEAN_RULES: &[Rule] = &[Rule {
    id: "primitive.bool",
    matches: any_name,
    generate: |_, rng| Value::Bool(rng.random_bool(0.8)),
}];

pub const DATE_RULES: &[Rule] = &[Rule {
    id: "primitive.date.recent",
    matches: any_name,
    generate: recent_date,
}];

pub const TIMESTAMP_RULES: &[Rule] = &[Rule {
    id: "primitive.timestamp.recent",
    matches: any_name,
    generate: recent_timestamp,
}];

fn year(ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Value {
    let latest = ctx.base_date.year().max(EARLIEST_YEAR);
    Value::Int(i64::from(rng.random_range(EARLIEST_YEAR..=latest)))
}

/// A date within the ten years before the base date.
fn recent_date(ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Value {
    let offset = rng.random_range(0..=DATE_SPAN_DAYS);
    Value::Date(ctx.base_date - Duration::days(offset))
}

/// A timestamp within the two years before the base date, second precision.
fn recent_timestamp(ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Value {
    let end = NaiveDateTime::new(ctx.base_date, NaiveTime::MIN);
    let offset = rng.random_range(0..=TIMESTAMP_SPAN_SECONDS);
    Value::Timestamp(end - Duration::seconds(offset))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{ColumnContext, synthesize_value};
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use shadowgen_core::{ColumnKind, ColumnSpec, TableSpec};

    fn values(name: &str, kind: ColumnKind, count: u64) -> Vec<(Value, &'static str)> {
        let column = ColumnSpec::new(name, kind);
        let table = TableSpec::new("film").column(column.clone());
        let lowered = name.to_lowercase();
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let ctx = ColumnContext::new(&table, &column, &lowered, base);
        let mut rng = SynthRng::seed_from_u64(11);
        (0..count)
            .map(|_| {
                let out = synthesize_value(&ctx, &mut rng);
                (out.value, out.rule)
            })
            .collect()
    }

    #[test]
    fn keyword_ranges_for_integers() {
        for (value, rule) in values("rating", ColumnKind::Integer, 200) {
            assert_eq!(rule, "primitive.int.rating");
            assert!((1..=5).contains(&value.as_i64().unwrap()));
        }
        for (value, _) in values("rental_duration", ColumnKind::Integer, 200) {
            assert!((1..=7).contains(&value.as_i64().unwrap()));
        }
        for (value, _) in values("length", ColumnKind::Integer, 200) {
            assert!((60..=180).contains(&value.as_i64().unwrap()));
        }
        for (value, _) in values("release_year", ColumnKind::Integer, 200) {
            assert!((1970..=2024).contains(&value.as_i64().unwrap()));
        }
        for (value, rule) in values("store_count", ColumnKind::Integer, 200) {
            assert_eq!(rule, "primitive.int");
            assert!((1..=100).contains(&value.as_i64().unwrap()));
        }
    }

    #[test]
    fn amounts_are_bounded_two_place_decimals() {
        for (value, rule) in values("rental_rate", ColumnKind::Decimal, 200) {
            assert_eq!(rule, "primitive.decimal.amount");
            let Value::Decimal(amount) = value else {
                panic!("expected decimal");
            };
            assert!((0.99..=299.99).contains(&amount));
            assert_eq!(amount, round2(amount));
        }
    }

    #[test]
    fn dates_stay_within_ten_years_of_base() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for (value, _) in values("last_seen", ColumnKind::Date, 200) {
            let Value::Date(date) = value else {
                panic!("expected date");
            };
            assert!(date <= base);
            assert!(date >= base - Duration::days(DATE_SPAN_DAYS));
        }
    }

    #[test]
    fn timestamps_stay_within_two_years_of_base() {
        let end = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for (value, _) in values("last_update", ColumnKind::Timestamp, 200) {
            let Value::Timestamp(ts) = value else {
                panic!("expected timestamp");
            };
            assert!(ts <= end);
            assert!(ts >= end - Duration::seconds(TIMESTAMP_SPAN_SECONDS));
        }
    }

    #[test]
    fn booleans_lean_true() {
        let trues = values("is_member", ColumnKind::Boolean, 1000)
            .into_iter()
            .filter(|(value, _)| *value == Value::Bool(true))
            .count();
        assert!((700..=900).contains(&trues), "got {trues} trues");
    }
}
