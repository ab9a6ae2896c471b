use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, CountryName, SecondaryAddress, StreetName, ZipCode};
use fake::faker::internet::en::{Password, SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word, Words};
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;

use shadowgen_core::Value;

use crate::generators::{ColumnContext, Rule, SynthRng, any_name, truncate_chars};

const PHONE_MAX_CHARS: usize = 20;
const DESCRIPTION_MAX_CHARS: usize = 200;
const FALLBACK_TEXT_MAX_CHARS: usize = 50;
const SECONDARY_ADDRESS_CHANCE: f64 = 0.3;

/// Keyword rules for text columns, first match wins.
pub const TEXT_RULES: &[Rule] = &[
    Rule {
        id: "semantic.email",
        matches: |name| name.contains("email"),
        generate: |_, rng| text(SafeEmail().fake_with_rng::<String, _>(rng)),
    },
    Rule {
        id: "semantic.first_name",
        matches: |name| name.contains("first_name"),
        generate: |_, rng| text(FirstName().fake_with_rng::<String, _>(rng)),
    },
    Rule {
        id: "semantic.last_name",
        matches: |name| name.contains("last_name"),
        generate: |_, rng| text(LastName().fake_with_rng::<String, _>(rng)),
    },
    Rule {
        id: "semantic.address",
        matches: |name| name == "address",
        generate: street_address,
    },
    Rule {
        id: "semantic.address2",
        matches: |name| name.contains("address2"),
        generate: secondary_address,
    },
    Rule {
        id: "semantic.district",
        matches: |name| name.contains("district"),
        generate: |_, rng| text(CityName().fake_with_rng::<String, _>(rng)),
    },
    Rule {
        id: "semantic.phone",
        matches: |name| name.contains("phone"),
        generate: |_, rng| {
            let phone: String = PhoneNumber().fake_with_rng(rng);
            text(truncate_chars(&phone, PHONE_MAX_CHARS))
        },
    },
    Rule {
        id: "semantic.postal_code",
        matches: |name| name.contains("postal") || name.contains("zip"),
        generate: |_, rng| text(ZipCode().fake_with_rng::<String, _>(rng)),
    },
    Rule {
        id: "semantic.city",
        matches: |name| name.contains("city"),
        generate: |_, rng| text(CityName().fake_with_rng::<String, _>(rng)),
    },
    Rule {
        id: "semantic.country",
        matches: |name| name.contains("country"),
        generate: |_, rng| text(CountryName().fake_with_rng::<String, _>(rng)),
    },
    Rule {
        id: "semantic.title",
        matches: |name| name.contains("title"),
        generate: title,
    },
    Rule {
        id: "semantic.description",
        matches: |name| name.contains("description"),
        generate: |_, rng| {
            let paragraph: String = Paragraph(1..3).fake_with_rng(rng);
            text(truncate_chars(&paragraph, DESCRIPTION_MAX_CHARS).trim_end().to_string())
        },
    },
    Rule {
        id: "semantic.username",
        matches: |name| name.contains("username"),
        generate: |_, rng| text(Username().fake_with_rng::<String, _>(rng)),
    },
    Rule {
        id: "semantic.password",
        matches: |name| name.contains("password"),
        generate: |_, rng| text(Password(12..20).fake_with_rng::<String, _>(rng)),
    },
    Rule {
        id: "primitive.text",
        matches: any_name,
        generate: fallback_text,
    },
];

fn text(value: String) -> Value {
    Value::Text(value)
}

fn street_address(_: &ColumnContext<'_>, rng: &mut SynthRng) -> Value {
    let number: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    text(format!("{number} {street}"))
}

/// Mostly empty for nullable columns, like real secondary address lines.
fn secondary_address(ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Value {
    if ctx.column.nullable && !rng.random_bool(SECONDARY_ADDRESS_CHANCE) {
        return Value::Null;
    }
    text(SecondaryAddress().fake_with_rng::<String, _>(rng))
}

/// Three capitalized words, no trailing period.
fn title(_: &ColumnContext<'_>, rng: &mut SynthRng) -> Value {
    let words: Vec<String> = Words(3..4).fake_with_rng(rng);
    text(capitalize(&words.join(" ")))
}

/// Short text bounded by the declared max length, else a single word.
fn fallback_text(ctx: &ColumnContext<'_>, rng: &mut SynthRng) -> Value {
    match ctx.column.max_length {
        Some(max_length) => {
            let limit = (max_length as usize).min(FALLBACK_TEXT_MAX_CHARS);
            let sentence: String = Sentence(1..6).fake_with_rng(rng);
            let trimmed = truncate_chars(&sentence, limit).trim_end().to_string();
            if trimmed.is_empty() {
                text(truncate_chars(&Word().fake_with_rng::<String, _>(rng), limit))
            } else {
                text(trimmed)
            }
        }
        None => text(Word().fake_with_rng::<String, _>(rng)),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::synthesize_value;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use shadowgen_core::{ColumnSpec, TableSpec};

    fn generate(column: ColumnSpec, seed: u64) -> (Value, &'static str) {
        let table = TableSpec::new("customer").column(column.clone());
        let lowered = column.name.to_lowercase();
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let ctx = ColumnContext::new(&table, &column, &lowered, base);
        let mut rng = SynthRng::seed_from_u64(seed);
        let out = synthesize_value(&ctx, &mut rng);
        (out.value, out.rule)
    }

    #[test]
    fn email_rule_matches_case_insensitively() {
        let (value, rule) = generate(ColumnSpec::from_sql("Email", "text", false), 1);
        assert_eq!(rule, "semantic.email");
        assert!(value.as_str().unwrap().contains('@'));
    }

    #[test]
    fn exact_address_does_not_shadow_address2() {
        let (_, rule) = generate(ColumnSpec::from_sql("address", "text", false), 1);
        assert_eq!(rule, "semantic.address");
        let (_, rule) = generate(ColumnSpec::from_sql("address2", "text", false), 1);
        assert_eq!(rule, "semantic.address2");
    }

    #[test]
    fn non_nullable_address2_always_has_a_value() {
        for seed in 0..30 {
            let (value, _) = generate(ColumnSpec::from_sql("address2", "text", false), seed);
            assert!(!value.is_null());
        }
    }

    #[test]
    fn phone_is_at_most_twenty_chars() {
        for seed in 0..30 {
            let (value, _) = generate(ColumnSpec::from_sql("phone", "text", false), seed);
            assert!(value.as_str().unwrap().chars().count() <= PHONE_MAX_CHARS);
        }
    }

    #[test]
    fn title_has_three_words_without_period() {
        for seed in 0..30 {
            let (value, _) = generate(ColumnSpec::from_sql("title", "text", false), seed);
            let title = value.as_str().unwrap();
            assert_eq!(title.split(' ').count(), 3);
            assert!(!title.ends_with('.'));
        }
    }

    #[test]
    fn fallback_text_honors_short_limits() {
        for seed in 0..30 {
            let column = ColumnSpec::from_sql("code", "character(3)", false);
            let (value, rule) = generate(column, seed);
            assert_eq!(rule, "primitive.text");
            let code = value.as_str().unwrap();
            assert!(!code.is_empty() && code.chars().count() <= 3);
        }
    }
}
