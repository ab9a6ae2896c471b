use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;

use rand::Rng;
use rand::seq::IndexedRandom;

use shadowgen_core::Value;

/// Where a sampled key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickSource {
    /// A key previously reserved for the referenced table.
    Reserved,
    /// The referenced table had no keys yet; drawn from the fallback range.
    Fallback,
    /// `sample_unique` ran out of attempts and reused an excluded key.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub value: Value,
    pub source: PickSource,
}

/// Run-scoped store of generated primary-key values.
///
/// Owned by one synthesis run and passed by reference to the value
/// synthesizer. Keys reserved for a table are immediately visible to
/// later rows of the same table and to every later table.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    keys: BTreeMap<String, Vec<Value>>,
    counters: BTreeMap<(String, String), i64>,
    fallback: RangeInclusive<i64>,
    unique_attempts: u32,
}

impl IdentityRegistry {
    pub fn new(fallback: RangeInclusive<i64>, unique_attempts: u32) -> Self {
        Self {
            keys: BTreeMap::new(),
            counters: BTreeMap::new(),
            fallback,
            unique_attempts: unique_attempts.max(1),
        }
    }

    /// Issue the next sequential key for `(table, column)`, starting at 1,
    /// and make it available for foreign-key sampling.
    pub fn reserve(&mut self, table: &str, column: &str) -> i64 {
        let counter = self
            .counters
            .entry((table.to_string(), column.to_string()))
            .or_insert(0);
        *counter += 1;
        let key = *counter;
        self.record(table, Value::Int(key));
        key
    }

    /// Make an externally produced key (e.g. a sampled one-to-one key)
    /// available for sampling.
    pub fn record(&mut self, table: &str, value: Value) {
        self.keys.entry(table.to_string()).or_default().push(value);
    }

    /// Uniformly sample a key reserved for `table`, or a fallback key when
    /// none exist yet. Never fails.
    pub fn sample<R: Rng + ?Sized>(&self, table: &str, rng: &mut R) -> Pick {
        match self.keys(table).choose(rng) {
            Some(value) => Pick {
                value: value.clone(),
                source: PickSource::Reserved,
            },
            None => self.fallback_pick(rng),
        }
    }

    /// Sample a key whose canonical form is not in `exclude`, trying at most
    /// the configured number of times. On exhaustion an excluded key is
    /// returned anyway.
    pub fn sample_unique<R: Rng + ?Sized>(
        &self,
        table: &str,
        exclude: &HashSet<String>,
        rng: &mut R,
    ) -> Pick {
        let keys = self.keys(table);
        let mut last = None;
        for _ in 0..self.unique_attempts {
            let Some(value) = keys.choose(rng) else {
                return self.fallback_pick(rng);
            };
            if !exclude.contains(&value.canonical_key()) {
                return Pick {
                    value: value.clone(),
                    source: PickSource::Reserved,
                };
            }
            last = Some(value);
        }

        match last {
            Some(value) => Pick {
                value: value.clone(),
                source: PickSource::Exhausted,
            },
            None => self.fallback_pick(rng),
        }
    }

    pub fn keys(&self, table: &str) -> &[Value] {
        self.keys.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self, table: &str) -> usize {
        self.keys(table).len()
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.keys(table).is_empty()
    }

    /// Drop everything recorded for a table (used when its synthesis fails
    /// midway, so later tables never sample keys that were not emitted).
    pub fn forget(&mut self, table: &str) {
        self.keys.remove(table);
        self.counters.retain(|(owner, _), _| owner != table);
    }

    fn fallback_pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Pick {
        Pick {
            value: Value::Int(rng.random_range(self.fallback.clone())),
            source: PickSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn reserve_is_sequential_per_table_and_column() {
        let mut registry = IdentityRegistry::new(1..=10, 50);
        assert_eq!(registry.reserve("customer", "customer_id"), 1);
        assert_eq!(registry.reserve("customer", "customer_id"), 2);
        assert_eq!(registry.reserve("rental", "rental_id"), 1);
        assert_eq!(registry.len("customer"), 2);
    }

    #[test]
    fn sample_falls_back_when_empty() {
        let registry = IdentityRegistry::new(1..=10, 50);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let pick = registry.sample("staff", &mut rng);
            assert_eq!(pick.source, PickSource::Fallback);
            let key = pick.value.as_i64().unwrap();
            assert!((1..=10).contains(&key));
        }
    }

    #[test]
    fn sample_returns_reserved_keys() {
        let mut registry = IdentityRegistry::new(1..=10, 50);
        for _ in 0..5 {
            registry.reserve("store", "store_id");
        }
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let pick = registry.sample("store", &mut rng);
            assert_eq!(pick.source, PickSource::Reserved);
            assert!((1..=5).contains(&pick.value.as_i64().unwrap()));
        }
    }

    #[test]
    fn sample_unique_avoids_exclusions_until_exhausted() {
        let mut registry = IdentityRegistry::new(1..=10, 50);
        registry.reserve("staff", "staff_id");
        registry.reserve("staff", "staff_id");
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let exclude: HashSet<String> = ["1".to_string()].into_iter().collect();
        let pick = registry.sample_unique("staff", &exclude, &mut rng);
        assert_eq!(pick.value, Value::Int(2));
        assert_eq!(pick.source, PickSource::Reserved);

        let exclude: HashSet<String> = ["1".to_string(), "2".to_string()].into_iter().collect();
        let pick = registry.sample_unique("staff", &exclude, &mut rng);
        assert_eq!(pick.source, PickSource::Exhausted);
        assert!(exclude.contains(&pick.value.canonical_key()));
    }

    #[test]
    fn forget_resets_table_state() {
        let mut registry = IdentityRegistry::new(1..=10, 50);
        registry.reserve("film", "film_id");
        registry.forget("film");
        assert!(registry.is_empty("film"));
        assert_eq!(registry.reserve("film", "film_id"), 1);
    }
}
