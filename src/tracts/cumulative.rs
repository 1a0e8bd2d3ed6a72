use std::{collections::BTreeMap, hash::Hash};

use ahash::AHashMap;

/// Per-group empirical distribution over tracts, stored as an ascending cumulative fraction.
#[derive(Debug, Clone)]
pub struct CumulativeTable<K> {
    groups: AHashMap<K, Vec<(f64, String)>>,
}

impl<K: Eq + Hash + Ord + Clone> CumulativeTable<K> {
    /// Build from (group, tract) observations. Within each group tracts are ordered
    /// by id and their counts accumulated, so fractions ascend to exactly 1.
    pub fn from_observations<'a>(observations: impl IntoIterator<Item = (K, &'a str)>) -> Self {
        let mut counts = BTreeMap::<K, BTreeMap<String, usize>>::new();
        for (key, tract) in observations {
            *counts.entry(key).or_default().entry(tract.to_string()).or_default() += 1;
        }

        let groups = counts.into_iter()
            .map(|(key, tracts)| {
                let total = tracts.values().sum::<usize>() as f64;
                let mut running = 0;
                let n = tracts.len();
                let cdf = tracts.into_iter().enumerate()
                    .map(|(i, (tract, count))| {
                        running += count;
                        let fraction = if i + 1 == n { 1.0 } else { running as f64 / total };
                        (fraction, tract)
                    })
                    .collect();
                (key, cdf)
            })
            .collect();
        Self { groups }
    }

    /// As-of match: the first tract in the group whose cumulative fraction is ≥ `u`.
    pub fn pick(&self, key: &K, u: f64) -> Option<&str> {
        let cdf = self.groups.get(key)?;
        let at = cdf.partition_point(|(fraction, _)| *fraction < u);
        cdf.get(at.min(cdf.len().saturating_sub(1))).map(|(_, tract)| tract.as_str())
    }

    /// The cumulative fractions of one group, in order.
    pub fn group(&self, key: &K) -> Option<&[(f64, String)]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    #[inline] pub fn len(&self) -> usize { self.groups.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.groups.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office_table() -> CumulativeTable<(String, String)> {
        let key = ("Office".to_string(), "C".to_string());
        CumulativeTable::from_observations(
            ["T1", "T2", "T1", "T1"].into_iter().map(|t| (key.clone(), t))
        )
    }

    #[test]
    fn counts_become_ascending_fractions() {
        let table = office_table();
        let cdf = table.group(&("Office".into(), "C".into())).unwrap();
        assert_eq!(cdf, &[(0.75, "T1".to_string()), (1.0, "T2".to_string())]);
    }

    #[test]
    fn as_of_match_takes_first_fraction_at_or_above_u() {
        let table = office_table();
        let key = ("Office".to_string(), "C".to_string());
        assert_eq!(table.pick(&key, 0.10), Some("T1"));
        assert_eq!(table.pick(&key, 0.75), Some("T1"));
        assert_eq!(table.pick(&key, 0.80), Some("T2"));
        assert_eq!(table.pick(&key, 0.999), Some("T2"));
        assert_eq!(table.pick(&("Retail".into(), "C".into()), 0.5), None);
    }
}
