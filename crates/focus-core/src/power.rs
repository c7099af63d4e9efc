//! Ordered band-power containers

use crate::error::{FocusError, FocusResult};
use serde::{Deserialize, Serialize};

/// Raw mean-square power per band, in band configuration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandPowerSet {
    entries: Vec<(String, f64)>,
}

/// Band power as a fraction of the total; entries sum to 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPowerSet {
    entries: Vec<(String, f64)>,
}

impl BandPowerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace a band's power, keeping first-insertion order
    pub fn insert(&mut self, name: impl Into<String>, power: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = power,
            None => self.entries.push((name, power)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        lookup(&self.entries, name)
    }

    pub fn require(&self, name: &str) -> FocusResult<f64> {
        self.get(name).ok_or_else(|| FocusError::MissingBand { name: name.to_string() })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }
}

impl FromIterator<(String, f64)> for BandPowerSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut set = BandPowerSet::new();
        for (name, power) in iter {
            set.insert(name, power);
        }
        set
    }
}

impl NormalizedPowerSet {
    /// Wrap fractions that already sum to one.
    ///
    /// Callers outside the normalizer should go through
    /// `PowerNormalizer::normalize`, which enforces the sum.
    pub fn from_fractions(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        lookup(&self.entries, name)
    }

    pub fn require(&self, name: &str) -> FocusResult<f64> {
        self.get(name).ok_or_else(|| FocusError::MissingBand { name: name.to_string() })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Band holding the largest share
    pub fn dominant(&self) -> Option<(&str, f64)> {
        self.iter()
            .fold(None, |best: Option<(&str, f64)>, (name, share)| match best {
                Some((_, top)) if top >= share => best,
                _ => Some((name, share)),
            })
    }
}

fn lookup(entries: &[(String, f64)], name: &str) -> Option<f64> {
    entries.iter().find(|(n, _)| n == name).map(|(_, p)| *p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let mut set = BandPowerSet::new();
        set.insert("delta", 1.0);
        set.insert("theta", 2.0);
        set.insert("delta", 3.0);

        let names: Vec<_> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["delta", "theta"]);
        assert_eq!(set.get("delta"), Some(3.0));
        assert_eq!(set.total(), 5.0);
    }

    #[test]
    fn test_missing_band() {
        let set: BandPowerSet = vec![("alpha".to_string(), 1.0)].into_iter().collect();
        assert_eq!(set.require("beta"), Err(FocusError::MissingBand { name: "beta".into() }));
    }

    #[test]
    fn test_dominant_band() {
        let set = NormalizedPowerSet::from_fractions(vec![
            ("theta".to_string(), 0.2),
            ("alpha".to_string(), 0.7),
            ("beta".to_string(), 0.1),
        ]);
        assert_eq!(set.dominant(), Some(("alpha", 0.7)));
        assert!((set.sum() - 1.0).abs() < 1e-12);
    }
}
