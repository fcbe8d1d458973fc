use std::hash::Hash;

use indexmap::IndexSet;

use crate::error::AvengerScaleError;

/// Maps each domain value to the range value at the same position, cycling
/// through the range when the domain is longer.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalScale<K: Hash + Eq, V> {
    domain: IndexSet<K>,
    range: Vec<V>,
    unknown: Option<V>,
}

impl<K: Hash + Eq + Clone, V: Clone> OrdinalScale<K, V> {
    pub fn new(domain: Vec<K>, range: Vec<V>) -> Result<Self, AvengerScaleError> {
        if range.is_empty() {
            return Err(AvengerScaleError::EmptyRange);
        }
        Ok(Self {
            domain: domain.into_iter().collect(),
            range,
            unknown: None,
        })
    }

    /// Value returned for inputs outside the domain
    pub fn with_unknown(mut self, unknown: V) -> Self {
        self.unknown = Some(unknown);
        self
    }

    pub fn scale(&self, value: &K) -> Option<V> {
        match self.domain.get_index_of(value) {
            Some(i) => Some(self.range[i % self.range.len()].clone()),
            None => self.unknown.clone(),
        }
    }

    pub fn domain(&self) -> impl Iterator<Item = &K> {
        self.domain.iter()
    }

    pub fn range(&self) -> &[V] {
        &self.range
    }

    /// Whether the domain has more entries than the range, so values repeat
    pub fn wraps(&self) -> bool {
        self.domain.len() > self.range.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_wraps() -> Result<(), AvengerScaleError> {
        let scale = OrdinalScale::new(vec!["a", "b", "c"], vec![1, 2])?;
        assert_eq!(scale.scale(&"a"), Some(1));
        assert_eq!(scale.scale(&"c"), Some(1));
        assert!(scale.wraps());
        Ok(())
    }

    #[test]
    fn test_ordinal_unknown() -> Result<(), AvengerScaleError> {
        let scale = OrdinalScale::new(vec!["a"], vec!["red"])?.with_unknown("gray");
        assert_eq!(scale.scale(&"zzz"), Some("gray"));
        let no_unknown = OrdinalScale::new(vec!["a"], vec!["red"])?;
        assert_eq!(no_unknown.scale(&"zzz"), None);
        Ok(())
    }

    #[test]
    fn test_ordinal_empty_range() {
        assert_eq!(
            OrdinalScale::<&str, i32>::new(vec!["a"], vec![]).unwrap_err(),
            AvengerScaleError::EmptyRange
        );
    }
}
