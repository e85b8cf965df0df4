//! Delta-set triple.
//!
//! Partition of a value transition into `zero` (unchanged), `plus` (added)
//! and `minus` (removed). Triples are immutable once built; combinators return
//! new triples.

use serde::{Deserialize, Serialize};

/// Zero/plus/minus partition of a before-to-after value transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSetTriple<T> {
    zero: Vec<T>,
    plus: Vec<T>,
    minus: Vec<T>,
}

fn push_unique<T: Clone>(target: &mut Vec<T>, value: &T, eq: &impl Fn(&T, &T) -> bool) {
    if !target.iter().any(|v| eq(v, value)) {
        target.push(value.clone());
    }
}

fn contains<T>(set: &[T], value: &T, eq: &impl Fn(&T, &T) -> bool) -> bool {
    set.iter().any(|v| eq(v, value))
}

impl<T> DeltaSetTriple<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            zero: Vec::new(),
            plus: Vec::new(),
            minus: Vec::new(),
        }
    }

    /// Build from explicit buckets. The caller is responsible for disjointness.
    #[must_use]
    pub fn new(zero: Vec<T>, plus: Vec<T>, minus: Vec<T>) -> Self {
        Self { zero, plus, minus }
    }

    #[must_use]
    pub fn zero_only(values: Vec<T>) -> Self {
        Self::new(values, Vec::new(), Vec::new())
    }

    #[must_use]
    pub fn plus_only(values: Vec<T>) -> Self {
        Self::new(Vec::new(), values, Vec::new())
    }

    #[must_use]
    pub fn minus_only(values: Vec<T>) -> Self {
        Self::new(Vec::new(), Vec::new(), values)
    }

    #[must_use]
    pub fn zero(&self) -> &[T] {
        &self.zero
    }

    #[must_use]
    pub fn plus(&self) -> &[T] {
        &self.plus
    }

    #[must_use]
    pub fn minus(&self) -> &[T] {
        &self.minus
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zero.is_empty() && self.plus.is_empty() && self.minus.is_empty()
    }

    /// True when the transition changes nothing.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.plus.is_empty() || !self.minus.is_empty()
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Vec<T>, Vec<T>) {
        (self.zero, self.plus, self.minus)
    }

    /// Transform every value, keeping its bucket.
    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> DeltaSetTriple<U> {
        DeltaSetTriple {
            zero: self.zero.into_iter().map(&mut f).collect(),
            plus: self.plus.into_iter().map(&mut f).collect(),
            minus: self.minus.into_iter().map(&mut f).collect(),
        }
    }

    /// Fallible [`map`](Self::map); stops at the first error.
    pub fn try_map<U, E>(
        self,
        mut f: impl FnMut(T) -> Result<U, E>,
    ) -> Result<DeltaSetTriple<U>, E> {
        Ok(DeltaSetTriple {
            zero: self.zero.into_iter().map(&mut f).collect::<Result<_, _>>()?,
            plus: self.plus.into_iter().map(&mut f).collect::<Result<_, _>>()?,
            minus: self.minus.into_iter().map(&mut f).collect::<Result<_, _>>()?,
        })
    }
}

impl<T: Clone> DeltaSetTriple<T> {
    /// Partition `old` and `new` under the given equality:
    /// `zero = old ∩ new`, `plus = new − old`, `minus = old − new`.
    ///
    /// Duplicates within either input collapse to one value.
    pub fn from_old_new(old: &[T], new: &[T], eq: impl Fn(&T, &T) -> bool) -> Self {
        let mut triple = Self::empty();
        for value in old {
            if contains(new, value, &eq) {
                push_unique(&mut triple.zero, value, &eq);
            } else {
                push_unique(&mut triple.minus, value, &eq);
            }
        }
        for value in new {
            if !contains(old, value, &eq) {
                push_unique(&mut triple.plus, value, &eq);
            }
        }
        triple
    }

    /// Values after the change: `zero ∪ plus`.
    #[must_use]
    pub fn non_negative_values(&self) -> Vec<T> {
        self.zero.iter().chain(self.plus.iter()).cloned().collect()
    }

    /// Values before the change: `zero ∪ minus`.
    #[must_use]
    pub fn old_values(&self) -> Vec<T> {
        self.zero.iter().chain(self.minus.iter()).cloned().collect()
    }

    /// Every value in any bucket.
    #[must_use]
    pub fn all_values(&self) -> Vec<T> {
        self.zero
            .iter()
            .chain(self.plus.iter())
            .chain(self.minus.iter())
            .cloned()
            .collect()
    }

    /// Bucket-wise union under the given equality.
    ///
    /// A value present in `zero` of either side stays only in `zero`. A value
    /// that lands in both `plus` and `minus` is kept in `plus`.
    #[must_use]
    pub fn merge_with(&self, other: &Self, eq: impl Fn(&T, &T) -> bool) -> Self {
        let mut zero = Vec::new();
        for value in self.zero.iter().chain(other.zero.iter()) {
            push_unique(&mut zero, value, &eq);
        }
        let mut plus = Vec::new();
        for value in self.plus.iter().chain(other.plus.iter()) {
            if !contains(&zero, value, &eq) {
                push_unique(&mut plus, value, &eq);
            }
        }
        let mut minus = Vec::new();
        for value in self.minus.iter().chain(other.minus.iter()) {
            if !contains(&zero, value, &eq) && !contains(&plus, value, &eq) {
                push_unique(&mut minus, value, &eq);
            }
        }
        Self { zero, plus, minus }
    }

    /// Move every value into `plus` (used when a condition turns on).
    #[must_use]
    pub fn into_plus(self) -> Self {
        let mut plus = self.zero;
        plus.extend(self.plus);
        Self::plus_only(plus)
    }

    /// Keep only the values after the change, all in `zero` (used when a
    /// condition holds in both states).
    #[must_use]
    pub fn into_zero(self) -> Self {
        let mut zero = self.zero;
        zero.extend(self.plus);
        Self::new(zero, Vec::new(), Vec::new())
    }

    /// Move every value into `minus` (used when a condition turns off).
    #[must_use]
    pub fn into_minus(self) -> Self {
        let mut minus = self.zero;
        minus.extend(self.minus);
        Self::minus_only(minus)
    }
}

impl<T: Clone + PartialEq> DeltaSetTriple<T> {
    /// [`merge_with`](Self::merge_with) using `==`.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        self.merge_with(other, |a, b| a == b)
    }

    #[must_use]
    pub fn contains_in_zero(&self, value: &T) -> bool {
        self.zero.contains(value)
    }

    #[must_use]
    pub fn contains_in_plus(&self, value: &T) -> bool {
        self.plus.contains(value)
    }

    #[must_use]
    pub fn contains_in_minus(&self, value: &T) -> bool {
        self.minus.contains(value)
    }
}

impl<T> Default for DeltaSetTriple<T> {
    fn default() -> Self {
        Self::empty()
    }
}
