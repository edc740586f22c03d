//! Equivalence predicates over optional values.

/// Decides whether `next` carries nothing new compared to `prev`.
///
/// `None` on either side is an absent value (the producer had nothing to report).
pub trait Equivalence<V>: Send + 'static {
    /// Returns `true` if `next` should be suppressed after `prev`.
    fn equivalent(&self, prev: Option<&V>, next: Option<&V>) -> bool;
}

/// Equality on a caller-chosen subset of fields.
///
/// Two absent values are equivalent; absent vs present never is.
///
/// ```
/// use pollcast::{Equivalence, SameBy};
///
/// struct Reading { celsius: i32, taken_at: u64 }
///
/// let same = SameBy::new(|a: &Reading, b: &Reading| a.celsius == b.celsius);
/// let a = Reading { celsius: 20, taken_at: 1 };
/// let b = Reading { celsius: 20, taken_at: 2 };
/// assert!(same.equivalent(Some(&a), Some(&b)));
/// # let _ = (a.taken_at, b.taken_at);
/// ```
#[derive(Clone, Copy)]
pub struct SameBy<F> {
    same: F,
}

impl<F> SameBy<F> {
    /// Wraps a field-subset comparison.
    pub fn new(same: F) -> Self {
        Self { same }
    }
}

impl<V, F> Equivalence<V> for SameBy<F>
where
    F: Fn(&V, &V) -> bool + Send + 'static,
{
    fn equivalent(&self, prev: Option<&V>, next: Option<&V>) -> bool {
        match (prev, next) {
            (Some(a), Some(b)) => (self.same)(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Full structural equality.
#[derive(Clone, Copy, Debug, Default)]
pub struct Equal;

impl<V: PartialEq> Equivalence<V> for Equal {
    fn equivalent(&self, prev: Option<&V>, next: Option<&V>) -> bool {
        prev == next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_by_compares_subset_only() {
        let same = SameBy::new(|a: &(u8, u8), b: &(u8, u8)| a.0 == b.0);
        assert!(same.equivalent(Some(&(1, 1)), Some(&(1, 9))));
        assert!(!same.equivalent(Some(&(1, 1)), Some(&(2, 1))));
    }

    #[test]
    fn test_absent_values() {
        let same: &dyn Equivalence<u8> = &SameBy::new(|a: &u8, b: &u8| a == b);
        assert!(same.equivalent(None, None));
        assert!(!same.equivalent(None, Some(&1)));
        assert!(!same.equivalent(Some(&1), None));
        assert!(Equivalence::<u8>::equivalent(&Equal, None, None));
        assert!(!Equal.equivalent(Some(&1u8), Some(&2u8)));
    }
}
