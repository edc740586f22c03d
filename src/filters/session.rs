//! Tri-state session continuity.

use super::Equivalence;

/// Coarse playback state of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Session {
    /// Nothing is active.
    Stopped,
    /// Something is loaded but idle.
    Paused,
    /// Something is active.
    Playing,
}

impl Session {
    /// Returns `true` for the states whose repeats carry no information.
    #[inline]
    pub fn is_idle(self) -> bool {
        matches!(self, Session::Stopped | Session::Paused)
    }
}

/// Collapses repeated idle states into one notification.
///
/// The classifier maps each (possibly absent) value to a [`Session`]. Only
/// `Paused → Paused` and `Stopped → Stopped` are equivalent; every other
/// transition, including `Playing → Playing`, is forwarded so consumers still
/// see progress while something plays.
#[derive(Clone, Copy)]
pub struct Continuity<F> {
    classify: F,
}

impl<F> Continuity<F> {
    /// Wraps a session classifier.
    pub fn new(classify: F) -> Self {
        Self { classify }
    }
}

impl<V, F> Equivalence<V> for Continuity<F>
where
    F: Fn(Option<&V>) -> Session + Send + 'static,
{
    fn equivalent(&self, prev: Option<&V>, next: Option<&V>) -> bool {
        let (before, after) = ((self.classify)(prev), (self.classify)(next));
        before == after && after.is_idle()
    }
}
