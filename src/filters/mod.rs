//! # Change filters: suppress deliveries that carry no new information.
//!
//! A [`ChangeFilter`] sits between a broadcaster subscription and its consumer and
//! remembers the last forwarded value. Whether a new value "differs" is decided by
//! one pluggable [`Equivalence`] predicate:
//!
//! - [`SameBy`] - equal on a domain-chosen subset of fields
//! - [`Equal`] - full `PartialEq`
//! - [`Continuity`] - tri-state [`Session`] machine; only repeated idle states collapse
//!
//! ## Rules (all predicates)
//! - Memory starts as an absent value (session `Stopped`).
//! - Errors are always forwarded and reset the memory to absent.
//! - Otherwise a result is forwarded iff it is **not** equivalent to the last forwarded one,
//!   so leading empty results are suppressed and the first value always gets through.
//! - The filter's output closes when its input closes.

mod change;
mod equivalence;
mod session;

pub use change::ChangeFilter;
pub use equivalence::{Equal, Equivalence, SameBy};
pub use session::{Continuity, Session};
