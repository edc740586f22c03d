//! Domain models served through the engine.
//!
//! - [`music`]: currently-playing state with its change predicates
//! - [`commits`]: recent commits served from a precached list

pub mod commits;
pub mod music;
