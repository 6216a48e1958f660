//! Draftpool — Snake Draft bounded context.
//!
//! Responsible for snake-order turn calculation, pick validation and commit,
//! and the start/reset/skip/complete lifecycle of a league's draft.

pub mod application;
pub mod domain;
