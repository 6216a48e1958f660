//! Draftpool Core — shared domain abstractions.
//!
//! This crate defines the records, traits and error taxonomy that the draft
//! context, the store and the broadcaster all depend on. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod model;
pub mod notice;
pub mod repository;
pub mod rng;
