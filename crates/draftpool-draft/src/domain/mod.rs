//! Draft domain: ordering math, rules and commands.

pub mod commands;
pub mod order;
pub mod rules;
