//! Route modules.

pub mod draft;
pub mod health;
pub mod ws;
