//! League-scoped fan-out of draft notices to connected observers.

pub mod topics;

pub use topics::{DeliveryReport, LeagueTopics, ObserverId};
