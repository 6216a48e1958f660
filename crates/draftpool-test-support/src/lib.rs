//! Shared test mocks and utilities for the Draftpool draft engine.

mod clock;
mod fixture;
mod notifier;
mod repository;
mod rng;

pub use clock::FixedClock;
pub use fixture::LeagueFixture;
pub use notifier::RecordingNotifier;
pub use repository::{FailingDraftRepository, InMemoryDraftRepository, StaticItemCatalog};
pub use rng::{MockRng, SequenceRng};
