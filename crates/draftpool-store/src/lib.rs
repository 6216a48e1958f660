//! PostgreSQL-backed draft store.

pub mod pg_draft_repository;
pub mod pg_item_catalog;
pub mod pg_notice_relay;
