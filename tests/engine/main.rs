//! End-to-end tests across storage, engine and ingestion.

mod common;

mod composite_keys;
mod config;
mod durability;
mod history_order;
mod index_completeness;
mod pagination;
mod round_trip;
mod validation;
