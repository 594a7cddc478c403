//! Oracle schema utilities for coursework databases.
//!
//! `oraschema` lists a schema's tables, inspects Flyway's migration history,
//! checks that an application's tables exist, runs ad-hoc SQL, and wipes a
//! schema clean. It also merges split API-collection JSON files.
//!
//! # Teardown
//!
//! Wiping a schema is a three-phase pipeline over a single catalog snapshot:
//!
//! | Phase | Statement | On failure |
//! |-------|-----------|------------|
//! | Inventory | `USER_TABLES`, `USER_SEQUENCES`, `USER_CONSTRAINTS` | abort the run |
//! | Disable foreign keys | `ALTER TABLE … DISABLE CONSTRAINT …` | record, continue |
//! | Drop | `DROP TABLE … CASCADE CONSTRAINTS`, `DROP SEQUENCE …` | record, continue |
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML, `.env` and environment variables
//! - [`db`]: Connection/query traits, scoped session leases, the Oracle driver adapter
//! - [`schema`]: Catalog inventory, teardown, Flyway history, the [`schema::SchemaAdmin`] facade
//! - [`collection`]: API-collection JSON merge
//! - [`cli`]: Subcommand implementations and the interactive menu

pub mod cli;
pub mod collection;
pub mod config;
pub mod db;
pub mod error;
pub mod schema;
