//! # TaggerDB
//!
//! Catalog the files of a storage tree by content and organize them with
//! tags.
//!
//! A scan walks the tree, hashes every regular file (SHA-256), and records
//! each distinct `(digest, size)` exactly once, no matter how many copies
//! or names the content has. Tags are attached to catalogued files
//! afterwards; every tag exists once and every file/tag link at most once.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐
//! │  Storage │──▶│   Scan   │──▶│  Catalog  │◀──┐
//! │   tree   │   │ + Digest │   │  (SQLite) │   │
//! └──────────┘   └──────────┘   └───────────┘   │
//!                                          ┌─────────┐
//!                                          │ Tagging │
//!                                          └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! taggerdb init                         # create tagger.db3
//! taggerdb scan -d /srv/storage         # catalogue new content
//! taggerdb tag photos/cat.jpg pets      # tag a catalogued file
//! taggerdb files --tag pets
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`digest`] | Streaming SHA-256 of file contents |
//! | [`catalog`] | Catalog store: files, tags, associations |
//! | [`scan`] | Storage tree reconciliation |
//! | [`tagging`] | Tag association |
//! | [`db`] | SQLite connection |
//! | [`migrate`] | Schema creation and versioning |
//! | [`config`] | TOML configuration |
//! | [`error`] | Error types |
//! | [`progress`] | Scan output |

pub mod catalog;
pub mod config;
pub mod db;
pub mod digest;
pub mod error;
pub mod list;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod scan;
pub mod stats;
pub mod tagging;
