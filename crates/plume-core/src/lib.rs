//! Plume Core Library
//!
//! This crate provides the core functionality for Plume, a tool for
//! writing markdown documents locally and publishing them as committed
//! files in a git-backed remote repository.
//!
//! # Architecture
//!
//! - **Sync engine**: optimistic-concurrency reads/writes and atomic
//!   multi-file commits built from the store's object graph
//!   (blob -> tree -> commit -> branch ref)
//! - **Object store**: a thin typed client over the remote REST API, with
//!   an in-memory implementation for tests
//! - **Rendering**: markdown -> sanitized HTML, a pure function with a
//!   fixed allow-list
//! - **Drafts**: local persistence of unpublished documents
//!
//! # Quick Start
//!
//! ```text
//! let remote = config.remote()?;
//! let store = GithubClient::new(&remote);
//!
//! // Publish one document
//! engine::upsert_file(&store, "posts/hello.md", b"# Hello", "publish: hello").await?;
//!
//! // Publish several atomically
//! engine::commit_batch(&store, &writes, "publish 3 posts").await?;
//! ```
//!
//! # Modules
//!
//! - `engine`: sync operations (main entry point)
//! - `store`: object store trait and clients
//! - `render`: rendering pipeline
//! - `draft`: draft persistence
//! - `models`: document data structures
//! - `config`: application configuration

pub mod config;
pub mod draft;
pub mod engine;
pub mod error;
pub mod models;
pub mod render;
pub mod store;

pub use config::{Config, RemoteConfig, DEFAULT_BRANCH};
pub use draft::{DraftStore, FileDraftStore};
pub use error::{SyncError, SyncResult};
pub use models::{Draft, MARKUP_EXTENSION};
pub use render::{extract_title, render, slugify};
pub use store::{CommitResult, FileWrite, GithubClient, MemoryStore, ObjectStore};
