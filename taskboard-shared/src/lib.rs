//! # Taskboard Shared Library
//!
//! Domain types, persistence and security primitives used by the Taskboard
//! API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models for users, projects, participants, tasks,
//!   subtasks and notifications
//! - `auth`: Passwords, sessions, recovery tokens, login limiting and the
//!   permission policy
//! - `db`: Connection pool and migrations
//! - `mail`: Outgoing email seam

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
