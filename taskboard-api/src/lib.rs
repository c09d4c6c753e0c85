//! # Taskboard API Server Library
//!
//! HTTP layer of Taskboard: projects, tasks and subtasks shared between
//! invited participants.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `flash`: One-shot messages carried across redirects
//! - `middleware`: Session and security header middleware
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod flash;
pub mod middleware;
pub mod routes;
