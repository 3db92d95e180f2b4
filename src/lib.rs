//! Task Tracker API.
//!
//! A small REST backend for creating, searching and completing tasks.
//!
//! # Modules
//!
//! - `api`: HTTP handlers, DTOs and router
//! - `config`: Listener address and runtime settings
//! - `domain`: Task record and status vocabulary
//! - `infrastructure`: Persistence port and its storage adapters
//! - `service`: Business rules and error classification

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod service;
