//! Tablero: the backend for an admin dashboard.
//!
//! Serves paginated, filterable resource listings through a per-resource
//! cache, and ships the query-string, date and accessibility helpers the
//! dashboard front end relies on.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
