//! HTTP server for the courier messaging-history service.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
