//! Shared library for the BirdTag media tagging services
//!
//! Holds everything both microservices depend on: the error taxonomy,
//! configuration resolution, the SQLite-backed media record store, the
//! tag histogram logic, and the blob store client.

pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod tags;

pub use crate::error::{Error, Result};
