//! Thin I/O wrappers around the core: CSV ingestion and export.

pub mod csv;
