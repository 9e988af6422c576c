//! # quayguard-core
//!
//! Core types and request-path logic for quayguard -- a download gate for
//! binary artifact repositories.
//!
//! This crate covers the synchronous half of the identify->correlate->enforce
//! pipeline: the component identity model and its per-ecosystem extraction
//! strategies, the per-artifact property state the gate persists, and the
//! cancel deciders the host's before-download hook consults. Everything here
//! is free of network I/O; the asynchronous scanning-service side lives in
//! `quayguard-intel`.

pub mod cancel;
pub mod config;
pub mod identity;
pub mod properties;
pub mod repo;
