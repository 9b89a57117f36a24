//! # Data Cleaning Workbench Core
//!
//! Transformation, history and deduplication engine for tabular datasets.
//!
//! This crate is the backend core of a data-cleaning workbench: it executes
//! cleaning operations (imputation, normalization, discretization, date-part
//! extraction, find-and-replace, outlier removal, one-hot encoding) against
//! a repository of tables, records every action in an append-only history
//! ledger with a typed inverse for undo, and detects near-duplicate rows
//! for reviewer-driven merging.
//!
//! ## Features
//!
//! - **Transformations**: column operations that validate, mutate
//!   all-or-nothing, and describe themselves
//! - **Undo**: compensating inverse actions stored with each history entry
//!   and re-executed on demand
//! - **Deduplication**: sorted-neighbourhood blocking, per-column similarity,
//!   unsupervised match classification, union-find grouping, and a soft-delete
//!   review workflow
//! - **Profiling**: column statistics and chart-ready histograms/breakdowns
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: typed identifiers and the public DTO surface
//! - [`models`]: tables, columns, rows and the typed cell value domain
//! - [`db`]: repository traits, error taxonomy, and the in-memory backend
//! - [`services`]: the engines (transform, history, dedup, charts)
//! - [`routes`]: serializable request/response types and operation names
//!
//! Engines are constructed with an `Arc<dyn FullRepository>`; a host
//! application picks the backend through [`db::RepositoryFactory`] and owns
//! request routing, import and authentication itself.

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod routes;

pub mod services;
