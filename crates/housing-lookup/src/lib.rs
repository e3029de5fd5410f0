//! Lookup core and back-office building blocks for a student-housing rental marketplace.
//!
//! The centerpiece is [`lookup`], the debounced, token-sequenced autocomplete used by city and
//! institution fields. [`catalog`] provides a searchable city/institution catalog (both served
//! over HTTP and consumed through an HTTP client), while [`cache`] and [`workflows`] cover the
//! entity cache and review/submission state machines used by the back-office.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod lookup;
pub mod telemetry;
pub mod workflows;
