//! # schedule-guard
//!
//! Double-booking checks for gym class schedules.
//!
//! A schedule is active over a closed range of calendar dates and, on each of
//! those dates, over a time-of-day window. Two schedules conflict only when
//! both dimensions overlap. Dates use a closed test; times use an open test,
//! so back-to-back classes (one ends at 7:00 PM, the next starts at 7:00 PM)
//! never conflict.
//!
//! The validator itself ([`has_overlap`]) is a pure function over raw string
//! fields. Records that fail to parse are skipped rather than raised, so legacy
//! documents never block new writes.
//!
//! ## Modules
//!
//! - [`parse`] — `dd/MM/yyyy` dates and 12h/24h time-of-day strings
//! - [`interval`] — `Interval` (raw fields) and `ParsedInterval` (comparable values)
//! - [`overlap`] — `has_overlap` and the enumerating `find_overlaps`
//! - [`schedule`] — the `schedules` collection record
//! - [`store`] — document-store port, filters, subscriptions, in-memory adapter
//! - [`repository`] — `ScheduleRepository`: validated create/update and queries
//! - [`config`] — repository configuration
//! - [`error`] — Error types

pub mod config;
pub mod error;
pub mod interval;
pub mod overlap;
pub mod parse;
pub mod repository;
pub mod schedule;
pub mod store;

pub use config::RepositoryConfig;
pub use error::ScheduleError;
pub use interval::{Interval, ParsedInterval};
pub use overlap::{find_overlaps, has_overlap, Overlap};
pub use parse::{format_time, parse_date, parse_time};
pub use repository::ScheduleRepository;
pub use schedule::{ClassType, Schedule};
pub use store::{Document, DocumentStore, Filter, MemoryStore, Subscription};
