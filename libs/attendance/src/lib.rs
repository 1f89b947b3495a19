//! Attendance marking and analytics core for the college attendance backend
//!
//! Teachers issue short-lived session codes; students mark attendance by
//! submitting a code with their location. The [`marking`] engine guards the
//! append-only ledger with time-window, geofence and device-reuse checks,
//! and the [`analytics`] and [`register`] modules derive reports from the
//! same data.
//!
//! Persistence is abstracted behind the traits in [`store`]; the
//! [`memory`] module provides an in-process implementation.

pub mod analytics;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod geo;
pub mod marking;
pub mod memory;
pub mod models;
pub mod register;
pub mod registry;
pub mod store;
pub mod time;

pub use config::AttendanceConfig;
pub use error::{AttendanceError, AttendanceResult, ErrorKind};
