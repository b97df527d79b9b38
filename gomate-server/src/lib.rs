//! GoMate transport backend.
//!
//! Serves transport listings, details and timetables normalized from the
//! TransportAPI, with mock data when the upstream is unavailable, plus
//! favorites, a booking stub and user login for the GoMate app.

pub mod auth;
pub mod booking;
pub mod cache;
pub mod config;
pub mod storage;
pub mod transport;
pub mod web;
