//! ReadyNews - A headline proxy with an infinite-scroll list
//!
//! This crate forwards top-headline queries to a third-party provider with a
//! server-held key, and pages through the results with an incremental list
//! controller that knows when to stop.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod render;
pub mod routes;
pub mod upstream;
