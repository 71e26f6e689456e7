//! Scoutboard - health dashboard for the model scouter.
//!
//! The scouter probes hosted models on a schedule and records each run in a
//! SQLite file. This crate turns those runs into rolling health figures,
//! serves them as JSON and drives an interactive dashboard session over them.

pub mod client;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod db;
pub mod stats;
pub mod web;
