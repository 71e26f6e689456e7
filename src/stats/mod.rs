//! Health derivation and time-series aggregation.
//!
//! - [`sparkline`]: bar geometry for recent latency samples
//! - [`health`]: uptime → health state
//! - [`rolling`]: windowed uptime, latency and failure streaks
//! - [`timeline`]: running-uptime and latency series for the history chart
//! - [`analysis`]: multi-run trends, stability candidates and recommendations
//! - [`service`]: server-side payloads built from the probe store

mod analysis;
mod health;
mod rolling;
mod service;
mod sparkline;
mod timeline;

pub use analysis::*;
pub use health::*;
pub use rolling::*;
pub use service::*;
pub use sparkline::*;
pub use timeline::*;
