//! Capture-and-report client: screenshots on a timer, a YES/NO verdict from a
//! hosted vision model, and a report to the dashboard server.

pub mod alerts;
pub mod capture;
pub mod classify;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod instance;
pub mod logging;
pub mod monitor;
pub mod report;
