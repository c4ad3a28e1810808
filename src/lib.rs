//! Blog comment moderation service.
mod auth;
mod config;
mod db;
mod endpoints;
pub mod error;
mod guard;
mod metrics;
mod models;
mod serve;
mod submission;
mod webhook;

pub use serve::run;
use serve::{AppState, Error, Result};
