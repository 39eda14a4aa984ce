//! Core domain types and logic.

pub mod bar_series;
pub mod config;
pub mod config_validation;
pub mod detector;
pub mod error;
pub mod evaluators;
pub mod filters;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod scanner;
pub mod setup;
pub mod simulation;
pub mod sizing;
