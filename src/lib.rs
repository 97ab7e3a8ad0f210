//! AI-readiness audit engine.
//!
//! Scanners inspect one signal each (llms.txt, robots.txt, JSON-LD, ...),
//! the registry runs them with failure isolation, and the aggregator turns
//! the results into a weighted report conditioned on the site's profile.

pub mod config;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod lifecycle;
pub mod service;

pub use config::EngineConfig;
pub use domain::{IndicatorResult, IndicatorStatus, Report, ScanContext, SiteProfile};
pub use error::{Result, ScanError};
pub use service::{AuditEngine, PageInput, Scanner, ScannerRegistry};
