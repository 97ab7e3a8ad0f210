//! Domain entities: scan inputs, indicator results, profiles and the report.

pub mod evidence;
pub mod models;
pub mod report;

pub use evidence::*;
pub use models::*;
pub use report::*;
