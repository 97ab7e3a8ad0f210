pub mod aggregator;
pub mod applicability;
pub mod engine;
pub mod http;
pub mod profile;
pub mod registry;
pub mod scanner;

pub use aggregator::{Aggregator, IndicatorRollup};
pub use applicability::{applicability_for, applicability_status, categories_for};
pub use engine::{AuditEngine, PageInput};
pub use http::{FetchResult, Fetcher};
pub use profile::detect_profile;
pub use registry::ScannerRegistry;
pub use scanner::{Scanner, ScannerScope};
