pub mod error;
pub mod report;
pub mod store;
pub mod utils;

// Re-export common items
pub use error::{ReporterError, SharedError};
pub use report::types::{SharedTestResult, TestCase, TestResult, TestStatus};
pub use report::{PostgresReporter, Reporter};
pub use utils::config::ReporterOptions;
