pub mod registry;
pub mod statement;

pub use registry::RegistryClient;
pub use statement::{AccountRow, ReportType, StatementClient, StatementKind};

/// Business-level success status shared by all upstream operations. Any
/// other status on a transport-successful response means "no such record",
/// not an error.
pub(crate) const STATUS_OK: &str = "000";
