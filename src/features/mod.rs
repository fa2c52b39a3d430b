//! Feature schema, client records and reconciliation

pub mod layout;
pub mod record;
pub mod reconcile;
pub mod input;

pub use layout::{FeatureSchema, FeatureValue, LayoutInfo};
pub use record::{ParsedRecord, RecordIssue, StudentRecord};
pub use reconcile::{check_required, reconcile, ReconciledRecord};
pub use input::InputError;
