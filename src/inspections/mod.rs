//! Inspections
//! Mission: Inspection plans, their records, and write-time record scoring

pub mod api;
pub mod models;
pub mod scoring;
pub mod store;

pub use models::{InspectionPlan, InspectionRecord, InspectionStatus};
pub use scoring::{rank_record, record_rank, Flag};
pub use store::InspectionStore;
