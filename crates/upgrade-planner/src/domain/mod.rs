//! Plan generation domain logic.

pub mod docs;
pub mod plan;
pub mod topics;
pub mod versions;

pub use docs::{document_catalog, DocumentFetcher, HttpDocumentFetcher, ReferenceDocs};
pub use plan::{save_plan, PlanSections, PlannerDomain};
pub use topics::TopicAnalyzer;
pub use versions::{validate_versions, MinorVersion, VersionCheck};
