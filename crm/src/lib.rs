//! CRM core over a records gateway: entity services, the deal pipeline and
//! activity view-models, forms, CSV export and dashboard statistics.

pub mod activity_status;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod forms;
pub mod lookup;
pub mod mapping;
pub mod pipeline;
pub mod seed;
pub mod services;

use platform_gateway::MemoryGateway;

pub use error::{CrmError, CrmResult, ValidationErrors};
pub use services::{BulkOutcome, CrmServices};

/// In-memory gateway with the four CRM collections registered under the
/// current field schema.
pub fn memory_gateway() -> MemoryGateway {
    [
        mapping::CONTACT,
        mapping::COMPANY,
        mapping::DEAL,
        mapping::ACTIVITY,
    ]
    .into_iter()
    .fold(MemoryGateway::new(), |gateway, entity| {
        gateway.with_collection(entity, mapping::fields_of(entity).unwrap_or_default())
    })
}
