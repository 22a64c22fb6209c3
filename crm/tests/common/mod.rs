#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use crm::seed::{SeededCrm, seed_demo};
use crm::{CrmServices, memory_gateway};
use platform_gateway::{MemoryGateway, Record, RecordGateway};
use serde_json::Value;

pub struct CrmTestContext {
    pub gateway: Arc<MemoryGateway>,
    pub services: CrmServices,
}

impl CrmTestContext {
    pub fn new() -> Self {
        let gateway = Arc::new(memory_gateway());
        let services = CrmServices::new(gateway.clone() as Arc<dyn RecordGateway>);
        Self { gateway, services }
    }

    pub async fn new_seeded() -> (Self, SeededCrm) {
        let ctx = Self::new();
        let seeded = seed_demo(&ctx.services, fixed_now())
            .await
            .expect("seed demo data");
        (ctx, seeded)
    }
}

/// Reference clock for seeded data.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("json object")
}
