mod mutation;
mod query;
mod types;

use async_graphql::{Context, EmptySubscription, ErrorExtensions, Schema};
use chrono::{DateTime, Utc};
use crm::{CrmError, CrmServices};
use platform_api::ApiError;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Request-independent context shared by every resolver.
#[derive(Clone)]
pub struct GraphqlData {
    pub services: CrmServices,
    clock: fn() -> DateTime<Utc>,
}

impl GraphqlData {
    pub fn new(services: CrmServices) -> Self {
        Self {
            services,
            clock: Utc::now,
        }
    }

    /// Replaces the clock used for activity status and due-date queries.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn from_ctx<'ctx>(ctx: &Context<'ctx>) -> async_graphql::Result<&'ctx Self> {
        ctx.data::<Self>()
    }
}

pub fn build_schema(data: GraphqlData) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(data)
        .finish()
}

/// Maps a CRM failure onto the client-facing error envelope. Gateway and
/// mapping failures are masked as internal errors.
fn api_error(err: CrmError) -> async_graphql::Error {
    let api = match err {
        CrmError::Validation(errors) => ApiError::Validation(
            errors
                .iter()
                .map(|(field, message)| (field.to_string(), message.to_string()))
                .collect(),
        ),
        CrmError::InvalidStage(stage) => ApiError::InvalidStage(stage),
        CrmError::NotFound { entity, id } => ApiError::NotFound(format!("{entity} {id}")),
        CrmError::Rejected { message, .. } => ApiError::Rejected(message),
        other @ (CrmError::Gateway(_) | CrmError::Mapping { .. }) => {
            ApiError::internal(other.into())
        }
    };
    api.extend()
}

fn collect<T, N: From<T>>(items: Vec<T>) -> Vec<N> {
    items.into_iter().map(N::from).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use async_graphql::Request;
    use chrono::TimeZone;
    use crm::memory_gateway;
    use crm::seed::seed_demo;
    use platform_gateway::{MemoryGateway, RecordGateway};
    use serde_json::{Value, json};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    async fn seeded_schema() -> (SchemaType, Arc<MemoryGateway>) {
        let gateway = Arc::new(memory_gateway());
        let services = CrmServices::new(gateway.clone() as Arc<dyn RecordGateway>);
        seed_demo(&services, fixed_now()).await.unwrap();
        let schema = build_schema(GraphqlData::new(services).with_clock(fixed_now));
        (schema, gateway)
    }

    async fn execute(schema: &SchemaType, query: &str) -> Value {
        let response = schema.execute(Request::new(query)).await;
        serde_json::to_value(&response).unwrap()
    }

    fn error_code(body: &Value) -> &Value {
        &body["errors"][0]["extensions"]["code"]
    }

    #[tokio::test]
    async fn contacts_query_lists_seeded_contacts() {
        let (schema, _) = seeded_schema().await;
        let body = execute(&schema, "{ contacts { fullName status } }").await;
        let contacts = body["data"]["contacts"].as_array().unwrap();
        assert_eq!(contacts.len(), 4);
        assert_eq!(contacts[0], json!({"fullName": "Ada Lovelace", "status": "Active"}));

        let body = execute(&schema, r#"{ contacts(search: "TORV") { email } }"#).await;
        assert_eq!(body["data"]["contacts"], json!([{"email": "linus@fossrust.test"}]));
    }

    #[tokio::test]
    async fn pipeline_board_has_every_stage() {
        let (schema, _) = seeded_schema().await;
        let body = execute(
            &schema,
            "{ pipelineBoard { totalCount columns { stage count cards { companyName } } } }",
        )
        .await;
        let board = &body["data"]["pipelineBoard"];
        assert_eq!(board["totalCount"], json!(6));
        let stages: Vec<&str> = board["columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|column| column["stage"].as_str().unwrap())
            .collect();
        assert_eq!(
            stages,
            ["Lead", "Qualified", "Proposal", "Negotiation", "Closed Won", "Closed Lost"]
        );
        assert_eq!(board["columns"][0]["cards"][0]["companyName"], json!("ACME, Inc."));
    }

    #[tokio::test]
    async fn move_deal_stage_forces_terminal_probability() {
        let (schema, _) = seeded_schema().await;
        let body = execute(
            &schema,
            r#"mutation { moveDealStage(id: 1, stage: "Closed Won") { stage probability isOpen } }"#,
        )
        .await;
        assert_eq!(
            body["data"]["moveDealStage"],
            json!({"stage": "Closed Won", "probability": 100, "isOpen": false})
        );
    }

    #[tokio::test]
    async fn invalid_stage_is_reported_without_mutation() {
        let (schema, gateway) = seeded_schema().await;
        let before = gateway.mutation_count();
        let body = execute(
            &schema,
            r#"mutation { moveDealStage(id: 1, stage: "Prospecting") { id } }"#,
        )
        .await;
        assert_eq!(error_code(&body), &json!("INVALID_STAGE"));
        assert_eq!(gateway.mutation_count(), before);
    }

    #[tokio::test]
    async fn validation_errors_name_each_field() {
        let (schema, gateway) = seeded_schema().await;
        let before = gateway.mutation_count();
        let body = execute(
            &schema,
            r#"mutation { createContact(input: { email: "not-an-email" }) { id } }"#,
        )
        .await;
        assert_eq!(error_code(&body), &json!("VALIDATION"));
        let fields = &body["errors"][0]["extensions"]["fields"];
        assert_eq!(fields["firstName"], json!("First name is required"));
        assert_eq!(fields["email"], json!("Please enter a valid email"));
        assert_eq!(gateway.mutation_count(), before);
    }

    #[tokio::test]
    async fn bulk_delete_reports_missing_ids() {
        let (schema, _) = seeded_schema().await;
        let body = execute(
            &schema,
            "mutation { bulkDeleteContacts(ids: [2, 99]) { deletedIds successCount errorCount failures { id } } }",
        )
        .await;
        assert_eq!(
            body["data"]["bulkDeleteContacts"],
            json!({"deletedIds": [2], "successCount": 1, "errorCount": 1, "failures": [{"id": 99}]})
        );
    }

    #[tokio::test]
    async fn activity_queries_use_the_request_clock() {
        let (schema, _) = seeded_schema().await;
        let body = execute(&schema, "{ overdueActivities { subject status } }").await;
        assert_eq!(
            body["data"]["overdueActivities"],
            json!([{"subject": "Send proposal", "status": "Overdue"}])
        );

        let body = execute(
            &schema,
            "{ activities(filter: COMPLETED) { contactName activity { subject } } }",
        )
        .await;
        assert_eq!(
            body["data"]["activities"],
            json!([{"contactName": "Ada Lovelace", "activity": {"subject": "Discovery call"}}])
        );
    }

    #[tokio::test]
    async fn dashboard_totals() {
        let (schema, _) = seeded_schema().await;
        let body = execute(
            &schema,
            "{ dashboard { stats { activeDeals wonDeals totalRevenue pipelineValue } } }",
        )
        .await;
        assert_eq!(
            body["data"]["dashboard"]["stats"],
            json!({"activeDeals": 4, "wonDeals": 1, "totalRevenue": 6500.0, "pipelineValue": 81800.0})
        );
    }

    #[tokio::test]
    async fn toggling_a_missing_activity_is_not_found() {
        let (schema, _) = seeded_schema().await;
        let body = execute(&schema, "mutation { toggleActivityComplete(id: 404) { id } }").await;
        assert_eq!(error_code(&body), &json!("NOT_FOUND"));
    }

    #[tokio::test]
    async fn gateway_outage_is_masked() {
        let (schema, gateway) = seeded_schema().await;
        gateway.set_fail_on_fetch(true);
        let body = execute(&schema, "{ companies { name } }").await;
        assert_eq!(error_code(&body), &json!("INTERNAL"));
        assert_eq!(body["errors"][0]["message"], json!("internal server error"));
    }
}
