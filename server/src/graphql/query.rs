use async_graphql::{Context, Object, Result};
use crm::activity_status::ActivityListViewModel;
use crm::dashboard::load_dashboard;
use crm::pipeline::PipelineViewModel;
use crm::services::DEFAULT_UPCOMING_LIMIT;
use entity::RecordId;
use tracing::instrument;

use super::types::{
    ActivityFilter, ActivityNode, ActivityRowNode, CompanyNode, ContactNode, DashboardNode,
    DealNode, PipelineBoardNode,
};
use super::{GraphqlData, api_error, collect};

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// All contacts, or those matching `search`, or those of one company.
    #[instrument(name = "graphql.contacts", skip_all)]
    async fn contacts(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
        company_id: Option<RecordId>,
    ) -> Result<Vec<ContactNode>> {
        let contacts = &GraphqlData::from_ctx(ctx)?.services.contacts;
        let found = match (company_id, search) {
            (Some(company_id), _) => contacts.by_company(company_id).await,
            (None, Some(query)) => contacts.search(&query).await,
            (None, None) => contacts.get_all().await,
        };
        found.map(collect).map_err(api_error)
    }

    #[instrument(name = "graphql.contact", skip(self, ctx))]
    async fn contact(&self, ctx: &Context<'_>, id: RecordId) -> Result<Option<ContactNode>> {
        let data = GraphqlData::from_ctx(ctx)?;
        let contact = data.services.contacts.get_by_id(id).await.map_err(api_error)?;
        Ok(contact.map(Into::into))
    }

    #[instrument(name = "graphql.companies", skip_all)]
    async fn companies(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
    ) -> Result<Vec<CompanyNode>> {
        let companies = &GraphqlData::from_ctx(ctx)?.services.companies;
        let found = match search {
            Some(query) => companies.search(&query).await,
            None => companies.get_all().await,
        };
        found.map(collect).map_err(api_error)
    }

    #[instrument(name = "graphql.company", skip(self, ctx))]
    async fn company(&self, ctx: &Context<'_>, id: RecordId) -> Result<Option<CompanyNode>> {
        let data = GraphqlData::from_ctx(ctx)?;
        let company = data.services.companies.get_by_id(id).await.map_err(api_error)?;
        Ok(company.map(Into::into))
    }

    #[instrument(name = "graphql.deals", skip_all)]
    async fn deals(
        &self,
        ctx: &Context<'_>,
        contact_id: Option<RecordId>,
        company_id: Option<RecordId>,
    ) -> Result<Vec<DealNode>> {
        let deals = &GraphqlData::from_ctx(ctx)?.services.deals;
        let found = match (contact_id, company_id) {
            (Some(contact_id), _) => deals.by_contact(contact_id).await,
            (None, Some(company_id)) => deals.by_company(company_id).await,
            (None, None) => deals.get_all().await,
        };
        found.map(collect).map_err(api_error)
    }

    /// The six pipeline stages in board order.
    async fn deal_stages(&self, ctx: &Context<'_>) -> Result<Vec<String>> {
        let data = GraphqlData::from_ctx(ctx)?;
        Ok(data
            .services
            .deals
            .stages()
            .iter()
            .map(|stage| stage.as_str().to_string())
            .collect())
    }

    #[instrument(name = "graphql.pipeline_board", skip_all)]
    async fn pipeline_board(&self, ctx: &Context<'_>) -> Result<PipelineBoardNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let mut view = PipelineViewModel::new(data.services.clone());
        view.load().await.map_err(api_error)?;
        Ok(view.board().clone().into())
    }

    /// Activity list rows in display order.
    #[instrument(name = "graphql.activities", skip_all)]
    async fn activities(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] filter: ActivityFilter,
        #[graphql(default)] search: String,
    ) -> Result<Vec<ActivityRowNode>> {
        let data = GraphqlData::from_ctx(ctx)?;
        let now = data.now();
        let mut view = ActivityListViewModel::new(data.services.clone());
        view.load().await.map_err(api_error)?;
        Ok(view
            .visible(filter.into(), &search, now)
            .into_iter()
            .map(|row| ActivityRowNode::new(row, now))
            .collect())
    }

    #[instrument(name = "graphql.upcoming_activities", skip_all)]
    async fn upcoming_activities(
        &self,
        ctx: &Context<'_>,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityNode>> {
        let data = GraphqlData::from_ctx(ctx)?;
        let now = data.now();
        let activities = data
            .services
            .activities
            .upcoming(limit.unwrap_or(DEFAULT_UPCOMING_LIMIT), now)
            .await
            .map_err(api_error)?;
        Ok(ActivityNode::list(activities, now))
    }

    #[instrument(name = "graphql.overdue_activities", skip_all)]
    async fn overdue_activities(&self, ctx: &Context<'_>) -> Result<Vec<ActivityNode>> {
        let data = GraphqlData::from_ctx(ctx)?;
        let now = data.now();
        let activities = data
            .services
            .activities
            .overdue(now)
            .await
            .map_err(api_error)?;
        Ok(ActivityNode::list(activities, now))
    }

    #[instrument(name = "graphql.dashboard", skip_all)]
    async fn dashboard(&self, ctx: &Context<'_>) -> Result<DashboardNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let now = data.now();
        let dashboard = load_dashboard(&data.services, now)
            .await
            .map_err(api_error)?;
        Ok(DashboardNode::new(dashboard, now))
    }
}
