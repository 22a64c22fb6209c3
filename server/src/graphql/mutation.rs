use async_graphql::{Context, Object, Result};
use crm::activity_status::toggle_complete;
use crm::forms::{submit_activity, submit_company, submit_contact, submit_deal};
use crm::mapping::ACTIVITY;
use crm::pipeline::set_stage;
use crm::{CrmError, ValidationErrors};
use entity::RecordId;
use entity::contact::{ContactPatch, ContactStatus};
use tracing::instrument;

use super::types::{
    ActivityInput, ActivityNode, BulkContactInput, BulkContactsPayload, BulkDeletePayload,
    CompanyInput, CompanyNode, ContactInput, ContactNode, DealInput, DealNode,
};
use super::{GraphqlData, api_error};

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    #[instrument(name = "graphql.create_contact", skip_all)]
    async fn create_contact(&self, ctx: &Context<'_>, input: ContactInput) -> Result<ContactNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let contact = submit_contact(&data.services.contacts, None, &input.into())
            .await
            .map_err(api_error)?;
        Ok(contact.into())
    }

    #[instrument(name = "graphql.update_contact", skip(self, ctx, input))]
    async fn update_contact(
        &self,
        ctx: &Context<'_>,
        id: RecordId,
        input: ContactInput,
    ) -> Result<ContactNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let contact = submit_contact(&data.services.contacts, Some(id), &input.into())
            .await
            .map_err(api_error)?;
        Ok(contact.into())
    }

    #[instrument(name = "graphql.delete_contact", skip(self, ctx))]
    async fn delete_contact(&self, ctx: &Context<'_>, id: RecordId) -> Result<RecordId> {
        let data = GraphqlData::from_ctx(ctx)?;
        data.services.contacts.delete(id).await.map_err(api_error)?;
        Ok(id)
    }

    /// Applies one status change and/or tag merge to every id. Per-id
    /// failures are reported in the payload.
    #[instrument(name = "graphql.bulk_update_contacts", skip_all)]
    async fn bulk_update_contacts(
        &self,
        ctx: &Context<'_>,
        ids: Vec<RecordId>,
        input: BulkContactInput,
    ) -> Result<BulkContactsPayload> {
        let data = GraphqlData::from_ctx(ctx)?;
        let mut patch = ContactPatch::with_added_tags(input.add_tags);
        if let Some(raw) = input.status {
            let status: ContactStatus = raw.parse().map_err(|err: entity::UnknownVariant| {
                let mut errors = ValidationErrors::new();
                errors.add("status", err.to_string());
                api_error(CrmError::from(errors))
            })?;
            patch.status = Some(status);
        }
        let outcome = data.services.contacts.bulk_update(&ids, patch).await;
        Ok(outcome.into())
    }

    #[instrument(name = "graphql.bulk_delete_contacts", skip_all)]
    async fn bulk_delete_contacts(
        &self,
        ctx: &Context<'_>,
        ids: Vec<RecordId>,
    ) -> Result<BulkDeletePayload> {
        let data = GraphqlData::from_ctx(ctx)?;
        let outcome = data.services.contacts.bulk_delete(&ids).await;
        Ok(outcome.into())
    }

    #[instrument(name = "graphql.create_company", skip_all)]
    async fn create_company(&self, ctx: &Context<'_>, input: CompanyInput) -> Result<CompanyNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let company = submit_company(&data.services.companies, None, &input.into())
            .await
            .map_err(api_error)?;
        Ok(company.into())
    }

    #[instrument(name = "graphql.update_company", skip(self, ctx, input))]
    async fn update_company(
        &self,
        ctx: &Context<'_>,
        id: RecordId,
        input: CompanyInput,
    ) -> Result<CompanyNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let company = submit_company(&data.services.companies, Some(id), &input.into())
            .await
            .map_err(api_error)?;
        Ok(company.into())
    }

    #[instrument(name = "graphql.delete_company", skip(self, ctx))]
    async fn delete_company(&self, ctx: &Context<'_>, id: RecordId) -> Result<RecordId> {
        let data = GraphqlData::from_ctx(ctx)?;
        data.services.companies.delete(id).await.map_err(api_error)?;
        Ok(id)
    }

    #[instrument(name = "graphql.create_deal", skip_all)]
    async fn create_deal(&self, ctx: &Context<'_>, input: DealInput) -> Result<DealNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let deal = submit_deal(&data.services.deals, None, &input.into())
            .await
            .map_err(api_error)?;
        Ok(deal.into())
    }

    #[instrument(name = "graphql.update_deal", skip(self, ctx, input))]
    async fn update_deal(
        &self,
        ctx: &Context<'_>,
        id: RecordId,
        input: DealInput,
    ) -> Result<DealNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let deal = submit_deal(&data.services.deals, Some(id), &input.into())
            .await
            .map_err(api_error)?;
        Ok(deal.into())
    }

    #[instrument(name = "graphql.delete_deal", skip(self, ctx))]
    async fn delete_deal(&self, ctx: &Context<'_>, id: RecordId) -> Result<RecordId> {
        let data = GraphqlData::from_ctx(ctx)?;
        data.services.deals.delete(id).await.map_err(api_error)?;
        Ok(id)
    }

    /// Moves a deal to another stage. Closed Won and Closed Lost force the
    /// probability to 100 and 0.
    #[instrument(name = "graphql.move_deal_stage", skip(self, ctx))]
    async fn move_deal_stage(
        &self,
        ctx: &Context<'_>,
        id: RecordId,
        stage: String,
    ) -> Result<DealNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let deal = set_stage(&data.services.deals, id, &stage)
            .await
            .map_err(api_error)?;
        Ok(deal.into())
    }

    #[instrument(name = "graphql.create_activity", skip_all)]
    async fn create_activity(
        &self,
        ctx: &Context<'_>,
        input: ActivityInput,
    ) -> Result<ActivityNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let activity = submit_activity(&data.services.activities, None, &input.into())
            .await
            .map_err(api_error)?;
        Ok(ActivityNode::new(activity, data.now()))
    }

    #[instrument(name = "graphql.update_activity", skip(self, ctx, input))]
    async fn update_activity(
        &self,
        ctx: &Context<'_>,
        id: RecordId,
        input: ActivityInput,
    ) -> Result<ActivityNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let activity = submit_activity(&data.services.activities, Some(id), &input.into())
            .await
            .map_err(api_error)?;
        Ok(ActivityNode::new(activity, data.now()))
    }

    #[instrument(name = "graphql.delete_activity", skip(self, ctx))]
    async fn delete_activity(&self, ctx: &Context<'_>, id: RecordId) -> Result<RecordId> {
        let data = GraphqlData::from_ctx(ctx)?;
        data.services.activities.delete(id).await.map_err(api_error)?;
        Ok(id)
    }

    #[instrument(name = "graphql.toggle_activity_complete", skip(self, ctx))]
    async fn toggle_activity_complete(
        &self,
        ctx: &Context<'_>,
        id: RecordId,
    ) -> Result<ActivityNode> {
        let data = GraphqlData::from_ctx(ctx)?;
        let activities = &data.services.activities;
        let current = activities
            .get_by_id(id)
            .await
            .map_err(api_error)?
            .ok_or_else(|| api_error(CrmError::NotFound { entity: ACTIVITY, id }))?;
        let toggled = toggle_complete(activities, &current)
            .await
            .map_err(api_error)?;
        Ok(ActivityNode::new(toggled, data.now()))
    }
}
