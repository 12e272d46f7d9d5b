//! Assembles the analytics event for one completed action.

use relay_core::{
    insert_id, stable_id, ActionResult, AnalyticsEvent, RequestContext, Result, TrackedAction,
};

use crate::enrichment::{resolve_user, GeoResolver};

/// Builds [`AnalyticsEvent`]s from a tracked action and its result.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    geo: GeoResolver,
}

impl EventBuilder {
    pub fn new(geo: GeoResolver) -> Self {
        Self { geo }
    }

    /// Builds the event.
    ///
    /// Fails only when the payload has no stable `id`. That check runs
    /// before any enrichment so a payload that cannot be deduplicated never
    /// costs a geo lookup.
    pub fn build(
        &self,
        result: &ActionResult,
        action: &TrackedAction,
        ctx: &RequestContext,
    ) -> Result<AnalyticsEvent> {
        let event_type = action.event_type();
        let id = stable_id(&result.data)?;

        let (user_id, user_properties) = resolve_user(&ctx.principal);
        let geo = self.geo.resolve(ctx.client_ip);

        Ok(AnalyticsEvent {
            user_id,
            insert_id: insert_id(&event_type, &id),
            event_type,
            event_properties: result.data.clone(),
            user_properties,
            geo,
        })
    }
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new(GeoResolver::disabled())
    }
}
