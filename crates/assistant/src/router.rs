//! Capability router: keyword dispatch over the registered skills.

use parley_core::skill::{Capability, CapabilityTable, Skill};
use std::sync::Arc;
use tracing::debug;

/// One entry of the dispatch table.
struct Route {
    capability: Capability,
    skill: Arc<dyn Skill>,
}

/// Ordered dispatch table, fixed at construction.
///
/// Routes are evaluated in [`Capability::PRIORITY`] order and the first
/// whose keywords occur in the lowercased utterance handles it.
pub struct CapabilityRouter {
    routes: Vec<Route>,
}

impl CapabilityRouter {
    pub fn new(table: &CapabilityTable) -> Self {
        let routes = Capability::PRIORITY
            .into_iter()
            .filter_map(|capability| {
                table
                    .get(capability)
                    .map(|skill| Route { capability, skill })
            })
            .collect();
        Self { routes }
    }

    /// The first capability whose keywords occur in `utterance`.
    pub fn select(&self, utterance: &str) -> Option<Capability> {
        self.find(utterance).map(|route| route.capability)
    }

    fn find(&self, utterance: &str) -> Option<&Route> {
        let lowered = utterance.to_lowercase();
        self.routes
            .iter()
            .find(|route| route.capability.matches(&lowered))
    }

    /// Dispatch `utterance` to the matching skill.
    ///
    /// `None` means no capability matched and the caller should fall back
    /// to completion.
    pub async fn route(&self, utterance: &str) -> Option<String> {
        let route = self.find(utterance)?;

        debug!(capability = %route.capability, "Routing to skill");
        Some(route.skill.handle(utterance).await)
    }

    /// Routed capabilities, in dispatch order.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.routes.iter().map(|r| r.capability).collect()
    }
}
