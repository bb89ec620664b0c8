//! Reminder skill: acknowledges the request without storing anything.

use async_trait::async_trait;
use parley_core::skill::{Capability, Skill};
use tracing::info;

pub const ACKNOWLEDGEMENT: &str = "I've noted your reminder request. In a full implementation, this would integrate with your calendar system.";

pub struct ReminderSkill;

#[async_trait]
impl Skill for ReminderSkill {
    fn capability(&self) -> Capability {
        Capability::Reminder
    }

    async fn handle(&self, utterance: &str) -> String {
        info!(request = %utterance, "Reminder requested");
        ACKNOWLEDGEMENT.into()
    }
}
