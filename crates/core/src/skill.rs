//! Skill trait: the abstraction over hand-coded capabilities.
//!
//! A skill answers one kind of request (weather, time, arithmetic, ...)
//! without involving the language model. Skills are registered in a
//! [`CapabilityTable`] and dispatched by keyword.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// The fixed set of capabilities the assistant can answer on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Weather,
    Time,
    Calculation,
    Reminder,
    Joke,
}

impl Capability {
    /// Dispatch priority, highest first. An utterance matching several
    /// capabilities always goes to the earliest one in this list.
    pub const PRIORITY: [Capability; 5] = [
        Capability::Weather,
        Capability::Time,
        Capability::Calculation,
        Capability::Reminder,
        Capability::Joke,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Weather => "weather",
            Capability::Time => "time",
            Capability::Calculation => "calculation",
            Capability::Reminder => "reminder",
            Capability::Joke => "joke",
        }
    }

    /// Lowercase substrings that select this capability.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Capability::Weather => &["weather", "temperature", "forecast"],
            Capability::Time => &["time", "clock", "hour"],
            Capability::Calculation => &["calculate", "math", "+", "-", "*", "/"],
            Capability::Reminder => &["remind", "reminder", "schedule"],
            Capability::Joke => &["joke", "funny", "laugh"],
        }
    }

    /// Whether any keyword occurs in the already-lowercased utterance.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords().iter().any(|kw| lowered.contains(kw))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The core Skill trait.
///
/// Skills never fail from the caller's point of view: every error is turned
/// into a human-readable reply inside `handle`.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Which capability this skill serves.
    fn capability(&self) -> Capability;

    /// Answer the utterance. Receives the original, non-lowercased text.
    async fn handle(&self, utterance: &str) -> String;
}

/// Mapping from capability to the skill that serves it.
///
/// Built once at startup. Lookup order is irrelevant here; dispatch order
/// comes from [`Capability::PRIORITY`].
#[derive(Clone, Default)]
pub struct CapabilityTable {
    skills: HashMap<Capability, Arc<dyn Skill>>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill. Replaces any existing skill for the same capability.
    pub fn register(&mut self, skill: Arc<dyn Skill>) {
        self.skills.insert(skill.capability(), skill);
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, skill: Arc<dyn Skill>) -> Self {
        self.register(skill);
        self
    }

    /// Get the skill for a capability.
    pub fn get(&self, capability: Capability) -> Option<Arc<dyn Skill>> {
        self.skills.get(&capability).cloned()
    }

    /// Registered capabilities, in dispatch priority order.
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::PRIORITY
            .into_iter()
            .filter(|c| self.skills.contains_key(c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl std::fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoSkill(Capability);

    #[async_trait]
    impl Skill for EchoSkill {
        fn capability(&self) -> Capability {
            self.0
        }
        async fn handle(&self, utterance: &str) -> String {
            format!("{}: {}", self.0, utterance)
        }
    }

    #[test]
    fn keyword_matching_is_substring_based() {
        assert!(Capability::Time.matches("what's the timezone"));
        assert!(Capability::Calculation.matches("2+2"));
        assert!(Capability::Reminder.matches("please schedule lunch"));
        assert!(!Capability::Joke.matches("hello there"));
    }

    #[test]
    fn priority_order_is_fixed() {
        let names: Vec<_> = Capability::PRIORITY.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["weather", "time", "calculation", "reminder", "joke"]);
    }

    #[test]
    fn table_register_and_lookup() {
        let table = CapabilityTable::new()
            .with(Arc::new(EchoSkill(Capability::Joke)))
            .with(Arc::new(EchoSkill(Capability::Weather)));
        assert!(table.get(Capability::Joke).is_some());
        assert!(table.get(Capability::Time).is_none());
        assert_eq!(table.capabilities(), vec![Capability::Weather, Capability::Joke]);
    }

    #[tokio::test]
    async fn registered_skill_handles_utterance() {
        let mut table = CapabilityTable::new();
        table.register(Arc::new(EchoSkill(Capability::Time)));
        let skill = table.get(Capability::Time).unwrap();
        assert_eq!(skill.handle("what time").await, "time: what time");
    }
}
