//! Built-in skills for Parley.
//!
//! Each skill answers one [`Capability`](parley_core::Capability) without
//! consulting the language model:
//! - `weather`: current conditions from an OpenWeatherMap-compatible API
//! - `time`: local time and date
//! - `calculation`: arithmetic extracted from the utterance
//! - `reminder`: acknowledgement only
//! - `joke`: one of a fixed set

pub mod calculator;
pub mod clock;
pub mod joke;
pub mod reminder;
pub mod weather;

pub use calculator::CalculatorSkill;
pub use clock::TimeSkill;
pub use joke::JokeSkill;
pub use reminder::ReminderSkill;
pub use weather::WeatherSkill;

use parley_config::AppConfig;
use parley_core::skill::CapabilityTable;
use std::sync::Arc;

/// Build the table with every built-in skill registered.
pub fn default_table(config: &AppConfig) -> CapabilityTable {
    CapabilityTable::new()
        .with(Arc::new(WeatherSkill::new(&config.weather)))
        .with(Arc::new(TimeSkill))
        .with(Arc::new(CalculatorSkill))
        .with(Arc::new(ReminderSkill))
        .with(Arc::new(JokeSkill::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::skill::Capability;

    #[test]
    fn default_table_covers_every_capability() {
        let table = default_table(&AppConfig::default());
        assert_eq!(table.len(), 5);
        assert_eq!(table.capabilities(), Capability::PRIORITY.to_vec());
        for capability in Capability::PRIORITY {
            assert_eq!(table.get(capability).unwrap().capability(), capability);
        }
    }
}
