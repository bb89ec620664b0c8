//! Time skill: reports the local wall-clock time and date.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use parley_core::skill::{Capability, Skill};

pub struct TimeSkill;

#[async_trait]
impl Skill for TimeSkill {
    fn capability(&self) -> Capability {
        Capability::Time
    }

    async fn handle(&self, _utterance: &str) -> String {
        format_time(&Local::now())
    }
}

/// `The current time is HH:MM:SS on YYYY-MM-DD.`
pub fn format_time<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "The current time is {} on {}.",
        now.format("%H:%M:%S"),
        now.format("%Y-%m-%d")
    )
}
