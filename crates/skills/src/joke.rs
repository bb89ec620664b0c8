//! Joke skill: picks one of a fixed set of jokes at random.

use async_trait::async_trait;
use parley_core::skill::{Capability, Skill};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use std::sync::Mutex;

pub const JOKES: [&str; 5] = [
    "Why don't scientists trust atoms? Because they make up everything!",
    "Why did the computer go to the doctor? Because it had a virus!",
    "Why don't programmers like nature? It has too many bugs!",
    "What do you call a computer that sings? A-Dell!",
    "Why do robots never panic? They have nerves of steel!",
];

pub struct JokeSkill {
    rng: Mutex<StdRng>,
}

impl JokeSkill {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic selection, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick(&self) -> &'static str {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        JOKES.choose(&mut *rng).copied().unwrap_or(JOKES[0])
    }
}

impl Default for JokeSkill {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Skill for JokeSkill {
    fn capability(&self) -> Capability {
        Capability::Joke
    }

    async fn handle(&self, _utterance: &str) -> String {
        self.pick().to_string()
    }
}
