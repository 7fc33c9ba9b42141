// src/transform/decorate.rs
use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};
use std::sync::Mutex;

/// Optional flavouring appended to every message: one hashtag drawn from a
/// pool plus a fixed suffix. With neither configured it is the identity.
#[derive(Debug)]
pub struct Decoration {
    suffix: Option<String>,
    hashtags: Vec<String>,
    rng: Mutex<StdRng>,
}

impl Decoration {
    pub fn none() -> Self {
        Self::new(None, Vec::new(), Some(0))
    }

    /// `seed = None` draws from the OS; tests pass a fixed seed.
    pub fn new(suffix: Option<String>, hashtags: Vec<String>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let suffix = suffix.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let hashtags = hashtags
            .into_iter()
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .map(|t| format!("#{t}"))
            .collect();
        Self {
            suffix,
            hashtags,
            rng: Mutex::new(rng),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.suffix.is_none() && self.hashtags.is_empty()
    }

    pub fn decorate(&self, text: &str) -> String {
        if self.is_identity() {
            return text.to_string();
        }
        let tag = {
            let mut rng = self.rng.lock().expect("decoration rng mutex poisoned");
            self.hashtags.choose(&mut *rng).cloned()
        };
        let extras: Vec<String> = tag.into_iter().chain(self.suffix.clone()).collect();
        format!("{text} {}", extras.join(" "))
    }
}
