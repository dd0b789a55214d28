//! Field id generation
//!
//! Ids are short random tokens over the URL-safe alphabet
//! `A-Za-z0-9_-`, retried until they collide with nothing already in use.
//! The randomness source is a trait so tests can make generation
//! deterministic.

use crate::config::IdConfig;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// URL-safe token alphabet
pub const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Default token length
pub const DEFAULT_ID_LENGTH: usize = 6;

const MAX_RANDOM_ATTEMPTS: usize = 64;

/// Source of random tokens
pub trait TokenSource: Send + Sync {
    /// Produce a token of `length` characters
    fn token(&self, length: usize) -> String;
}

/// Thread-local RNG backed tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn token(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect()
    }
}

/// Collision-free field id allocator
#[derive(Clone)]
pub struct IdGenerator {
    source: Arc<dyn TokenSource>,
    length: usize,
    prefix: String,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(Arc::new(RandomTokens))
    }
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator")
            .field("length", &self.length)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl IdGenerator {
    /// Generator drawing tokens from `source`
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            length: DEFAULT_ID_LENGTH,
            prefix: String::new(),
        }
    }

    /// Random generator configured from `config`
    pub fn from_config(config: &IdConfig) -> Self {
        Self::default()
            .with_length(config.length)
            .with_prefix(config.prefix.clone())
    }

    /// Token length, at least one character
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length.max(1);
        self
    }

    /// Prefix prepended to every id
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Allocate an id for which `taken` returns false
    ///
    /// After repeated collisions a numeric suffix is appended, so the call
    /// terminates even with a degenerate token source.
    pub fn create_uid(&self, taken: impl Fn(&str) -> bool) -> String {
        for _ in 0..MAX_RANDOM_ATTEMPTS {
            let id = format!("{}{}", self.prefix, self.source.token(self.length));
            if !taken(&id) {
                return id;
            }
        }

        let base = format!("{}{}", self.prefix, self.source.token(self.length));
        let mut suffix = 1usize;
        loop {
            let id = format!("{base}{suffix}");
            if !taken(&id) {
                debug!(id = %id, "random ids exhausted; using suffixed id");
                return id;
            }
            suffix += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Replays a fixed list of tokens, repeating the last one
    struct Scripted(Mutex<Vec<&'static str>>);

    impl TokenSource for Scripted {
        fn token(&self, _length: usize) -> String {
            let mut tokens = self.0.lock().unwrap();
            if tokens.len() > 1 {
                tokens.remove(0).to_string()
            } else {
                tokens[0].to_string()
            }
        }
    }

    #[test]
    fn test_random_tokens_use_alphabet() {
        let token = RandomTokens.token(32);
        assert_eq!(token.len(), 32);
        assert!(token.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_create_uid_skips_taken_ids() {
        let ids = IdGenerator::new(Arc::new(Scripted(Mutex::new(vec!["aaa", "aaa", "bbb"]))));
        let existing: HashSet<&str> = ["aaa"].into_iter().collect();

        assert_eq!(ids.create_uid(|id| existing.contains(id)), "bbb");
    }

    #[test]
    fn test_create_uid_terminates_with_constant_source() {
        let ids = IdGenerator::new(Arc::new(Scripted(Mutex::new(vec!["same"]))));
        let existing: HashSet<&str> = ["same", "same1"].into_iter().collect();

        assert_eq!(ids.create_uid(|id| existing.contains(id)), "same2");
    }

    #[test]
    fn test_prefix_and_length() {
        let ids = IdGenerator::default().with_prefix("f_").with_length(4);
        let id = ids.create_uid(|_| false);
        assert!(id.starts_with("f_"));
        assert_eq!(id.len(), 6);
    }
}
