use std::sync::atomic::{AtomicU64, Ordering};

use rand::{Rng as _, distr::Alphanumeric};

const ID_LENGTH: usize = 5;

/// Generates the short token that ties a mapping file to its body file.
/// Implementations must be safe to call from concurrently handled exchanges
/// without coordination by the caller.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Default generator: a short alphanumeric token from a thread-local RNG,
/// unique with very high probability over a recording session.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        rand::rng()
            .sample_iter(Alphanumeric)
            .take(ID_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// Counter-backed generator for reproducible tests.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};

    #[test]
    fn random_ids_are_short_and_alphanumeric() {
        let generator = RandomIdGenerator;
        for _ in 0..32 {
            let id = generator.generate();
            assert_eq!(id.len(), 5, "id: {id}");
            assert!(
                id.chars().all(|ch| ch.is_ascii_alphanumeric()),
                "id: {id}"
            );
        }
    }

    #[test]
    fn random_ids_rarely_collide() {
        let generator = RandomIdGenerator;
        let ids: HashSet<String> = (0..256).map(|_| generator.generate()).collect();
        assert!(ids.len() > 250, "unexpected collision rate: {}", ids.len());
    }

    #[test]
    fn sequential_ids_count_up_from_start() {
        let generator = SequentialIdGenerator::starting_at(7);
        assert_eq!(generator.generate(), "7");
        assert_eq!(generator.generate(), "8");
        assert_eq!(generator.generate(), "9");
    }

    #[tokio::test]
    async fn sequential_ids_stay_unique_under_concurrency() {
        let generator = Arc::new(SequentialIdGenerator::default());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let generator = Arc::clone(&generator);
            handles.push(tokio::spawn(async move {
                (0..64)
                    .map(|_| generator.generate())
                    .collect::<Vec<String>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(seen.insert(id.clone()), "duplicate id `{id}`");
            }
        }
        assert_eq!(seen.len(), 8 * 64);
    }
}
