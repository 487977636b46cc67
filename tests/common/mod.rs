#![allow(dead_code)]

use merkle_log::config::AppConfig;
use merkle_log::merkle::hasher::DIGEST_LEN;
use merkle_log::{Digest, LogService, MerkleTree};
use rand::Rng;

/// The four-event log used throughout the scenario tests
pub fn scenario_events() -> Vec<String> {
    vec![
        "Event1".to_string(),
        "Event2".to_string(),
        "Event3".to_string(),
        "Event4".to_string(),
    ]
}

/// Numbered events `event-0 .. event-{count-1}`
pub fn numbered_events(count: u64) -> Vec<String> {
    (0..count).map(|i| format!("event-{}", i)).collect()
}

/// Random binary payloads of varying length, possibly empty
pub fn random_events(rng: &mut impl Rng, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|_| {
            let len = rng.gen_range(0..48);
            (0..len).map(|_| rng.gen::<u8>()).collect()
        })
        .collect()
}

pub fn build_tree(events: &[String]) -> MerkleTree {
    MerkleTree::build(events.iter().map(|e| e.as_bytes().to_vec()))
}

pub fn create_test_service(events: &[String]) -> LogService {
    LogService::new(events.iter().map(|e| e.as_bytes().to_vec()))
        .expect("Failed to create test log service")
}

pub fn create_test_config() -> AppConfig {
    AppConfig {
        server_id: "test-log".to_string(),
        ..AppConfig::default()
    }
}

/// Copy of `digest` with bit `bit` of byte `byte` flipped
pub fn flip_bit(digest: &Digest, byte: usize, bit: u8) -> Digest {
    let mut bytes = *digest.as_bytes();
    bytes[byte % DIGEST_LEN] ^= 1 << (bit % 8);
    Digest::new(bytes)
}
