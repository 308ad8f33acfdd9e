//! Deterministic randomness and id derivation.
//!
//! Proposal ordering draws from per-generation ChaCha streams whose seeds
//! are derived with domain-separated HMAC-SHA256, so two users (or two
//! generation events for the same user) never share a stream. Proposal ids
//! are XxHash64 fingerprints over (user, template, generation), which makes
//! them deterministically unique without any global counter.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use twox_hash::XxHash64;

const PROPOSAL_ID_HASH_SEED: u64 = 0x5155_4553_544C_4E45;

/// Derive a 64-bit stream seed from the engine seed and a domain tag.
pub(crate) fn derive_stream_seed(engine_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&engine_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

/// RNG stream for one proposal-generation event.
pub(crate) fn proposal_rng(engine_seed: u64, user_id: &str, generation: u64) -> ChaCha20Rng {
    let mut tag = Vec::with_capacity(user_id.len() + 18);
    tag.extend_from_slice(b"proposals:");
    tag.extend_from_slice(user_id.as_bytes());
    tag.extend_from_slice(&generation.to_le_bytes());
    ChaCha20Rng::seed_from_u64(derive_stream_seed(engine_seed, &tag))
}

/// Deterministically unique proposal id for (user, template, generation).
pub(crate) fn proposal_id(user_id: &str, template_id: &str, generation: u64) -> String {
    let mut buf = Vec::with_capacity(user_id.len() + template_id.len() + 9);
    buf.extend_from_slice(user_id.as_bytes());
    buf.push(0x1F);
    buf.extend_from_slice(template_id.as_bytes());
    buf.extend_from_slice(&generation.to_le_bytes());
    let fingerprint = XxHash64::oneshot(PROPOSAL_ID_HASH_SEED, &buf);
    format!("{template_id}-{fingerprint:016x}")
}
