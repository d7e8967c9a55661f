//! Domain-separated content digests
//!
//! Sample digest (bit-exact, so other implementations agree):
//!
//! ```text
//! blake3( 0x00
//!       || u64_le(len(input_text as UTF-8))  || input_text as UTF-8
//!       || u64_le(len(target_text as UTF-8)) || target_text as UTF-8 )
//! ```
//!
//! Fingerprint of a validated dataset:
//!
//! ```text
//! blake3( 0x01 || u64_le(sample_count) || digest_0 || digest_1 || ... )
//! ```

/// 32-byte hash
pub type Hash32 = [u8; 32];

const DOMAIN_SAMPLE: u8 = 0x00;
const DOMAIN_FINGERPRINT: u8 = 0x01;

/// Exact-match digest of one `(input_text, target_text)` pair.
///
/// Fields are length-prefixed, so `("a\0", "b")` and `("a", "\0b")` never collide.
pub fn content_digest(input_text: &str, target_text: &str) -> Hash32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[DOMAIN_SAMPLE]);
    hasher.update(&(input_text.len() as u64).to_le_bytes());
    hasher.update(input_text.as_bytes());
    hasher.update(&(target_text.len() as u64).to_le_bytes());
    hasher.update(target_text.as_bytes());
    hasher.finalize().into()
}

/// Order-sensitive digest over the sample digests of a dataset.
pub fn fingerprint<'a, I>(digests: I) -> Hash32
where
    I: ExactSizeIterator<Item = &'a Hash32>,
{
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[DOMAIN_FINGERPRINT]);
    hasher.update(&(digests.len() as u64).to_le_bytes());
    for d in digests {
        hasher.update(d);
    }
    hasher.finalize().into()
}
