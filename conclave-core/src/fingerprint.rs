//! Content fingerprints and similarity signatures for memory entries.
//!
//! The fingerprint is an exact dedup key (blake3 over normalized text). The
//! signature is a 64-bit SimHash over tokens, split into LSH bands so the
//! store can find near neighbours through an index instead of a scan.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{SIGNATURE_BANDS, SIGNATURE_BAND_WIDTH, SIGNATURE_BITS};

// Identifiers and numbers; punctuation is not significant.
static TOKEN_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*|[0-9]+").ok());

/// Lowercased identifier and number tokens of `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    match TOKEN_RE.as_ref() {
        Some(re) => re
            .find_iter(text)
            .map(|m| m.as_str().to_ascii_lowercase())
            .collect(),
        None => text
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .filter(|t| !t.is_empty())
            .map(str::to_ascii_lowercase)
            .collect(),
    }
}

/// Whitespace-collapsed, lowercased form used for fingerprinting.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Content-derived dedup key: blake3 hex digest of the normalized text.
pub fn fingerprint(text: &str) -> String {
    blake3::hash(normalize(text).as_bytes()).to_hex().to_string()
}

/// 64-bit SimHash of the token multiset of `text`. Empty input yields 0.
pub fn signature(text: &str) -> u64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0;
    }

    let mut weights = [0i64; SIGNATURE_BITS as usize];
    for token in &tokens {
        let h = token_hash(token);
        for (bit, weight) in weights.iter_mut().enumerate() {
            if h & (1u64 << bit) != 0 {
                *weight += 1;
            } else {
                *weight -= 1;
            }
        }
    }

    weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w > 0)
        .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit))
}

fn token_hash(token: &str) -> u64 {
    let digest = blake3::hash(token.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Split a signature into its LSH bands, lowest bits first.
pub fn bands(signature: u64) -> [u16; SIGNATURE_BANDS] {
    let mut out = [0u16; SIGNATURE_BANDS];
    for (i, band) in out.iter_mut().enumerate() {
        *band = ((signature >> (i as u32 * SIGNATURE_BAND_WIDTH)) & 0xFFFF) as u16;
    }
    out
}

/// 1.0 for identical signatures, 0.0 when every bit differs.
pub fn hamming_similarity(a: u64, b: u64) -> f64 {
    1.0 - f64::from((a ^ b).count_ones()) / f64::from(SIGNATURE_BITS)
}

/// Jaccard overlap of two token sets.
pub fn token_overlap(a: &[String], b: &[String]) -> f64 {
    let left: HashSet<&str> = a.iter().map(String::as_str).collect();
    let right: HashSet<&str> = b.iter().map(String::as_str).collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.union(&right).count();
    shared as f64 / union as f64
}
