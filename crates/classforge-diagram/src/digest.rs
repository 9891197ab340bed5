//! Deterministic synthetic ids.
//!
//! Connections may arrive without an `id`. The id they get instead must be a
//! pure function of the diagram so two runs over the same input produce
//! byte-identical output.
//!
//! - algorithm: SHA-256 over the participant parts
//! - input: parts joined with `\x1f` (unit separator)
//! - output: `"<prefix>_<16 lowercase hex digits>"`

use sha2::{Digest as _, Sha256};
use std::fmt::Write as _;

const PART_SEPARATOR: &str = "\u{1f}";

fn short_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(16);
    for b in bytes.iter().take(8) {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

/// Stable id over ordered parts. Order matters.
pub fn ordered_id(prefix: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    for part in parts {
        hasher.update(PART_SEPARATOR.as_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{prefix}_{}", short_hex(&hasher.finalize()))
}
