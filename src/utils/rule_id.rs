//! Rule identifier generation.

use rand::Rng;

/// Prefix for generated rule identifiers.
const RULE_ID_PREFIX: &str = "r_";

/// Number of random bytes before hex encoding.
const RULE_ID_BYTES: usize = 8;

/// Generates a random opaque rule identifier such as `r_9f1c04ab7e3d2a6b`.
pub fn generate_rule_id() -> String {
    let mut buffer = [0u8; RULE_ID_BYTES];
    rand::rng().fill(&mut buffer);

    format!("{}{}", RULE_ID_PREFIX, hex::encode(buffer))
}
