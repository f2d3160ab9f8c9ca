use sha2::{Digest, Sha256};
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a temporary file/dir name: `<prefix><32 hex chars>`.
///
/// Mixes wall-clock time, pid, a per-process counter and a randomly seeded
/// hash, so two calls in the same run never collide.
pub fn make_temp_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let counter = TEMP_NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    let noise = RandomState::new().hash_one((nanos, counter));

    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(counter.to_le_bytes());
    hasher.update(noise.to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{prefix}{}", &digest[..32])
}

/// Upper-case the first letter of each word: `"wordpress"` -> `"Wordpress"`
pub fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote a token for the platform shell if it contains anything the shell
/// would interpret (spaces, `&`, glob brackets, ...)
pub fn shell_quote(token: &str) -> String {
    const SPECIAL: &[char] = &[
        ' ', '\t', '\n', '&', '|', ';', '<', '>', '(', ')', '$', '`', '\\', '"', '\'', '*', '?',
        '[', ']', '#', '~', '!', '{', '}',
    ];

    if !token.is_empty() && !token.contains(SPECIAL) {
        return token.to_string();
    }

    if cfg!(windows) {
        format!("\"{}\"", token.replace('"', "\\\""))
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}
