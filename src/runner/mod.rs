//! Runner trait and failure classification for pass-cli invocations
//!
//! The primary runner spawns the real binary (`process.rs`); the trait
//! allows an in-memory implementation for testing. Classification maps
//! the combined stderr+error text of a failed invocation onto the
//! stable error taxonomy via an ordered rule table.

mod process;

pub use process::ProcessRunner;

use async_trait::async_trait;

use crate::{ErrorKind, PassCliError, Result};

/// Maximum length of an `unknown` error message reaching the UI layer.
const UNKNOWN_MESSAGE_MAX_CHARS: usize = 600;

/// Runner seam over the external pass-cli binary.
#[async_trait]
pub trait CliRunner: Send + Sync {
    /// Invoke pass-cli with the given arguments, returning stdout text.
    async fn invoke(&self, args: &[&str]) -> Result<String>;
}

/// One classification rule: any needle present in the lowercased
/// failure text selects the kind. Rules are evaluated in table order;
/// the first hit wins.
struct ClassifyRule {
    needles: &'static [&'static str],
    kind: ErrorKind,
}

/// Ordered stderr-text classification rules. Keyring phrases outrank
/// authentication phrases, which outrank network phrases, matching how
/// pass-cli layers its own failures (a locked keyring also reports the
/// session as unusable).
const CLASSIFY_RULES: &[ClassifyRule] = &[
    ClassifyRule {
        needles: &[
            "keyring",
            "keychain",
            "secret service",
            "encryption key",
            "libsecret",
            "credential store",
        ],
        kind: ErrorKind::KeyringError,
    },
    ClassifyRule {
        needles: &[
            "not authenticated",
            "not logged in",
            "no session",
            "session expired",
            "authentication required",
            "please log in",
            "unauthorized",
        ],
        kind: ErrorKind::NotAuthenticated,
    },
    ClassifyRule {
        needles: &[
            "network",
            "connection",
            "timed out",
            "timeout",
            "dns",
            "could not resolve",
            "offline",
            "unreachable",
        ],
        kind: ErrorKind::NetworkError,
    },
];

/// Classify the combined stderr+error text of a failed invocation.
///
/// Spawn-level failures (timeout, executable not found) never reach
/// this function; the runner maps those before looking at text.
pub(crate) fn classify_failure(text: &str) -> PassCliError {
    let lowered = text.to_lowercase();
    for rule in CLASSIFY_RULES {
        if rule.needles.iter().any(|needle| lowered.contains(needle)) {
            let message = text.trim().to_string();
            return match rule.kind {
                ErrorKind::KeyringError => PassCliError::KeyringError(message),
                ErrorKind::NotAuthenticated => PassCliError::NotAuthenticated,
                ErrorKind::NetworkError => PassCliError::NetworkError(message),
                // Table only carries the three text-matched kinds.
                _ => PassCliError::Unknown(message),
            };
        }
    }

    // Unclassified failures are logged distinctly to catch taxonomy drift.
    tracing::warn!(stderr = %text.trim(), "unclassified pass-cli failure");
    PassCliError::Unknown(truncate_middle(text.trim(), UNKNOWN_MESSAGE_MAX_CHARS))
}

/// Keep the head and tail of an overlong message, eliding the middle.
pub(crate) fn truncate_middle(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let keep = max_chars / 2;
    let head: String = text.chars().take(keep).collect();
    let tail: String = text.chars().skip(total - keep).collect();
    format!("{head} [... {} chars elided ...] {tail}", total - 2 * keep)
}
