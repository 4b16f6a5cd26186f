use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;

/// 256 bits of entropy per login attempt.
const STATE_BYTES: usize = 32;

/// Generate a fresh CSRF state token: URL-safe, unpredictable, single-use.
///
/// The value binds one authorization request to its callback; the manager
/// discards it after the first callback regardless of outcome.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn consecutive_states_differ() {
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn states_are_unique_across_many_draws() {
        let states: HashSet<String> = (0..1000).map(|_| generate_state()).collect();
        assert_eq!(states.len(), 1000);
    }

    #[test]
    fn states_are_url_safe() {
        let state = generate_state();
        // 32 bytes of unpadded base64url is 43 characters.
        assert_eq!(state.len(), 43);
        assert!(state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
