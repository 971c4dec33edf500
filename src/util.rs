//! Small utility helpers used across modules.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;

const ORDER_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const ORDER_CODE_LEN: usize = 6;

/// Generate a short user-facing order code (A-Z, 0-9).
/// Printed on packaging; customers type it in to unlock a submission.
pub fn generate_order_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ORDER_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ORDER_CODE_CHARSET.len());
            ORDER_CODE_CHARSET[idx] as char
        })
        .collect()
}

/// Random OAuth state parameter: 32 random bytes, URL-safe base64.
pub fn generate_oauth_state() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_codes_are_six_uppercase_alphanumerics() {
        for _ in 0..100 {
            let code = generate_order_code();
            assert_eq!(code.len(), ORDER_CODE_LEN);
            assert!(code.bytes().all(|b| ORDER_CODE_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn oauth_state_is_long_enough() {
        let state = generate_oauth_state();
        // 32 bytes of entropy -> 43 base64 chars; callback requires >= 16.
        assert!(state.len() >= 16);
        assert_ne!(state, generate_oauth_state());
    }
}
