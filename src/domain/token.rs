/// Both prefixes the Expo SDK has historically emitted. Tokens in either
/// form are still live in the field, so both must be accepted.
const TOKEN_PREFIXES: [&str; 2] = ["ExponentPushToken[", "ExpoPushToken["];

/// Returns true if `token` looks like an Expo push token.
///
/// Tokens that fail this predicate are silently dropped before batching;
/// they never reach the gateway and never produce a delivery ticket.
#[must_use]
pub fn is_valid_token(token: &str) -> bool {
    TOKEN_PREFIXES
        .iter()
        .any(|prefix| token.len() > prefix.len() && token.starts_with(prefix) && token.ends_with(']'))
}
