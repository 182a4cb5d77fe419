//! PKCE S256 verifier, challenge and state generation
//!
//! Implements the client side of RFC 7636 with the `S256` method. The
//! verifier is 64 random bytes encoded as unpadded base64url (86 characters,
//! inside the 43-128 range RFC 7636 allows). The CSRF `state` is 32 random
//! bytes encoded the same way (43 characters).
//!
//! Randomness comes from [`rand::rng`], which is seeded from the operating
//! system and reseeds periodically.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore as _;
use sha2::{Digest, Sha256};

/// Number of random bytes behind the code verifier.
const VERIFIER_BYTES: usize = 64;

/// Number of random bytes behind the `state` parameter.
const STATE_BYTES: usize = 32;

// ---------------------------------------------------------------------------
// PkceTriple
// ---------------------------------------------------------------------------

/// Per-login secrets: verifier, derived challenge and CSRF state
///
/// Values live only in memory for the duration of one login.
///
/// # Examples
///
/// ```
/// use chp::auth::pkce::{generate_challenge, PkceTriple};
///
/// let pkce = PkceTriple::generate();
/// assert_eq!(pkce.verifier.len(), 86);
/// assert_eq!(pkce.state.len(), 43);
/// assert_eq!(pkce.challenge, generate_challenge(&pkce.verifier));
/// ```
#[derive(Clone)]
pub struct PkceTriple {
    /// Sent to the token endpoint as `code_verifier`
    pub verifier: String,
    /// Sent to the authorization endpoint as `code_challenge`
    pub challenge: String,
    /// Echoed back on the redirect and compared before the code is used
    pub state: String,
}

impl PkceTriple {
    /// Generate a fresh verifier, its challenge and an independent state.
    pub fn generate() -> Self {
        let verifier = generate_verifier();
        let challenge = generate_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: generate_state(),
        }
    }
}

impl std::fmt::Debug for PkceTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceTriple")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .field("state", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Public functions
// ---------------------------------------------------------------------------

/// Returns a new 86-character code verifier.
pub fn generate_verifier() -> String {
    random_token::<VERIFIER_BYTES>()
}

/// Derives the `S256` code challenge for a verifier
///
/// `BASE64URL(SHA256(ASCII(verifier)))` without padding. Deterministic.
///
/// # Examples
///
/// ```
/// use chp::auth::pkce::generate_challenge;
///
/// // RFC 7636 appendix B
/// assert_eq!(
///     generate_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
///     "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
/// );
/// ```
pub fn generate_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Returns a new 43-character CSRF state value.
pub fn generate_state() -> String {
    random_token::<STATE_BYTES>()
}

fn random_token<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
