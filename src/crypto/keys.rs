use crate::error::{AppError, Result};
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// A freshly generated Ed25519 key pair for one session.
///
/// The private key is PKCS#8 DER (what the JWT encoder consumes), the
/// public key the raw 32-byte form (what the JWT verifier consumes). The
/// private half is zeroized when the pair is dropped.
pub struct SessionKeyPair {
    public_key: Vec<u8>,
    private_key: Zeroizing<Vec<u8>>,
}

impl SessionKeyPair {
    /// Generates a new key pair from the operating system's CSPRNG.
    pub fn generate() -> Result<Self> {
        let signing_key = SigningKey::generate(&mut OsRng);

        let private_der = signing_key
            .to_pkcs8_der()
            .map_err(|e| AppError::Internal(format!("Key encoding error: {}", e)))?;

        Ok(Self {
            public_key: signing_key.verifying_key().to_bytes().to_vec(),
            private_key: Zeroizing::new(private_der.as_bytes().to_vec()),
        })
    }

    /// The raw 32-byte public key.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The PKCS#8 DER private key.
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }
}

impl std::fmt::Debug for SessionKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeyPair")
            .field("public_key", &hex::encode(&self.public_key))
            .finish_non_exhaustive()
    }
}
