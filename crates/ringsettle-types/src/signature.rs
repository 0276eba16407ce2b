//! Ed25519 signatures under two message schemes.
//!
//! A [`Signature`] carries the scheme tag, the signer's public key and the
//! 64 raw signature bytes. An account's [`Address`] is the last 20 bytes of
//! the SHA-256 digest of its public key, so a verifier can check both that
//! the signature is valid and that the key belongs to the expected account.
//!
//! ## Schemes
//!
//! ```text
//!   Ethereum : sha256( "\x19Ethereum Signed Message:\n32" || hash )
//!   Eip712   : sha256( "\x19\x01" || domain_separator || hash )
//! ```

use ed25519_dalek::{Signature as DalekSignature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Address;
use crate::constants::{EIP712_DOMAIN, EIP712_PREFIX, ETHEREUM_MESSAGE_PREFIX};

/// Message scheme a signature was produced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignAlgorithm {
    /// Personal-message style prefix.
    Ethereum,
    /// Typed-data style domain separation.
    Eip712,
}

impl SignAlgorithm {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Ethereum => 1,
            Self::Eip712 => 2,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Ethereum),
            2 => Some(Self::Eip712),
            _ => None,
        }
    }

    /// The 32-byte message actually signed for `hash` under this scheme.
    #[must_use]
    pub fn message(self, hash: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        match self {
            Self::Ethereum => {
                hasher.update(ETHEREUM_MESSAGE_PREFIX);
            }
            Self::Eip712 => {
                hasher.update(EIP712_PREFIX);
                hasher.update(domain_separator());
            }
        }
        hasher.update(hash);
        hasher.finalize().into()
    }
}

impl std::fmt::Display for SignAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ethereum => write!(f, "ETHEREUM"),
            Self::Eip712 => write!(f, "EIP712"),
        }
    }
}

fn domain_separator() -> [u8; 32] {
    Sha256::digest(EIP712_DOMAIN).into()
}

/// Derive the account address controlled by an ed25519 public key.
#[must_use]
pub fn address_of_key(public_key: &[u8; 32]) -> Address {
    let digest: [u8; 32] = Sha256::digest(public_key).into();
    Address::from_slice(&digest[12..])
}

/// A signature over a 32-byte hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub algorithm: SignAlgorithm,
    /// Ed25519 public key of the signer.
    pub public_key: [u8; 32],
    /// Raw ed25519 signature bytes (64 when well-formed).
    pub bytes: Vec<u8>,
}

impl Signature {
    /// Address of the key that produced this signature.
    #[must_use]
    pub fn signer(&self) -> Address {
        address_of_key(&self.public_key)
    }

    /// `true` if this is a valid signature over `hash` by `expected_signer`.
    #[must_use]
    pub fn verify(&self, expected_signer: &Address, hash: &[u8; 32]) -> bool {
        if self.signer() != *expected_signer {
            return false;
        }
        let Ok(key) = VerifyingKey::from_bytes(&self.public_key) else {
            return false;
        };
        let Ok(signature) = DalekSignature::from_slice(&self.bytes) else {
            return false;
        };
        key.verify_strict(&self.algorithm.message(hash), &signature)
            .is_ok()
    }
}

/// Deterministic signing account for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone)]
pub struct TestAccount {
    pub signing_key: ed25519_dalek::SigningKey,
    pub address: Address,
}

#[cfg(any(test, feature = "test-helpers"))]
impl TestAccount {
    /// Account derived from a one-byte seed; the same seed is the same account.
    pub fn from_seed(seed: u8) -> Self {
        Self::from_secret([seed; 32])
    }

    pub fn from_secret(secret: [u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret);
        let address = address_of_key(&signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }

    pub fn random() -> Self {
        use rand::Rng;
        let mut secret = [0u8; 32];
        rand::thread_rng().fill(&mut secret);
        Self::from_secret(secret)
    }

    pub fn sign(&self, algorithm: SignAlgorithm, hash: &[u8; 32]) -> Signature {
        use ed25519_dalek::Signer;
        let signature = self.signing_key.sign(&algorithm.message(hash));
        Signature {
            algorithm,
            public_key: self.signing_key.verifying_key().to_bytes(),
            bytes: signature.to_bytes().to_vec(),
        }
    }
}
