//! Keypair generation for simulated accounts.
//!
//! # Security
//! - Keys live only in memory for the lifetime of the simulation
//! - Private keys are never logged

use alloy::hex;
use alloy::primitives::{keccak256, Address, B256};
use alloy::signers::k256::ecdsa::VerifyingKey;
use alloy::signers::local::PrivateKeySigner;

/// A secp256k1 private key and the account address derived from it.
#[derive(Clone)]
pub struct Keypair {
    signer: PrivateKeySigner,
    address: Address,
}

impl Keypair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        let signer = PrivateKeySigner::random();
        let address = derive_address(signer.credential().verifying_key());
        Self { signer, address }
    }

    /// Generate `count` independent keypairs.
    pub fn generate_many(count: usize) -> Vec<Self> {
        (0..count).map(|_| Self::generate()).collect()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The raw 32-byte private key.
    pub fn private_key(&self) -> B256 {
        self.signer.to_bytes()
    }

    /// Lowercase hex of the private key, no `0x` prefix.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.private_key())
    }

    /// Lowercase hex of the address, no `0x` prefix.
    pub fn address_hex(&self) -> String {
        hex::encode(self.address.as_slice())
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signer.credential().verifying_key()
    }

    /// Signer usable for local transaction signing.
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive an account address: the low 20 bytes of the Keccak-256 hash of the
/// uncompressed public key without its `0x04` tag byte.
pub fn derive_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
