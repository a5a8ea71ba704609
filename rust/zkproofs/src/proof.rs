//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

/// A Schnorr proof for one statement of a compound proof.
///
/// The challenge is shared by all statements and is recomputed by the verifier, so unlike a
/// compact Schnorr signature we send the commitments (public nonces) instead of the challenge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    public_nonces: Vec<RistrettoPoint>,
    responses: Vec<Scalar>,
}

impl Proof {
    pub(crate) fn new(public_nonces: Vec<RistrettoPoint>, responses: Vec<Scalar>) -> Self {
        Self {
            public_nonces,
            responses,
        }
    }

    pub fn public_nonces(&self) -> &[RistrettoPoint] {
        &self.public_nonces
    }

    pub fn responses(&self) -> &[Scalar] {
        &self.responses
    }

    /// Parses the format produced by [`Proof::to_bytes`].
    ///
    /// Returns `None` for truncated input, trailing bytes, invalid points, or non-canonical
    /// scalars.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let (&num_nonces, rest) = bytes.split_first()?;
        let (&num_responses, rest) = rest.split_first()?;
        let (nonce_bytes, response_bytes) = rest.split_at_checked(32 * num_nonces as usize)?;
        if response_bytes.len() != 32 * num_responses as usize {
            return None;
        }

        let public_nonces = nonce_bytes
            .chunks_exact(32)
            .map(|chunk| CompressedRistretto::from_slice(chunk).ok()?.decompress())
            .collect::<Option<Vec<_>>>()?;
        let responses = response_bytes
            .chunks_exact(32)
            .map(|chunk| {
                let bytes: [u8; 32] = chunk.try_into().ok()?;
                Option::<Scalar>::from(Scalar::from_canonical_bytes(bytes))
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            public_nonces,
            responses,
        })
    }

    /// Serializes as `num_nonces || num_responses || nonces || responses`.
    ///
    /// Panics if either list has more than 255 entries, which no statement can produce.
    pub fn to_bytes(&self) -> Vec<u8> {
        let num_nonces = u8::try_from(self.public_nonces.len()).expect("at most 255 equations");
        let num_responses = u8::try_from(self.responses.len()).expect("at most 255 scalars");
        let mut bytes =
            Vec::with_capacity(2 + 32 * (self.public_nonces.len() + self.responses.len()));
        bytes.push(num_nonces);
        bytes.push(num_responses);
        for nonce in &self.public_nonces {
            bytes.extend_from_slice(nonce.compress().as_bytes());
        }
        for response in &self.responses {
            bytes.extend_from_slice(response.as_bytes());
        }
        bytes
    }
}
