//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

//! The Fiat-Shamir transcript shared by provers and verifiers.
//!
//! Every public value that a proof depends on must be fed into the transcript, in the same order,
//! on both sides. Each message is framed as `meta_ad(label) ; meta_ad(len, more) ; ad(data)`, so
//! two transcripts only agree if they saw the same labels, lengths and bytes in the same order.
//!
//! Below are the transcript inputs for one compound proof over statements `1..n`:
//!
//!  for i=1..n:
//!     "statement"    : description of statement i (see [`Statement`](crate::Statement))
//!     "public-point" : each public point of statement i, in index order
//!  for i=1..n:
//!     "public-nonce" : each Schnorr commitment of statement i
//!  "challenge"       : squeezed, 64 bytes reduced to a scalar
//!
//! Secret nonces are derived from a *fork* of the transcript keyed with the witness and fresh
//! randomness, so the main transcript is not affected by them.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};

use crate::strobe::Strobe128;

const PROTOCOL_LABEL: &[u8] = b"WabiSabi_v1.0";

const DOMAIN_SEPARATOR_TAG: &[u8] = b"domain-separator";
const STATEMENT_TAG: &[u8] = b"statement";
const PUBLIC_POINT_TAG: &[u8] = b"public-point";
const PUBLIC_NONCE_TAG: &[u8] = b"public-nonce";
const CHALLENGE_TAG: &[u8] = b"challenge";
const SECRET_NONCE_TAG: &[u8] = b"secret-nonce";

/// Number of random bytes mixed into every secret nonce derivation.
pub const NONCE_RANDOMNESS_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct Transcript {
    strobe: Strobe128,
}

impl Transcript {
    /// Starts a transcript for the protocol step identified by `label`.
    pub fn new(label: &[u8]) -> Self {
        let mut transcript = Transcript {
            strobe: Strobe128::new(PROTOCOL_LABEL),
        };
        transcript.append_message(DOMAIN_SEPARATOR_TAG, label);
        transcript
    }

    pub fn append_message(&mut self, label: &[u8], message: &[u8]) {
        let len = u32::try_from(message.len()).expect("messages are smaller than 4GiB");
        self.strobe.meta_ad(label, false);
        self.strobe.meta_ad(&len.to_le_bytes(), true);
        self.strobe.ad(message, false);
    }

    pub fn append_u64(&mut self, label: &[u8], value: u64) {
        self.append_message(label, &value.to_le_bytes());
    }

    pub fn append_i64(&mut self, label: &[u8], value: i64) {
        self.append_message(label, &value.to_le_bytes());
    }

    pub fn append_point(&mut self, label: &[u8], point: &RistrettoPoint) {
        self.append_message(label, point.compress().as_bytes());
    }

    pub fn append_scalar(&mut self, label: &[u8], scalar: &Scalar) {
        self.append_message(label, scalar.as_bytes());
    }

    /// Fills `dest` with bytes bound to everything absorbed so far.
    pub fn challenge_bytes(&mut self, label: &[u8], dest: &mut [u8]) {
        let len = u32::try_from(dest.len()).expect("challenges are smaller than 4GiB");
        self.strobe.meta_ad(label, false);
        self.strobe.meta_ad(&len.to_le_bytes(), true);
        self.strobe.prf(dest, false);
    }

    pub(crate) fn commit_statement(&mut self, description: &[u8], points: &[RistrettoPoint]) {
        self.append_message(STATEMENT_TAG, description);
        for point in points {
            self.append_point(PUBLIC_POINT_TAG, point);
        }
    }

    pub(crate) fn commit_public_nonces(&mut self, nonces: &[RistrettoPoint]) {
        for nonce in nonces {
            self.append_point(PUBLIC_NONCE_TAG, nonce);
        }
    }

    pub(crate) fn challenge_scalar(&mut self) -> Scalar {
        let mut bytes = [0u8; 64];
        self.challenge_bytes(CHALLENGE_TAG, &mut bytes);
        Scalar::from_bytes_mod_order_wide(&bytes)
    }

    /// Derives one "synthetic" nonce per witness scalar.
    ///
    /// The nonces depend on the public transcript so far, the witness, and fresh randomness from
    /// `rng`. Every call draws new randomness, so two calls never share nonces even for the same
    /// witness.
    pub(crate) fn generate_secret_nonces<R: RngCore + CryptoRng + ?Sized>(
        &self,
        witness: &[Scalar],
        rng: &mut R,
    ) -> Vec<Scalar> {
        let mut fork = self.strobe.clone();
        fork.meta_ad(SECRET_NONCE_TAG, false);
        for scalar in witness {
            fork.key(scalar.as_bytes(), false);
        }
        let mut randomness = [0u8; NONCE_RANDOMNESS_LEN];
        rng.fill_bytes(&mut randomness);
        fork.key(&randomness, false);

        witness
            .iter()
            .map(|_| {
                let mut bytes = [0u8; 64];
                fork.prf(&mut bytes, false);
                Scalar::from_bytes_mod_order_wide(&bytes)
            })
            .collect()
    }
}
