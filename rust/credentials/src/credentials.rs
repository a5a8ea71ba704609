//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Keys, MACs, credentials and their presentations.
//!
//! This is the algebraic MAC of Chase-Perrin-Zaverucha with a single hidden attribute, the
//! amount commitment `Ma`, as used by WabiSabi.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use subtle::{Choice, ConstantTimeEq};

use crate::attributes::Attribute;
use crate::generators::Generators;

/// The coordinator's secret MAC key.
#[derive(Clone, Serialize, Deserialize)]
pub struct IssuerSecretKey {
    pub(crate) w: Scalar,
    pub(crate) wprime: Scalar,
    pub(crate) x0: Scalar,
    pub(crate) x1: Scalar,
    pub(crate) ya: Scalar,
}

impl IssuerSecretKey {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            w: Scalar::random(rng),
            wprime: Scalar::random(rng),
            x0: Scalar::random(rng),
            x1: Scalar::random(rng),
            ya: Scalar::random(rng),
        }
    }

    pub fn parameters(&self) -> IssuerParameters {
        let g = Generators::get();
        IssuerParameters {
            Cw: self.w * g.G_w + self.wprime * g.G_wprime,
            I: g.G_V - self.x0 * g.G_x0 - self.x1 * g.G_x1 - self.ya * g.G_a,
        }
    }

    /// Computes a MAC over the commitment `Ma` with a fresh tag `t`.
    pub(crate) fn mac<R: RngCore + CryptoRng>(
        &self,
        Ma: RistrettoPoint,
        rng: &mut R,
    ) -> Mac {
        let g = Generators::get();
        let t = Scalar::random(rng);
        let U = hash_to_point(&t);
        let V = self.w * g.G_w + (self.x0 + self.x1 * t) * U + self.ya * Ma;
        Mac { t, V }
    }
}

impl std::fmt::Debug for IssuerSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerSecretKey").finish_non_exhaustive()
    }
}

/// The public commitments to an [`IssuerSecretKey`], known to every client.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerParameters {
    pub Cw: RistrettoPoint,
    pub I: RistrettoPoint,
}

/// `(t, V)`; the point `U` is derived from `t`.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Mac {
    pub t: Scalar,
    pub V: RistrettoPoint,
}

impl Mac {
    pub fn U(&self) -> RistrettoPoint {
        hash_to_point(&self.t)
    }
}

impl ConstantTimeEq for Mac {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.t.ct_eq(&other.t) & self.V.ct_eq(&other.V)
    }
}

impl PartialEq for Mac {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Mac {}

pub(crate) fn hash_to_point(t: &Scalar) -> RistrettoPoint {
    RistrettoPoint::hash_from_bytes::<Sha512>(t.as_bytes())
}

/// An issued credential: an amount, the randomness of its commitment, and the issuer's MAC.
///
/// Only the client that requested it knows the amount and randomness. It can be presented once.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    amount: u64,
    randomness: Scalar,
    mac: Mac,
}

impl Credential {
    pub(crate) fn new(attribute: &Attribute, mac: Mac) -> Self {
        Self {
            amount: attribute.amount(),
            randomness: attribute.randomness(),
            mac,
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub(crate) fn randomness(&self) -> Scalar {
        self.randomness
    }

    pub(crate) fn mac(&self) -> &Mac {
        &self.mac
    }

    pub(crate) fn commitment(&self) -> RistrettoPoint {
        Attribute::with_randomness(self.amount, self.randomness).commitment()
    }

    /// The serial number `S = r·G_s`, revealed when the credential is presented.
    pub fn serial_number(&self) -> CompressedRistretto {
        (self.randomness * Generators::get().G_s).compress()
    }

    /// Randomizes the credential with a fresh `z`.
    ///
    /// Returns the presentation and `z`, which the show proof needs.
    pub(crate) fn present<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> (CredentialPresentation, Scalar) {
        let g = Generators::get();
        let z = Scalar::random(rng);
        let U = self.mac.U();
        let presentation = CredentialPresentation {
            Ca: z * g.G_a + self.commitment(),
            Cx0: z * g.G_x0 + U,
            Cx1: z * g.G_x1 + self.mac.t * U,
            CV: z * g.G_V + self.mac.V,
            S: self.randomness * g.G_s,
        };
        (presentation, z)
    }
}

impl ConstantTimeEq for Credential {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.amount.ct_eq(&other.amount)
            & self.randomness.ct_eq(&other.randomness)
            & self.mac.ct_eq(&other.mac)
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Credential {}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("amount", &self.amount)
            .field("serial_number", &self.serial_number())
            .finish_non_exhaustive()
    }
}

/// A one-time randomized view of a [`Credential`].
///
/// `S` is the serial number; all other points are blinded with a fresh `z`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPresentation {
    pub Ca: RistrettoPoint,
    pub Cx0: RistrettoPoint,
    pub Cx1: RistrettoPoint,
    pub CV: RistrettoPoint,
    pub S: RistrettoPoint,
}

impl CredentialPresentation {
    /// `Z = CV - (w·G_w + x0·Cx0 + x1·Cx1 + ya·Ca)`, which equals `z·I` for an honest
    /// presentation of a valid credential.
    pub(crate) fn compute_Z(&self, key: &IssuerSecretKey) -> RistrettoPoint {
        let g = Generators::get();
        self.CV - (key.w * g.G_w + key.x0 * self.Cx0 + key.x1 * self.Cx1 + key.ya * self.Ca)
    }
}
