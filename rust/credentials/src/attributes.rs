//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};

use crate::generators::Generators;

/// A Pedersen commitment `Ma = amount·G_g + randomness·G_h` to an amount a client wants a
/// credential for.
///
/// The randomness is always freshly sampled; two attributes never share it.
#[derive(Clone)]
pub struct Attribute {
    amount: u64,
    randomness: Scalar,
    Ma: RistrettoPoint,
}

impl Attribute {
    pub fn new<R: RngCore + CryptoRng>(amount: u64, rng: &mut R) -> Self {
        let randomness = Scalar::random(rng);
        Self::with_randomness(amount, randomness)
    }

    pub(crate) fn with_randomness(amount: u64, randomness: Scalar) -> Self {
        let g = Generators::get();
        let Ma = Scalar::from(amount) * g.G_g + randomness * g.G_h;
        Self {
            amount,
            randomness,
            Ma,
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn randomness(&self) -> Scalar {
        self.randomness
    }

    pub fn commitment(&self) -> RistrettoPoint {
        self.Ma
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("Ma", &self.Ma.compress())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;

    #[test]
    fn commitments_hide_equal_amounts() {
        let a = Attribute::new(42, &mut OsRng);
        let b = Attribute::new(42, &mut OsRng);
        assert_eq!(a.amount(), b.amount());
        assert_ne!(a.commitment(), b.commitment());
    }

    #[test]
    fn commitment_is_homomorphic() {
        let a = Attribute::new(3, &mut OsRng);
        let b = Attribute::new(4, &mut OsRng);
        let sum = Attribute::with_randomness(7, a.randomness() + b.randomness());
        assert_eq!(a.commitment() + b.commitment(), sum.commitment());
    }
}
