//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::sync::LazyLock;

use curve25519_dalek::ristretto::RistrettoPoint;
use sha2::Sha512;

static GENERATORS: LazyLock<Generators> = LazyLock::new(Generators::generate);

/// The fixed, independent points shared by every client and issuer.
///
/// Nobody knows the discrete log of any of these with respect to any other, since each one is the
/// hash of a distinct constant label.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Generators {
    pub G_w: RistrettoPoint,
    pub G_wprime: RistrettoPoint,
    pub G_x0: RistrettoPoint,
    pub G_x1: RistrettoPoint,
    pub G_V: RistrettoPoint,
    /// Amount generator.
    pub G_g: RistrettoPoint,
    /// Randomness generator.
    pub G_h: RistrettoPoint,
    /// Blinding generator for presentations.
    pub G_a: RistrettoPoint,
    /// Serial number generator.
    pub G_s: RistrettoPoint,
}

impl Generators {
    fn generate() -> Self {
        let point = |label: &str| RistrettoPoint::hash_from_bytes::<Sha512>(label.as_bytes());
        Self {
            G_w: point("G_w"),
            G_wprime: point("G_wprime"),
            G_x0: point("G_x0"),
            G_x1: point("G_x1"),
            G_V: point("G_V"),
            G_g: point("G_g"),
            G_h: point("G_h"),
            G_a: point("G_a"),
            G_s: point("G_s"),
        }
    }

    pub fn get() -> &'static Generators {
        &GENERATORS
    }
}
