//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

//! The statements proven during registration.
//!
//! Each statement has an `*_instance` constructor for the verifier, built only from public values,
//! and a `*_knowledge` constructor for the prover, which adds the witness. Both sides must build
//! the same instance for a proof to verify.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use rand_core::{CryptoRng, RngCore};
use zkproofs::{Instance, Knowledge, PointArgs, ScalarArgs, Statement};

use crate::attributes::Attribute;
use crate::credentials::{Credential, CredentialPresentation, IssuerParameters, IssuerSecretKey, Mac};
use crate::errors::CredentialError;
use crate::generators::Generators;

fn instance(statement: Statement, points: &PointArgs) -> Instance {
    Instance::new(statement, points).expect("every point of the statement is bound")
}

fn knowledge(instance: Instance, scalars: &ScalarArgs) -> Knowledge {
    Knowledge::new(instance, scalars).expect("every scalar of the statement is bound")
}

pub(crate) fn scalar_from_i64(value: i64) -> Scalar {
    let magnitude = Scalar::from(value.unsigned_abs());
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

// Show credential
//
// Z = z·I
// Cx1 = t·Cx0 + z0·G_x0 + z·G_x1     (z0 = -t·z)
// Ca = z·G_a + a·G_g + r·G_h
// S = r·G_s

fn show_credential_statement() -> Statement {
    let mut st = Statement::new();
    st.add("Z", &[("z", "I")]);
    st.add("Cx1", &[("t", "Cx0"), ("z0", "G_x0"), ("z", "G_x1")]);
    st.add("Ca", &[("z", "G_a"), ("a", "G_g"), ("r", "G_h")]);
    st.add("S", &[("r", "G_s")]);
    st
}

pub(crate) fn show_credential_instance(
    presentation: &CredentialPresentation,
    Z: RistrettoPoint,
    parameters: &IssuerParameters,
) -> Instance {
    let g = Generators::get();
    let points = PointArgs::from_iter([
        ("Z", Z),
        ("I", parameters.I),
        ("Cx1", presentation.Cx1),
        ("Cx0", presentation.Cx0),
        ("G_x0", g.G_x0),
        ("G_x1", g.G_x1),
        ("Ca", presentation.Ca),
        ("G_a", g.G_a),
        ("G_g", g.G_g),
        ("G_h", g.G_h),
        ("S", presentation.S),
        ("G_s", g.G_s),
    ]);
    instance(show_credential_statement(), &points)
}

pub(crate) fn show_credential_knowledge(
    presentation: &CredentialPresentation,
    z: Scalar,
    credential: &Credential,
    parameters: &IssuerParameters,
) -> Knowledge {
    let t = credential.mac().t;
    let scalars = ScalarArgs::from_iter([
        ("z", z),
        ("t", t),
        ("z0", -(t * z)),
        ("a", Scalar::from(credential.amount())),
        ("r", credential.randomness()),
    ]);
    knowledge(
        show_credential_instance(presentation, z * parameters.I, parameters),
        &scalars,
    )
}

// Range
//
// for each bit i:  B_i = b_i·G_g + r_i·G_h
//                  O = b_i·(B_i - G_g) + p_i·G_h     (p_i = -b_i·r_i)
// Ma - Σ 2^i·B_i = r'·G_h
//
// The first equation opens B_i to b_i; substituting it into the second forces
// b_i·(b_i - 1) = 0, so every B_i commits to a bit.

fn range_proof_statement(width: usize) -> Statement {
    let mut st = Statement::new();
    for i in 0..width {
        let (b, r, p) = (format!("b{i}"), format!("r{i}"), format!("p{i}"));
        let (B, B_minus_G) = (format!("B{i}"), format!("B{i}-G_g"));
        st.add(&B, &[(b.as_str(), "G_g"), (r.as_str(), "G_h")]);
        st.add("O", &[(b.as_str(), B_minus_G.as_str()), (p.as_str(), "G_h")]);
    }
    st.add("Ma-B", &[("r'", "G_h")]);
    st
}

pub(crate) fn range_proof_instance(Ma: RistrettoPoint, bit_commitments: &[RistrettoPoint]) -> Instance {
    let g = Generators::get();
    let mut points = PointArgs::from_iter([
        ("O", RistrettoPoint::identity()),
        ("G_g", g.G_g),
        ("G_h", g.G_h),
    ]);
    let mut weighted_sum = RistrettoPoint::identity();
    for (i, B) in bit_commitments.iter().enumerate() {
        points.add(format!("B{i}"), *B);
        points.add(format!("B{i}-G_g"), B - g.G_g);
        weighted_sum += Scalar::from(1u64 << i) * B;
    }
    points.add("Ma-B", Ma - weighted_sum);
    instance(range_proof_statement(bit_commitments.len()), &points)
}

/// Commits to each of the `width` low bits of the attribute's amount.
///
/// Returns the bit commitments along with the knowledge to prove they decompose `Ma`. Fails
/// closed if the amount does not fit in `width` bits.
pub(crate) fn range_proof_knowledge<R: RngCore + CryptoRng>(
    attribute: &Attribute,
    width: u32,
    rng: &mut R,
) -> Result<(Vec<RistrettoPoint>, Knowledge), CredentialError> {
    let amount = attribute.amount();
    if width < 64 && amount >> width != 0 {
        return Err(CredentialError::AmountOutOfRange);
    }

    let g = Generators::get();
    let mut scalars = ScalarArgs::new();
    let mut bit_commitments = Vec::with_capacity(width as usize);
    let mut weighted_randomness = Scalar::ZERO;
    for i in 0..width {
        let bit = Scalar::from((amount >> i) & 1);
        let r = Scalar::random(rng);
        bit_commitments.push(bit * g.G_g + r * g.G_h);
        weighted_randomness += Scalar::from(1u64 << i) * r;
        scalars.add(format!("b{i}"), bit);
        scalars.add(format!("r{i}"), r);
        scalars.add(format!("p{i}"), -(bit * r));
    }
    scalars.add("r'", attribute.randomness() - weighted_randomness);

    let instance = range_proof_instance(attribute.commitment(), &bit_commitments);
    Ok((bit_commitments, knowledge(instance, &scalars)))
}

// Zero
//
// Ma = r·G_h

fn zero_proof_statement() -> Statement {
    let mut st = Statement::new();
    st.add("Ma", &[("r", "G_h")]);
    st
}

pub(crate) fn zero_proof_instance(Ma: RistrettoPoint) -> Instance {
    let points = PointArgs::from_iter([("Ma", Ma), ("G_h", Generators::get().G_h)]);
    instance(zero_proof_statement(), &points)
}

pub(crate) fn zero_proof_knowledge(attribute: &Attribute) -> Knowledge {
    debug_assert_eq!(attribute.amount(), 0);
    let scalars = ScalarArgs::from_iter([("r", attribute.randomness())]);
    knowledge(zero_proof_instance(attribute.commitment()), &scalars)
}

// Balance
//
// ΣCa - ΣMa + delta·G_g = z·G_a + r·G_h
//
// where z = Σz over the presentations, r = Σr(presented) - Σr(requested), and
// delta = Σ(requested amounts) - Σ(presented amounts).

fn balance_statement() -> Statement {
    let mut st = Statement::new();
    st.add("B", &[("z", "G_a"), ("r", "G_h")]);
    st
}

pub(crate) fn balance_instance<'a>(
    delta: i64,
    presented: impl IntoIterator<Item = &'a CredentialPresentation>,
    requested: impl IntoIterator<Item = &'a RistrettoPoint>,
) -> Instance {
    let g = Generators::get();
    let presented_sum: RistrettoPoint = presented.into_iter().map(|p| p.Ca).sum();
    let requested_sum: RistrettoPoint = requested.into_iter().sum();
    let B = presented_sum - requested_sum + scalar_from_i64(delta) * g.G_g;
    let points = PointArgs::from_iter([("B", B), ("G_a", g.G_a), ("G_h", g.G_h)]);
    instance(balance_statement(), &points)
}

pub(crate) fn balance_knowledge(
    delta: i64,
    presented: &[(CredentialPresentation, Scalar, Credential)],
    requested: &[Attribute],
) -> Knowledge {
    let z: Scalar = presented.iter().map(|(_, z, _)| z).sum();
    let r = presented.iter().map(|(_, _, c)| c.randomness()).sum::<Scalar>()
        - requested.iter().map(Attribute::randomness).sum::<Scalar>();
    let commitments: Vec<RistrettoPoint> = requested.iter().map(Attribute::commitment).collect();
    let instance = balance_instance(delta, presented.iter().map(|(p, _, _)| p), &commitments);
    knowledge(instance, &ScalarArgs::from_iter([("z", z), ("r", r)]))
}

// Issuer parameters
//
// Cw = w·G_w + w'·G_wprime
// G_V - I = x0·G_x0 + x1·G_x1 + ya·G_a
// V = w·G_w + x0·U + x1·tU + ya·Ma

fn issuer_parameters_statement() -> Statement {
    let mut st = Statement::new();
    st.add("Cw", &[("w", "G_w"), ("w'", "G_wprime")]);
    st.add("G_V-I", &[("x0", "G_x0"), ("x1", "G_x1"), ("ya", "G_a")]);
    st.add("V", &[("w", "G_w"), ("x0", "U"), ("x1", "tU"), ("ya", "Ma")]);
    st
}

pub(crate) fn issuer_parameters_instance(
    parameters: &IssuerParameters,
    mac: &Mac,
    Ma: RistrettoPoint,
) -> Instance {
    let g = Generators::get();
    let U = mac.U();
    let points = PointArgs::from_iter([
        ("Cw", parameters.Cw),
        ("G_w", g.G_w),
        ("G_wprime", g.G_wprime),
        ("G_V-I", g.G_V - parameters.I),
        ("G_x0", g.G_x0),
        ("G_x1", g.G_x1),
        ("G_a", g.G_a),
        ("V", mac.V),
        ("U", U),
        ("tU", mac.t * U),
        ("Ma", Ma),
    ]);
    instance(issuer_parameters_statement(), &points)
}

pub(crate) fn issuer_parameters_knowledge(
    key: &IssuerSecretKey,
    mac: &Mac,
    Ma: RistrettoPoint,
) -> Knowledge {
    let scalars = ScalarArgs::from_iter([
        ("w", key.w),
        ("w'", key.wprime),
        ("x0", key.x0),
        ("x1", key.x1),
        ("ya", key.ya),
    ]);
    knowledge(
        issuer_parameters_instance(&key.parameters(), mac, Ma),
        &scalars,
    )
}
