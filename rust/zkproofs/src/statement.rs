//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

// A Statement is a system of linear equations over Ristretto points:
//
// P = sP + sP + sP + ...
// P = sP + sP + sP + ...
// ...
//
// which we view as a group homomorphism from a vector of scalars (the witness) to a vector of
// points (the left-hand sides). Proving the statement means proving knowledge of a preimage of the
// left-hand sides.
//
// Unlike a plain Schnorr signature there is no preassigned base point; every point, including the
// protocol generators, is named by the caller and bound to a value in PointArgs. Names are mapped
// to indices in order of first appearance, and only the indices are committed to the transcript.
//
//  Description format
//  ---
//  Ne : number of equations (1-255)
//  for i=1..Ne:
//    point_index : 0..255 (left-hand side)
//    Nt : number of terms (1-255)
//    for j=1..Nt:
//      scalar_index: 0-255
//      point_index: 0-255

use std::collections::HashMap;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::MultiscalarMul;

use crate::args::{PointArgs, ScalarArgs};
use crate::errors::PokshoError;
use crate::errors::PokshoError::*;

type ScalarIndex = u8;
type PointIndex = u8;

#[derive(Clone, Debug)]
struct Term {
    scalar: ScalarIndex,
    point: PointIndex,
}

#[derive(Clone, Debug)]
struct Equation {
    lhs: PointIndex,
    rhs: Vec<Term>,
}

#[derive(Clone, Debug, Default)]
pub struct Statement {
    equations: Vec<Equation>,
    scalar_map: HashMap<String, ScalarIndex>,
    scalar_vec: Vec<String>,
    point_map: HashMap<String, PointIndex>,
    point_vec: Vec<String>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the equation `lhs = Σ scalar·point`.
    ///
    /// Panics on empty names, an empty right-hand side, or when the statement would grow past
    /// 255 equations or 256 distinct scalars or points. Statements are built from fixed protocol
    /// shapes, so any of these is a programming error.
    pub fn add(&mut self, lhs: &str, rhs: &[(&str, &str)]) {
        assert!(
            !lhs.is_empty() && !rhs.is_empty() && rhs.len() <= 255 && self.equations.len() < 255,
            "unexpected input sizes to add"
        );
        let lhs = intern(&mut self.point_map, &mut self.point_vec, lhs);
        let rhs = rhs
            .iter()
            .map(|(scalar, point)| Term {
                scalar: intern(&mut self.scalar_map, &mut self.scalar_vec, scalar),
                point: intern(&mut self.point_map, &mut self.point_vec, point),
            })
            .collect();
        self.equations.push(Equation { lhs, rhs });
    }

    pub fn num_equations(&self) -> usize {
        self.equations.len()
    }

    pub fn num_scalars(&self) -> usize {
        self.scalar_vec.len()
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut v = vec![self.equations.len() as u8];
        for Equation { lhs, rhs } in &self.equations {
            v.push(*lhs);
            v.push(rhs.len() as u8);
            for Term { scalar, point } in rhs {
                v.push(*scalar);
                v.push(*point);
            }
        }
        v
    }

    fn sort_scalars(&self, scalar_args: &ScalarArgs) -> Result<Vec<Scalar>, PokshoError> {
        if scalar_args.len() != self.scalar_vec.len() {
            return Err(BadArgsWrongNumberOfScalarArgs);
        }
        self.scalar_vec
            .iter()
            .map(|name| scalar_args.get(name).ok_or(BadArgsMissingScalarArg))
            .collect()
    }

    fn sort_points(&self, point_args: &PointArgs) -> Result<Vec<RistrettoPoint>, PokshoError> {
        if point_args.len() != self.point_vec.len() {
            return Err(BadArgsWrongNumberOfPointArgs);
        }
        self.point_vec
            .iter()
            .map(|name| point_args.get(name).ok_or(BadArgsMissingPointArg))
            .collect()
    }

    // Applies the homomorphism to `scalars`. If given a challenge c, also subtracts c·lhs, which
    // recovers the Schnorr commitment from a response.
    pub(crate) fn homomorphism_with_subtraction(
        &self,
        scalars: &[Scalar],
        points: &[RistrettoPoint],
        challenge: Option<Scalar>,
    ) -> Vec<RistrettoPoint> {
        self.equations
            .iter()
            .map(|Equation { lhs, rhs }| {
                let subtraction = challenge.map(|c| (-c, points[*lhs as usize]));
                let (scalar_iter, point_iter): (Vec<_>, Vec<_>) = rhs
                    .iter()
                    .map(|Term { scalar, point }| {
                        (scalars[*scalar as usize], points[*point as usize])
                    })
                    .chain(subtraction)
                    .unzip();
                // Points may be secret too (e.g. U in a MAC), so no vartime here.
                RistrettoPoint::multiscalar_mul(scalar_iter, point_iter)
            })
            .collect()
    }
}

fn intern(map: &mut HashMap<String, u8>, names: &mut Vec<String>, name: &str) -> u8 {
    assert!(!name.is_empty(), "unexpected empty name");
    if let Some(index) = map.get(name) {
        return *index;
    }
    let index = u8::try_from(names.len()).expect("at most 256 distinct names per statement");
    map.insert(name.to_owned(), index);
    names.push(name.to_owned());
    index
}

/// A statement together with concrete values for all of its points.
///
/// This is what a verifier knows.
#[derive(Clone, Debug)]
pub struct Instance {
    statement: Statement,
    points: Vec<RistrettoPoint>,
}

impl Instance {
    pub fn new(statement: Statement, point_args: &PointArgs) -> Result<Self, PokshoError> {
        let points = statement.sort_points(point_args)?;
        Ok(Self { statement, points })
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub(crate) fn points(&self) -> &[RistrettoPoint] {
        &self.points
    }
}

/// An [`Instance`] together with a witness for it.
///
/// This is what a prover knows. The witness is not checked here; a witness that does not satisfy
/// the equations is caught when the prover verifies its own proof.
#[derive(Clone)]
pub struct Knowledge {
    instance: Instance,
    witness: Vec<Scalar>,
}

impl Knowledge {
    pub fn new(instance: Instance, scalar_args: &ScalarArgs) -> Result<Self, PokshoError> {
        let witness = instance.statement.sort_scalars(scalar_args)?;
        Ok(Self { instance, witness })
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub(crate) fn witness(&self) -> &[Scalar] {
        &self.witness
    }
}

impl std::fmt::Debug for Knowledge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Knowledge")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}
