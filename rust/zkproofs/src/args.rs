//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::borrow::Cow;
use std::collections::HashMap;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;

// Named assignments for the variables of a Statement. Names are usually string literals, but the
// range proof needs one name per bit, hence Cow.

#[derive(Clone, Default)]
pub struct ScalarArgs(HashMap<Cow<'static, str>, Scalar>);

#[derive(Clone, Default)]
pub struct PointArgs(HashMap<Cow<'static, str>, RistrettoPoint>);

impl ScalarArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<Cow<'static, str>>, value: Scalar) {
        self.0.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn get(&self, name: &str) -> Option<Scalar> {
        self.0.get(name).copied()
    }
}

impl PointArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<Cow<'static, str>>, value: RistrettoPoint) {
        self.0.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn get(&self, name: &str) -> Option<RistrettoPoint> {
        self.0.get(name).copied()
    }
}

impl<N: Into<Cow<'static, str>>> FromIterator<(N, Scalar)> for ScalarArgs {
    fn from_iter<T: IntoIterator<Item = (N, Scalar)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }
}

impl<N: Into<Cow<'static, str>>> FromIterator<(N, RistrettoPoint)> for PointArgs {
    fn from_iter<T: IntoIterator<Item = (N, RistrettoPoint)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }
}

impl<N: Into<Cow<'static, str>>> Extend<(N, RistrettoPoint)> for PointArgs {
    fn extend<T: IntoIterator<Item = (N, RistrettoPoint)>>(&mut self, iter: T) {
        self.0
            .extend(iter.into_iter().map(|(n, v)| (n.into(), v)))
    }
}

impl<N: Into<Cow<'static, str>>> Extend<(N, Scalar)> for ScalarArgs {
    fn extend<T: IntoIterator<Item = (N, Scalar)>>(&mut self, iter: T) {
        self.0
            .extend(iter.into_iter().map(|(n, v)| (n.into(), v)))
    }
}
