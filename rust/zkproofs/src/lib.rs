//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Non-interactive proofs of knowledge of discrete-log relations over Ristretto.
//!
//! A [`Statement`] is a system of linear equations between named points and named scalars. An
//! [`Instance`] binds the points to values, and [`Knowledge`] additionally binds the scalars (the
//! witness). Any number of statements can be proven together with [`prove`] under a single
//! Fiat-Shamir challenge taken from a [`Transcript`], and checked with [`verify`].
//!
//! The transcript is a Strobe-128 duplex over Keccak-f\[1600\], framed so that values of
//! different labels, lengths or order never collide.

pub mod args;
pub mod errors;
pub mod proof;
pub mod prover;
pub mod statement;
mod strobe;
pub mod transcript;
pub mod verifier;

pub use args::{PointArgs, ScalarArgs};
pub use errors::PokshoError;
pub use proof::Proof;
pub use prover::prove;
pub use statement::{Instance, Knowledge, Statement};
pub use transcript::Transcript;
pub use verifier::verify;
