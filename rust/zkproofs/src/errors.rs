//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, displaydoc::Display)]
pub enum PokshoError {
    /// wrong number of scalar arguments for statement
    BadArgsWrongNumberOfScalarArgs,
    /// wrong number of point arguments for statement
    BadArgsWrongNumberOfPointArgs,
    /// missing scalar argument for statement
    BadArgsMissingScalarArg,
    /// missing point argument for statement
    BadArgsMissingPointArg,
    /// expected {statements} proofs, got {proofs}
    WrongNumberOfProofs { statements: usize, proofs: usize },
    /// proof verification failed
    VerificationFailure,
    /// proof verification failed during proof creation (bad inputs or faulty computation)
    ProofCreationVerificationFailure,
}
