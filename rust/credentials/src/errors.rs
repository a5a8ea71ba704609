//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

/// Why a step of the registration protocol was rejected.
///
/// Each kind is a distinct variant so callers never need to inspect messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, displaydoc::Display)]
pub enum CredentialError {
    /// amount is negative or exceeds the maximum credential amount
    AmountOutOfRange,
    /// invalid number of presented credentials
    InvalidNumberOfPresentedCredentials,
    /// invalid number of requested credentials
    InvalidNumberOfRequestedCredentials,
    /// bit commitment is missing or not a valid non-identity point
    InvalidBitCommitment,
    /// coordinator received invalid proofs
    CoordinatorReceivedInvalidProofs,
    /// client received invalid proofs
    ClientReceivedInvalidProofs,
    /// serial number already used
    SerialNumberAlreadyUsed,
    /// issuer returned the wrong number of credentials
    IssuedCredentialNumberMismatch,
    /// not enough zero-value credentials to fill the presentation
    NotEnoughZeroCredentialsToFillRequest,
    /// request would make the issuer's balance negative
    NegativeBalance,
    /// credential is not held by this client
    UnknownCredential,
    /// no request is awaiting a response
    NoPendingRequest,
    /// a freshly created proof failed to verify
    ProofCreationFailed,
}

impl CredentialError {
    /// Whether the error was detected by a client, about its own state or the issuer's response.
    ///
    /// Client errors say nothing about the behavior of whoever sent a request.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::ClientReceivedInvalidProofs
            | Self::IssuedCredentialNumberMismatch
            | Self::NotEnoughZeroCredentialsToFillRequest
            | Self::UnknownCredential
            | Self::NoPendingRequest => true,
            Self::AmountOutOfRange
            | Self::InvalidNumberOfPresentedCredentials
            | Self::InvalidNumberOfRequestedCredentials
            | Self::InvalidBitCommitment
            | Self::CoordinatorReceivedInvalidProofs
            | Self::SerialNumberAlreadyUsed
            | Self::NegativeBalance
            | Self::ProofCreationFailed => false,
        }
    }
}
