//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use curve25519_dalek::ristretto::RistrettoPoint;
use serde::{Deserialize, Serialize};
use zkproofs::{Proof, Transcript};

use crate::credentials::{CredentialPresentation, Mac};

/// A request for one new credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceRequest {
    pub ma: RistrettoPoint,
    /// Commitments to the bits of the amount, lowest first. Empty for a null request.
    pub bit_commitments: Vec<RistrettoPoint>,
}

/// Sent by a client to exchange presented credentials for newly requested ones.
///
/// `delta` is the sum of the requested amounts minus the sum of the presented amounts.
///
/// Proofs are ordered as one show proof per presentation, one range proof per issuance request,
/// then the balance proof. A null request (nothing presented, `delta == 0`) carries one zero
/// proof per issuance request instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub delta: i64,
    pub presented: Vec<CredentialPresentation>,
    pub requested: Vec<IssuanceRequest>,
    pub proofs: Vec<Proof>,
}

impl RegistrationRequest {
    pub fn is_null_request(&self) -> bool {
        self.presented.is_empty()
    }
}

/// The issuer's answer: one MAC per issuance request, each with a proof that it was made with the
/// published issuer parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub issued_macs: Vec<Mac>,
    pub proofs: Vec<Proof>,
}

/// Binds the request's framing to the transcript before any proof.
///
/// Client and issuer must call this identically.
pub(crate) fn commit_request(
    transcript: &mut Transcript,
    number_of_credentials: usize,
    is_null_request: bool,
    delta: i64,
) {
    transcript.append_u64(b"number-of-credentials", number_of_credentials as u64);
    transcript.append_message(
        b"request-kind",
        if is_null_request { b"null" } else { b"real" },
    );
    transcript.append_i64(b"delta", delta);
}

/// Binds the issued MACs to the transcript before the issuance proofs.
pub(crate) fn commit_response(transcript: &mut Transcript, issued_macs: &[Mac]) {
    transcript.append_u64(b"issued", issued_macs.len() as u64);
    for mac in issued_macs {
        transcript.append_scalar(b"mac-t", &mac.t);
        transcript.append_point(b"mac-V", &mac.V);
    }
}
