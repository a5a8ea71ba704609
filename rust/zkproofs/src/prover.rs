//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use rand_core::{CryptoRng, RngCore};

use crate::errors::PokshoError;
use crate::proof::Proof;
use crate::statement::Knowledge;
use crate::transcript::Transcript;
use crate::verifier::verify;

/// Proves every statement in `knowledge` under one shared Fiat-Shamir challenge.
///
/// Nonces are synthetic: each statement gets its own nonces derived from the transcript so far,
/// its witness, and fresh bytes from `rng`, so no two proofs ever share a nonce.
///
/// The proofs are verified before being returned, since a bad proof could indicate a faulty
/// computation that leaks the witness.
pub fn prove<R: RngCore + CryptoRng + ?Sized>(
    transcript: &mut Transcript,
    knowledge: &[Knowledge],
    rng: &mut R,
) -> Result<Vec<Proof>, PokshoError> {
    let mut checkpoint = transcript.clone();

    for k in knowledge {
        let instance = k.instance();
        transcript.commit_statement(&instance.statement().to_bytes(), instance.points());
    }

    let secret_nonces: Vec<_> = knowledge
        .iter()
        .map(|k| transcript.generate_secret_nonces(k.witness(), &mut *rng))
        .collect();
    let public_nonces: Vec<_> = knowledge
        .iter()
        .zip(&secret_nonces)
        .map(|(k, nonces)| {
            let instance = k.instance();
            instance
                .statement()
                .homomorphism_with_subtraction(nonces, instance.points(), None)
        })
        .collect();
    for nonces in &public_nonces {
        transcript.commit_public_nonces(nonces);
    }

    let challenge = transcript.challenge_scalar();

    let proofs: Vec<Proof> = knowledge
        .iter()
        .zip(secret_nonces)
        .zip(public_nonces)
        .map(|((k, secret), public)| {
            let responses = secret
                .iter()
                .zip(k.witness())
                .map(|(nonce, witness)| nonce + challenge * witness)
                .collect();
            Proof::new(public, responses)
        })
        .collect();

    match verify(
        &mut checkpoint,
        knowledge.iter().map(Knowledge::instance),
        &proofs,
    ) {
        Err(PokshoError::VerificationFailure) => Err(PokshoError::ProofCreationVerificationFailure),
        Err(e) => Err(e),
        Ok(()) => Ok(proofs),
    }
}
