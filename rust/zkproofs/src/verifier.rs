//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use crate::errors::PokshoError;
use crate::proof::Proof;
use crate::statement::Instance;
use crate::transcript::Transcript;

/// Verifies one proof per instance against a single challenge derived from `transcript`.
///
/// The transcript must have been fed the same public data, in the same order, as the prover's.
/// On return it has absorbed the statements and nonces, exactly as the prover's transcript did.
pub fn verify<'a>(
    transcript: &mut Transcript,
    instances: impl IntoIterator<Item = &'a Instance>,
    proofs: &[Proof],
) -> Result<(), PokshoError> {
    let instances: Vec<&Instance> = instances.into_iter().collect();
    if instances.len() != proofs.len() {
        return Err(PokshoError::WrongNumberOfProofs {
            statements: instances.len(),
            proofs: proofs.len(),
        });
    }
    for (instance, proof) in instances.iter().zip(proofs) {
        let statement = instance.statement();
        if proof.public_nonces().len() != statement.num_equations()
            || proof.responses().len() != statement.num_scalars()
        {
            return Err(PokshoError::VerificationFailure);
        }
    }

    for instance in &instances {
        transcript.commit_statement(&instance.statement().to_bytes(), instance.points());
    }
    for proof in proofs {
        transcript.commit_public_nonces(proof.public_nonces());
    }
    let challenge = transcript.challenge_scalar();

    // R = F(s) - c·A for every equation of every statement.
    let all_valid = instances.iter().zip(proofs).all(|(instance, proof)| {
        let expected = instance.statement().homomorphism_with_subtraction(
            proof.responses(),
            instance.points(),
            Some(challenge),
        );
        expected == proof.public_nonces()
    });
    if all_valid {
        Ok(())
    } else {
        Err(PokshoError::VerificationFailure)
    }
}
