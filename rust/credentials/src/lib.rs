//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Keyed-verification anonymous credentials for amounts, as used by WabiSabi coinjoin
//! coordination.
//!
//! A client holds credentials for amounts and exchanges them with the coordinator (the issuer)
//! for new ones. Every exchange is a [`RegistrationRequest`] that presents some credentials and
//! requests new ones, together with zero-knowledge proofs that
//!
//! - every presented credential carries a valid MAC from the issuer,
//! - every requested amount fits in the configured range proof width, and
//! - the requested amounts minus the presented amounts equal the public `delta`.
//!
//! The issuer learns `delta` and the serial numbers of the presented credentials, and nothing
//! else about the amounts. Serial numbers let the issuer reject a credential presented twice.
//!
//! The very first request a client makes is a _null request_, which presents nothing and asks
//! for zero-value credentials, so that later requests can always present exactly
//! `number_of_credentials` credentials.

#![allow(non_snake_case)]

pub mod attributes;
pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod generators;
pub mod issuer;
pub mod messages;
mod proof_system;

pub use attributes::Attribute;
pub use client::CredentialClient;
pub use config::{ConfigError, CredentialConfig};
pub use credentials::{Credential, CredentialPresentation, IssuerParameters, IssuerSecretKey, Mac};
pub use errors::CredentialError;
pub use issuer::CredentialIssuer;
pub use messages::{IssuanceRequest, RegistrationRequest, RegistrationResponse};
pub use zkproofs::{Proof, Transcript};
