//! TLS host identity verification and cryptographic provider bootstrap for
//! the Lattice platform
//!
//! This crate carries the two security-critical pieces of platform startup and
//! connection handling. [`bootstrap()`] runs once per process, before any
//! cryptographic operation: it stamps the super tenant into the host's
//! execution context and registers the configured
//! [`rustls::crypto::CryptoProvider`] (standard or FIPS) into an explicit,
//! process-wide [`ProviderRegistry`]. [`verify_hostname`] runs on every TLS
//! handshake thereafter, deciding whether the hostname a peer was addressed by
//! is covered by the identities its certificate claims, with a fixed
//! allow-list for loopback names.
//!
//! The two halves never interact at runtime: bootstrap completes before the
//! first handshake, and the verifier is pure and reentrant, so it can be
//! called from arbitrarily many handshake threads without locking.

#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![warn(clippy::use_self)]

mod bootstrap;
mod provider;
mod verify;

pub use crate::bootstrap::{
    bootstrap, BootstrapConfig, ExecutionContext, PROVIDER_PREFERENCE_VAR, SUPER_TENANT_DOMAIN,
    SUPER_TENANT_ID,
};
pub use crate::provider::{
    ProviderError, ProviderKind, ProviderRegistration, ProviderRegistry, FIPS_PROVIDER_ID,
    STANDARD_PROVIDER_ID,
};
pub use crate::verify::{
    verify_hostname, verify_hostname_with, CertificateIdentity, HostnameMismatch, IdentityMatcher,
    StandardMatcher, ALLOWED_LOCAL_NAMES,
};
