//! Cryptographic provider selection and registration
//!
//! Exactly one provider variant is active per process, chosen from
//! configuration at startup. The registry holding the registered provider is
//! an explicit object handed to the bootstrap sequence rather than a hidden
//! process global, so the host owns its lifetime and tests can run against a
//! fresh one. Which backends are compiled in is controlled by the `ring` and
//! `fips` crate features.

use std::fmt;
use std::sync::{Arc, RwLock};

use rustls::crypto::CryptoProvider;
use thiserror::Error;

/// Identifier under which the standard provider registers
///
/// Provider identifiers are fixed; existing platform configurations refer to
/// providers by these names.
pub const STANDARD_PROVIDER_ID: &str = "BC";

/// Identifier under which the FIPS provider registers, and the only
/// preference value that selects it
pub const FIPS_PROVIDER_ID: &str = "BC-FIPS";

/// The cryptographic provider variants the platform can register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// The default provider, suitable for most deployments
    Standard,
    /// The certified provider required in FIPS compliance environments
    Fips,
}

impl ProviderKind {
    /// Select a provider from the configured preference string
    ///
    /// Only a case-insensitive match on [`FIPS_PROVIDER_ID`] selects the FIPS
    /// provider; any other value, including an unset one, selects the
    /// standard provider.
    pub fn from_preference(preference: Option<&str>) -> Self {
        match preference {
            Some(value) if value.eq_ignore_ascii_case(FIPS_PROVIDER_ID) => Self::Fips,
            _ => Self::Standard,
        }
    }

    /// Resolve a provider identifier, rejecting anything outside the known set
    pub fn from_identifier(identifier: &str) -> Result<Self, ProviderError> {
        if identifier.eq_ignore_ascii_case(STANDARD_PROVIDER_ID) {
            Ok(Self::Standard)
        } else if identifier.eq_ignore_ascii_case(FIPS_PROVIDER_ID) {
            Ok(Self::Fips)
        } else {
            Err(ProviderError::Unsupported(identifier.to_owned()))
        }
    }

    /// The identifier this provider registers under
    pub fn identifier(self) -> &'static str {
        match self {
            Self::Standard => STANDARD_PROVIDER_ID,
            Self::Fips => FIPS_PROVIDER_ID,
        }
    }

    /// Construct the concrete provider implementation for this kind
    ///
    /// Fails when the backend for the kind was compiled out, or when the
    /// certified backend does not pass its FIPS self-check. Both cases are
    /// fatal at startup; a process must not fall back to weaker cryptography
    /// than it was configured for.
    pub fn instantiate(self) -> Result<Arc<CryptoProvider>, ProviderError> {
        match self {
            Self::Standard => {
                #[cfg(feature = "ring")]
                {
                    Ok(Arc::new(rustls::crypto::ring::default_provider()))
                }
                #[cfg(not(feature = "ring"))]
                {
                    Err(ProviderError::Instantiation {
                        kind: self,
                        reason: "built without the `ring` feature",
                    })
                }
            }
            Self::Fips => {
                #[cfg(feature = "fips")]
                {
                    let provider = rustls::crypto::aws_lc_rs::default_provider();
                    if !provider.fips() {
                        return Err(ProviderError::Instantiation {
                            kind: self,
                            reason: "backend failed its FIPS self-check",
                        });
                    }
                    Ok(Arc::new(provider))
                }
                #[cfg(not(feature = "fips"))]
                {
                    Err(ProviderError::Instantiation {
                        kind: self,
                        reason: "built without the `fips` feature",
                    })
                }
            }
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.identifier())
    }
}

/// Errors raised while resolving or instantiating a cryptographic provider
///
/// Both variants are fatal: startup must abort rather than continue with
/// cryptography in an undefined state. There is no retry; a missing backend
/// will not appear on a second attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The identifier does not name a provider this build knows
    #[error("unsupported cryptographic provider {0:?}")]
    Unsupported(String),
    /// The selected provider's backend could not be constructed
    #[error("cryptographic provider {kind} unavailable: {reason}")]
    Instantiation {
        /// Which provider was requested
        kind: ProviderKind,
        /// Why the backend was unavailable
        reason: &'static str,
    },
}

/// A provider registered for the lifetime of the process
#[derive(Debug, Clone)]
pub struct ProviderRegistration {
    kind: ProviderKind,
    provider: Arc<CryptoProvider>,
}

impl ProviderRegistration {
    /// Which provider variant this registration holds
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// The provider itself, as handed to `rustls` config builders
    pub fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }
}

/// Process-wide registry of cryptographic providers
///
/// Append-only: bootstrap writes to it once, and TLS/crypto subsystems read
/// from it for the rest of the process lifetime. Nothing is removed during
/// normal operation.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    entries: RwLock<Vec<ProviderRegistration>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `provider` under `kind`
    ///
    /// Idempotent per kind: when a provider of the same kind is already
    /// registered the call is a no-op and returns `false`.
    pub fn register(&self, kind: ProviderKind, provider: Arc<CryptoProvider>) -> bool {
        let mut entries = self.entries.write().unwrap();
        if entries.iter().any(|entry| entry.kind == kind) {
            return false;
        }
        entries.push(ProviderRegistration { kind, provider });
        true
    }

    /// The provider registered under `kind`, if any
    pub fn lookup(&self, kind: ProviderKind) -> Option<Arc<CryptoProvider>> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.provider.clone())
    }

    /// Whether a provider is registered under `kind`
    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.entries
            .read()
            .unwrap()
            .iter()
            .any(|entry| entry.kind == kind)
    }

    /// Snapshot of every registration, in registration order
    pub fn registrations(&self) -> Vec<ProviderRegistration> {
        self.entries.read().unwrap().clone()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether no provider has been registered yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
