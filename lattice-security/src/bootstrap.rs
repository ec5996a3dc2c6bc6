//! One-time security bootstrap for the process
//!
//! The host invokes [`bootstrap`] exactly once at startup, before serving any
//! TLS or cryptographic operation. The sequence stamps the super tenant into
//! the host's execution context, records the startup environment for
//! operators, then selects and registers the configured cryptographic
//! provider. Failures are fatal; the caller must abort startup.

use std::env;

use tracing::{debug, info};

use crate::provider::{ProviderError, ProviderKind, ProviderRegistry};

/// Environment variable consulted by [`BootstrapConfig::from_env`]
pub const PROVIDER_PREFERENCE_VAR: &str = "LATTICE_CRYPTO_PROVIDER";

/// Tenant domain stamped into the execution context during bootstrap
pub const SUPER_TENANT_DOMAIN: &str = "lattice.super";

/// Tenant id stamped into the execution context during bootstrap
pub const SUPER_TENANT_ID: i32 = -1234;

/// Execution context owned by the host, stamped once during bootstrap
///
/// Deployment-time work runs as the super tenant; per-request tenant
/// resolution only begins after bootstrap completes. The context is threaded
/// through the startup call explicitly rather than held in per-thread state.
pub trait ExecutionContext {
    /// Record the active tenant domain
    fn set_tenant_domain(&mut self, domain: &str);
    /// Record the active tenant id
    fn set_tenant_id(&mut self, id: i32);
}

/// Settings consumed by [`bootstrap`]
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    /// Raw provider preference; `None` and unrecognized values select the
    /// standard provider
    pub provider_preference: Option<String>,
}

impl BootstrapConfig {
    /// Build a config from the process environment
    pub fn from_env() -> Self {
        Self {
            provider_preference: env::var(PROVIDER_PREFERENCE_VAR).ok(),
        }
    }
}

/// Run the process-wide security bootstrap
///
/// Stamps the super tenant into `context`, then selects the configured
/// cryptographic provider and appends it to `registry`. Returns the kind
/// that is now registered. Must complete before the first TLS handshake.
///
/// Errors are fatal: the caller must abort startup rather than serve traffic
/// with cryptography in an undefined state. Invoking the sequence a second
/// time is harmless; a provider that is already registered is left in place.
pub fn bootstrap(
    config: &BootstrapConfig,
    registry: &ProviderRegistry,
    context: &mut dyn ExecutionContext,
) -> Result<ProviderKind, ProviderError> {
    context.set_tenant_domain(SUPER_TENANT_DOMAIN);
    context.set_tenant_id(SUPER_TENANT_ID);

    log_environment();

    let kind = ProviderKind::from_preference(config.provider_preference.as_deref());
    let provider = kind.instantiate()?;
    if registry.register(kind, provider) {
        debug!(provider = %kind, "security provider registered");
    } else {
        debug!(provider = %kind, "security provider already registered, skipping");
    }
    Ok(kind)
}

/// Environment facts operators expect in the startup log
fn log_environment() {
    info!(
        os = env::consts::OS,
        arch = env::consts::ARCH,
        version = env!("CARGO_PKG_VERSION"),
        "starting security bootstrap"
    );
    info!(
        user = %env::var("USER").unwrap_or_default(),
        locale = %env::var("LANG").unwrap_or_default(),
        home = %env::var("HOME").unwrap_or_default(),
        temp = %env::temp_dir().display(),
        "process environment"
    );
}
