//! Adapter selection

use super::adapter::{Adapter, AdapterKind};
use super::hooks::HookCell;
use crate::config::DuplexConfig;
use crate::error::{self, Result};
use crate::runtime::{capability_report, CapabilityReport};

/// Preferred transport for `report`: the host socket when present,
/// otherwise the library one.
#[must_use]
pub fn select_adapter(report: &CapabilityReport) -> Option<AdapterKind> {
    let features = report.features();
    if features.native_socket {
        Some(AdapterKind::Native)
    } else if features.library_socket {
        Some(AdapterKind::Library)
    } else {
        None
    }
}

/// Build a fresh adapter for `config`.
///
/// Uses `config.capabilities` when set, the cached capability report
/// otherwise. Fails with the no-transport kind before any I/O when no
/// transport is available in this build.
pub fn create_adapter(config: &DuplexConfig, hooks: HookCell) -> Result<Box<dyn Adapter>> {
    config.validate()?;

    let report = match &config.capabilities {
        Some(report) => report.clone(),
        None => capability_report(),
    };
    let Some(kind) = select_adapter(&report) else {
        tracing::debug!(target: "wireline::duplex", family = %report.family(), "no duplex transport available");
        return Err(error::no_transport());
    };
    tracing::debug!(target: "wireline::duplex", adapter = %kind, url = %config.url, "adapter selected");

    build(kind, config.clone(), hooks)
}

#[allow(unreachable_patterns)]
fn build(kind: AdapterKind, config: DuplexConfig, hooks: HookCell) -> Result<Box<dyn Adapter>> {
    match kind {
        #[cfg(target_arch = "wasm32")]
        AdapterKind::Native => Ok(Box::new(super::native::NativeAdapter::new(config, hooks))),
        #[cfg(all(not(target_arch = "wasm32"), feature = "library-transport"))]
        AdapterKind::Library => Ok(Box::new(super::library::LibraryAdapter::new(config, hooks))),
        other => {
            tracing::debug!(target: "wireline::duplex", adapter = %other, "transport not compiled into this build");
            drop((config, hooks));
            Err(error::no_transport())
        }
    }
}
