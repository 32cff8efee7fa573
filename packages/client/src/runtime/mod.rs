//! Capability detection and runtime seams
//!
//! [`detect`] probes the environment on every call. [`capability_report`]
//! memoizes the first probe in a process-wide holder; tests that need a clean
//! slate call [`reset_capability_cache`].

use std::sync::{PoisonError, RwLock};

pub mod detect;
pub mod report;
pub mod spawn;

pub use detect::detect;
pub use report::{CapabilityReport, Features, RuntimeFamily};
pub use spawn::{spawn, MaybeSend, MaybeSync};

static CAPABILITIES: RwLock<Option<CapabilityReport>> = RwLock::new(None);

/// Cached capability report for this process.
#[must_use]
pub fn capability_report() -> CapabilityReport {
    if let Some(report) = CAPABILITIES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return report.clone();
    }

    let report = detect();
    tracing::debug!(
        target: "wireline::runtime",
        family = %report.family(),
        native_socket = report.features().native_socket,
        library_socket = report.features().library_socket,
        "capabilities detected"
    );

    let mut slot = CAPABILITIES.write().unwrap_or_else(PoisonError::into_inner);
    slot.get_or_insert(report).clone()
}

/// Environment family tag.
#[must_use]
pub fn detect_runtime() -> RuntimeFamily {
    capability_report().family()
}

/// Drop the cached report so the next [`capability_report`] probes again.
pub fn reset_capability_cache() {
    *CAPABILITIES.write().unwrap_or_else(PoisonError::into_inner) = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_report_matches_fresh_probe() {
        reset_capability_cache();
        let cached = capability_report();
        assert_eq!(cached, detect());
        assert_eq!(detect_runtime(), cached.family());
    }
}
