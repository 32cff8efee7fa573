//! Random number generation utilities
//!
//! [`random_id`] produces UUIDv4-formatted identifiers, trying in order the
//! platform secure-random source, a manually seeded CSPRNG, and finally the
//! non-cryptographic `fastrand` generator. [`random_id_with_source`] reports
//! which tier produced the value.

use std::fmt;

/// Which generator produced an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdSource {
    /// Platform secure random (`OsRng`, `crypto.randomUUID`).
    Platform,
    /// CSPRNG bytes with UUIDv4 version and variant bits set by hand.
    Manual,
    /// `fastrand` fallback. Unsuitable for security-sensitive identifiers.
    Insecure,
}

impl IdSource {
    #[must_use]
    pub fn is_secure(self) -> bool {
        !matches!(self, IdSource::Insecure)
    }
}

impl fmt::Display for IdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdSource::Platform => "platform",
            IdSource::Manual => "manual",
            IdSource::Insecure => "insecure",
        })
    }
}

/// Sixteen bytes from the thread-local `fastrand` generator. Predictable;
/// never use them where an identifier must be unguessable.
fn insecure_bytes() -> [u8; 16] {
    let mut bytes = [0u8; 16];
    fastrand::fill(&mut bytes);
    bytes
}

/// Generate boundary string for multipart forms
#[must_use]
pub fn generate_boundary() -> String {
    format!("----wireline-formdata-{:016x}{:016x}", fastrand::u64(..), fastrand::u64(..))
}

/// Whether the platform secure-random source is usable.
#[cfg(not(target_arch = "wasm32"))]
#[must_use]
pub fn secure_random_available() -> bool {
    use rand::TryRngCore;

    let mut probe = [0u8; 4];
    rand::rngs::OsRng.try_fill_bytes(&mut probe).is_ok()
}

/// Whether the platform secure-random source is usable.
#[cfg(target_arch = "wasm32")]
#[must_use]
pub fn secure_random_available() -> bool {
    web::crypto().is_some()
}

/// UUIDv4-formatted random identifier.
#[must_use]
pub fn random_id() -> String {
    random_id_with_source().0
}

/// UUIDv4-formatted random identifier and the tier that produced it.
#[must_use]
pub fn random_id_with_source() -> (String, IdSource) {
    if let Some(id) = platform_uuid() {
        return (id, IdSource::Platform);
    }

    let mut bytes = [0u8; 16];
    let source = if manual_fill(&mut bytes) {
        IdSource::Manual
    } else {
        tracing::warn!(
            target: "wireline::crypto",
            "no secure random source, falling back to fastrand identifiers"
        );
        bytes = insecure_bytes();
        IdSource::Insecure
    };

    (format_uuid_v4(bytes), source)
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_uuid() -> Option<String> {
    use rand::TryRngCore;

    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.try_fill_bytes(&mut bytes).ok()?;
    Some(format_uuid_v4(bytes))
}

#[cfg(target_arch = "wasm32")]
fn platform_uuid() -> Option<String> {
    web::crypto().map(|crypto| crypto.random_uuid())
}

#[cfg(not(target_arch = "wasm32"))]
fn manual_fill(bytes: &mut [u8]) -> bool {
    use rand::{RngCore, SeedableRng};

    match rand::rngs::StdRng::try_from_os_rng() {
        Ok(mut rng) => {
            rng.fill_bytes(bytes);
            true
        }
        Err(_) => false,
    }
}

#[cfg(target_arch = "wasm32")]
fn manual_fill(bytes: &mut [u8]) -> bool {
    web::fill(bytes)
}

/// Set the UUIDv4 version nibble and RFC 4122 variant bits, then render as
/// `8-4-4-4-12` lowercase hex.
fn format_uuid_v4(mut bytes: [u8; 16]) -> String {
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::{JsCast, JsValue};

    pub(super) fn crypto() -> Option<web_sys::Crypto> {
        js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("crypto"))
            .ok()?
            .dyn_into::<web_sys::Crypto>()
            .ok()
    }

    pub(super) fn fill(bytes: &mut [u8]) -> bool {
        crypto()
            .map(|crypto| crypto.get_random_values_with_u8_array(bytes).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_uuid_v4(id: &str) {
        let groups: Vec<&str> = id.split('-').collect();
        assert_eq!(
            groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12],
            "{id}"
        );
        assert!(id.chars().all(|c| c == '-' || c.is_ascii_hexdigit()));
        assert!(groups[2].starts_with('4'), "version nibble in {id}");
        assert!(
            matches!(groups[3].as_bytes()[0], b'8' | b'9' | b'a' | b'b'),
            "variant bits in {id}"
        );
    }

    #[test]
    fn ids_are_uuid_v4_shaped() {
        for _ in 0..64 {
            assert_uuid_v4(&random_id());
        }
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| random_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn server_targets_use_platform_source() {
        let (_, source) = random_id_with_source();
        assert_eq!(source, IdSource::Platform);
        assert!(source.is_secure());
        assert!(secure_random_available());
    }

    #[test]
    fn manual_formatting_sets_version_and_variant() {
        assert_uuid_v4(&format_uuid_v4([0xff; 16]));
        assert_uuid_v4(&format_uuid_v4([0x00; 16]));
    }

    #[test]
    fn insecure_tier_still_yields_distinct_uuids() {
        let ids: HashSet<String> = (0..256).map(|_| format_uuid_v4(insecure_bytes())).collect();
        assert_eq!(ids.len(), 256);
        ids.iter().for_each(|id| assert_uuid_v4(id));
        assert!(!IdSource::Insecure.is_secure());
    }

    #[test]
    fn boundaries_are_unique() {
        assert_ne!(generate_boundary(), generate_boundary());
    }
}
