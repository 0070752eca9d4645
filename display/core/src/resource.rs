//! Resource References
//!
//! Images and videos reach the engine as opaque, already-resolved local
//! locations. The render surface may only load from its own resource scheme,
//! so `file://` references are rewritten before they leave the engine.

use serde::{Deserialize, Serialize};

/// Scheme used for rewritten `file://` references unless configured otherwise
pub const DEFAULT_RESOURCE_SCHEME: &str = "display-res";

const FILE_SCHEME: &str = "file://";

/// Path-like reference to a local resource
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRef(String);

impl ResourceRef {
    /// Wrap a raw reference as given by the host
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rewrite a `file://` reference onto `scheme`; other references pass through
    #[must_use]
    pub fn normalized(&self, scheme: &str) -> Self {
        Self(normalize_resource(&self.0, scheme))
    }

    /// Whether the reference is empty after trimming
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceRef {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Rewrite `file://…` (scheme matched case-insensitively) to `<scheme>://…`
#[must_use]
pub fn normalize_resource(raw: &str, scheme: &str) -> String {
    match raw.get(..FILE_SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(FILE_SCHEME) => {
            format!("{scheme}://{}", &raw[FILE_SCHEME.len()..])
        }
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_scheme_is_rewritten() {
        assert_eq!(
            normalize_resource("file:///home/user/bg.png", DEFAULT_RESOURCE_SCHEME),
            "display-res:///home/user/bg.png"
        );
        assert_eq!(
            normalize_resource("FILE:///C:/media/clip.mp4", "res"),
            "res:///C:/media/clip.mp4"
        );
    }

    #[test]
    fn test_other_references_pass_through() {
        assert_eq!(normalize_resource("/srv/img.jpg", "res"), "/srv/img.jpg");
        assert_eq!(
            normalize_resource("display-res:///a.png", "res"),
            "display-res:///a.png"
        );
        // Shorter than the scheme prefix must not panic
        assert_eq!(normalize_resource("fil", "res"), "fil");
        assert_eq!(normalize_resource("", "res"), "");
    }

    #[test]
    fn test_resource_ref_normalized() {
        let image = ResourceRef::new("file:///tmp/a b.png");
        assert_eq!(image.normalized("x").as_str(), "x:///tmp/a b.png");
        assert!(!image.is_empty());
        assert!(ResourceRef::new("  ").is_empty());
    }
}
