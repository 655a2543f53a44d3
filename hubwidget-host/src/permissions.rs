//! Least-privilege sandbox permissions derived from the widget manifest.
//!
//! Two grant bases:
//! - Always: granted to every widget (pointer lock)
//! - Declared: granted only when the manifest asks for the capability

use hubwidget_types::WidgetCapabilities;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Individual sandbox permission a widget frame may hold.
///
/// Variant order is the order attributes are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxPermission {
    PointerLock,
    TopNavigation,
    Popups,
    PopupsToEscapeSandbox,
}

/// Why a permission may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantBasis {
    Always,
    Declared,
}

impl SandboxPermission {
    pub const ALL: [SandboxPermission; 4] = [
        Self::PointerLock,
        Self::TopNavigation,
        Self::Popups,
        Self::PopupsToEscapeSandbox,
    ];

    pub fn basis(&self) -> GrantBasis {
        match self {
            Self::PointerLock => GrantBasis::Always,
            Self::TopNavigation | Self::Popups | Self::PopupsToEscapeSandbox => {
                GrantBasis::Declared
            }
        }
    }

    /// The iframe `sandbox` attribute token.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::PointerLock => "allow-pointer-lock",
            Self::TopNavigation => "allow-top-navigation",
            Self::Popups => "allow-popups",
            Self::PopupsToEscapeSandbox => "allow-popups-to-escape-sandbox",
        }
    }

    /// Whether `capabilities` declare what this permission needs.
    pub fn is_declared_by(&self, capabilities: &WidgetCapabilities) -> bool {
        match self {
            Self::PointerLock => true,
            Self::TopNavigation => capabilities.top_navigation,
            Self::Popups | Self::PopupsToEscapeSandbox => capabilities.popups,
        }
    }
}

/// Permissions granted to one widget frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxPolicy {
    granted: BTreeSet<SandboxPermission>,
}

impl SandboxPolicy {
    /// Grants exactly what is always granted plus what is declared.
    pub fn from_capabilities(capabilities: &WidgetCapabilities) -> Self {
        let granted = SandboxPermission::ALL
            .into_iter()
            .filter(|p| match p.basis() {
                GrantBasis::Always => true,
                GrantBasis::Declared => p.is_declared_by(capabilities),
            })
            .collect();
        Self { granted }
    }

    /// The policy of a widget that declares nothing.
    pub fn minimal() -> Self {
        Self::from_capabilities(&WidgetCapabilities::default())
    }

    pub fn is_granted(&self, permission: SandboxPermission) -> bool {
        self.granted.contains(&permission)
    }

    pub fn granted_permissions(&self) -> &BTreeSet<SandboxPermission> {
        &self.granted
    }

    /// Whether every permission here is also granted by `other`.
    pub fn is_subset_of(&self, other: &SandboxPolicy) -> bool {
        self.granted.is_subset(&other.granted)
    }

    pub fn attributes(&self) -> Vec<&'static str> {
        self.granted.iter().map(SandboxPermission::attribute).collect()
    }

    /// Space-separated `sandbox` attribute value.
    pub fn attribute_string(&self) -> String {
        self.attributes().join(" ")
    }
}

impl fmt::Display for SandboxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.attribute_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn caps(top_navigation: bool, popups: bool) -> WidgetCapabilities {
        WidgetCapabilities {
            top_navigation,
            popups,
        }
    }

    #[test]
    fn minimal_policy_is_pointer_lock_only() {
        assert_eq!(SandboxPolicy::minimal().attribute_string(), "allow-pointer-lock");
    }

    #[test]
    fn popups_without_top_navigation() {
        let policy = SandboxPolicy::from_capabilities(&caps(false, true));
        assert_eq!(
            policy.attribute_string(),
            "allow-pointer-lock allow-popups allow-popups-to-escape-sandbox"
        );
        assert!(!policy.is_granted(SandboxPermission::TopNavigation));
    }

    #[test]
    fn top_navigation_without_popups() {
        let policy = SandboxPolicy::from_capabilities(&caps(true, false));
        assert_eq!(
            policy.attribute_string(),
            "allow-pointer-lock allow-top-navigation"
        );
    }

    #[test]
    fn everything_declared() {
        let policy = SandboxPolicy::from_capabilities(&caps(true, true));
        assert_eq!(policy.granted_permissions().len(), 4);
        assert_eq!(policy.to_string(), policy.attribute_string());
    }

    #[test]
    fn permission_bases() {
        assert_eq!(SandboxPermission::PointerLock.basis(), GrantBasis::Always);
        assert_eq!(SandboxPermission::TopNavigation.basis(), GrantBasis::Declared);
        assert_eq!(SandboxPermission::Popups.basis(), GrantBasis::Declared);
        assert_eq!(
            SandboxPermission::PopupsToEscapeSandbox.basis(),
            GrantBasis::Declared
        );
    }

    #[test]
    fn minimal_is_subset_of_every_policy() {
        let minimal = SandboxPolicy::minimal();
        for (t, p) in [(false, false), (true, false), (false, true), (true, true)] {
            assert!(minimal.is_subset_of(&SandboxPolicy::from_capabilities(&caps(t, p))));
        }
    }
}
