#![forbid(unsafe_code)]

//! Placement policy: container capabilities and hard restrictions.
//!
//! Rules are data, not code paths. The resolver consults them for merge and
//! into-container decisions, and hit testing consults them so a restricted
//! zone never lights up.
//!
//! # Policy files
//!
//! With the `policy-config` feature, rules load from TOML:
//!
//! ```toml
//! [containers]
//! "Group:Banned" = "MERGEABLE | ACCEPTS_CHILDREN"
//!
//! [[restrictions]]
//! kind = "Group:Banned"
//! zone = "Bonus"
//! ```

use std::collections::HashMap;

use ahash::RandomState;
use bitflags::bitflags;
use filterdeck_core::token::TokenKind;
use serde::{Deserialize, Serialize};

use crate::zone::Zone;

bitflags! {
    /// What a container kind allows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ContainerCaps: u8 {
        /// A dropped container of this kind folds its children into a
        /// resident same-kind container instead of being inserted.
        const MERGEABLE        = 0b01;
        /// Plain tokens may be dropped straight into it.
        const ACCEPTS_CHILDREN = 0b10;
    }
}

/// A kind that must never be placed into the named zone, whatever the
/// geometry says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub kind: TokenKind,
    pub zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRules {
    containers: HashMap<TokenKind, ContainerCaps, RandomState>,
    restrictions: Vec<Restriction>,
}

impl PlacementRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare capabilities for a container kind (builder pattern).
    #[must_use]
    pub fn container(mut self, kind: TokenKind, caps: ContainerCaps) -> Self {
        self.containers.insert(kind, caps);
        self
    }

    /// Forbid `kind` in the zone called `zone` (builder pattern).
    #[must_use]
    pub fn forbid(mut self, kind: TokenKind, zone: impl Into<String>) -> Self {
        self.restrictions.push(Restriction {
            kind,
            zone: zone.into(),
        });
        self
    }

    /// Capabilities of a container kind; empty when undeclared.
    #[must_use]
    pub fn caps(&self, kind: &TokenKind) -> ContainerCaps {
        self.containers.get(kind).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_mergeable(&self, kind: &TokenKind) -> bool {
        self.caps(kind).contains(ContainerCaps::MERGEABLE)
    }

    #[must_use]
    pub fn accepts_children(&self, kind: &TokenKind) -> bool {
        self.caps(kind).contains(ContainerCaps::ACCEPTS_CHILDREN)
    }

    #[must_use]
    pub fn restrictions(&self) -> &[Restriction] {
        &self.restrictions
    }

    /// Whether placing `kind` into `zone` is forbidden.
    #[must_use]
    pub fn is_restricted(&self, kind: &TokenKind, zone: &Zone) -> bool {
        self.restrictions
            .iter()
            .any(|r| &r.kind == kind && r.zone == zone.name())
    }

    /// Load rules from a TOML policy file.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(raw: &str) -> crate::Result<Self> {
        toml::from_str(raw).map_err(|e| crate::DragError::config(format!("placement rules: {e}")))
    }

    /// Load rules from JSON.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(raw: &str) -> crate::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| crate::DragError::config(format!("placement rules: {e}")))
    }
}
