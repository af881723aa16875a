#![forbid(unsafe_code)]

//! The read-only palette of template tokens.
//!
//! Templates are grouped by kind category and never leave the palette:
//! placing one always inserts a duplicate, so the palette stays reusable.

use std::collections::BTreeMap;

use filterdeck_core::token::{Token, TokenId, TokenKind};

/// Grouped-by-category template tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    groups: BTreeMap<String, Vec<Token>>,
}

impl Palette {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template under its kind category. Id uniqueness is the board's
    /// responsibility.
    pub(crate) fn insert(&mut self, template: Token) {
        self.groups
            .entry(template.kind().category().to_string())
            .or_default()
            .push(template);
    }

    /// Total number of templates across all groups.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Templates in one category, in insertion order.
    #[must_use]
    pub fn group(&self, category: &str) -> &[Token] {
        self.groups.get(category).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn find(&self, id: TokenId) -> Option<&Token> {
        self.iter().find(|t| t.id() == id)
    }

    /// Whether some template has `kind`.
    #[must_use]
    pub fn offers(&self, kind: &TokenKind) -> bool {
        self.group(kind.category()).iter().any(|t| t.kind() == kind)
    }

    /// First template of `kind`.
    #[must_use]
    pub fn template_of(&self, kind: &TokenKind) -> Option<&Token> {
        self.group(kind.category()).iter().find(|t| t.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.groups.values().flatten()
    }
}
