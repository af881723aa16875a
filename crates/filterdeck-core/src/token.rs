#![forbid(unsafe_code)]

//! Token data model.
//!
//! A [`Token`] is either a [`PlainToken`] (an atomic placeable item such as a
//! joker card) or a [`ContainerToken`] holding an ordered, possibly repeating
//! list of child tokens. Both carry an opaque [`Decorations`] bag that the
//! drag engine copies but never interprets.
//!
//! # Invariants
//!
//! 1. [`TokenId`] is never zero.
//! 2. [`Token::duplicate`] assigns a fresh id to the copy and to every
//!    descendant; kinds, metadata, decorations and child order are preserved.
//! 3. [`TokenIdAllocator`] is strictly monotonic and reports overflow instead
//!    of wrapping.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable identifier for a token instance. `0` is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct TokenId(u64);

impl TokenId {
    /// Smallest valid id.
    pub const MIN: Self = Self(1);

    /// Create a token id, rejecting zero.
    pub fn new(raw: u64) -> Result<Self, TokenModelError> {
        if raw == 0 {
            return Err(TokenModelError::ZeroTokenId);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for TokenId {
    type Error = TokenModelError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TokenId> for u64 {
    fn from(value: TokenId) -> Self {
        value.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh [`TokenId`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdAllocator {
    next: u64,
}

impl Default for TokenIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl TokenIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start allocating strictly after `id` (used when adopting tokens that
    /// already carry ids).
    pub fn reserve_through(&mut self, id: TokenId) {
        self.next = self.next.max(id.get().saturating_add(1));
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> Result<TokenId, TokenModelError> {
        if self.next == u64::MAX {
            return Err(TokenModelError::IdOverflow);
        }
        let id = TokenId::new(self.next)?;
        self.next += 1;
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// What a token *is*, e.g. `Joker:Blueprint` or `Group:Banned`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenKind {
    category: String,
    name: String,
}

impl TokenKind {
    #[must_use]
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Parse `"Category:Name"`. A string without `:` is a bare name with an
    /// empty category.
    pub fn parse(raw: &str) -> Result<Self, TokenModelError> {
        let (category, name) = match raw.split_once(':') {
            Some((category, name)) => (category.trim(), name.trim()),
            None => ("", raw.trim()),
        };
        if name.is_empty() {
            return Err(TokenModelError::EmptyKindName {
                raw: raw.to_string(),
            });
        }
        Ok(Self::new(category, name))
    }

    #[inline]
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.category, self.name)
        }
    }
}

impl TryFrom<String> for TokenKind {
    type Error = TokenModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TokenKind> for String {
    fn from(value: TokenKind) -> Self {
        value.to_string()
    }
}

/// Variant discriminant of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenShape {
    Plain,
    Container,
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Presentation data for a plain token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayMetadata {
    pub label: String,
    /// Key handed to the image lookup collaborator; `None` renders imageless.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
}

impl DisplayMetadata {
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            image_key: None,
        }
    }
}

/// Opaque modifiers (edition, stickers, seals...). Copied, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decorations(BTreeMap<String, String>);

impl Decorations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An atomic placeable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainToken {
    pub id: TokenId,
    pub kind: TokenKind,
    #[serde(default)]
    pub display: DisplayMetadata,
    #[serde(default, skip_serializing_if = "Decorations::is_empty")]
    pub decorations: Decorations,
}

/// A token holding an ordered list of child tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerToken {
    pub id: TokenId,
    pub kind: TokenKind,
    #[serde(default)]
    pub children: Vec<Token>,
    #[serde(default, skip_serializing_if = "Decorations::is_empty")]
    pub decorations: Decorations,
}

/// A placeable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Token {
    Plain(PlainToken),
    Container(ContainerToken),
}

impl Token {
    /// Build a plain token labeled with its kind name.
    #[must_use]
    pub fn plain(id: TokenId, kind: TokenKind) -> Self {
        let display = DisplayMetadata::labeled(kind.name());
        Self::Plain(PlainToken {
            id,
            kind,
            display,
            decorations: Decorations::default(),
        })
    }

    #[must_use]
    pub fn container(id: TokenId, kind: TokenKind, children: Vec<Token>) -> Self {
        Self::Container(ContainerToken {
            id,
            kind,
            children,
            decorations: Decorations::default(),
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TokenId {
        match self {
            Self::Plain(t) => t.id,
            Self::Container(t) => t.id,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        match self {
            Self::Plain(t) => &t.kind,
            Self::Container(t) => &t.kind,
        }
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> TokenShape {
        match self {
            Self::Plain(_) => TokenShape::Plain,
            Self::Container(_) => TokenShape::Container,
        }
    }

    #[must_use]
    pub fn decorations(&self) -> &Decorations {
        match self {
            Self::Plain(t) => &t.decorations,
            Self::Container(t) => &t.decorations,
        }
    }

    /// Human label: the display label for plain tokens, the kind name for
    /// containers.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Plain(t) if !t.display.label.is_empty() => &t.display.label,
            Self::Plain(t) => t.kind.name(),
            Self::Container(t) => t.kind.name(),
        }
    }

    #[must_use]
    pub fn image_key(&self) -> Option<&str> {
        match self {
            Self::Plain(t) => t.display.image_key.as_deref(),
            Self::Container(_) => None,
        }
    }

    #[must_use]
    pub fn as_container(&self) -> Option<&ContainerToken> {
        match self {
            Self::Container(c) => Some(c),
            Self::Plain(_) => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut ContainerToken> {
        match self {
            Self::Container(c) => Some(c),
            Self::Plain(_) => None,
        }
    }

    /// Children of a container; empty for plain tokens.
    #[must_use]
    pub fn children(&self) -> &[Token] {
        match self {
            Self::Container(c) => &c.children,
            Self::Plain(_) => &[],
        }
    }

    /// Deep copy with fresh ids for this token and every descendant.
    pub fn duplicate(&self, ids: &mut TokenIdAllocator) -> Result<Token, TokenModelError> {
        match self {
            Self::Plain(t) => Ok(Self::Plain(PlainToken {
                id: ids.allocate()?,
                kind: t.kind.clone(),
                display: t.display.clone(),
                decorations: t.decorations.clone(),
            })),
            Self::Container(c) => {
                let id = ids.allocate()?;
                let children = c
                    .children
                    .iter()
                    .map(|child| child.duplicate(ids))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Container(ContainerToken {
                    id,
                    kind: c.kind.clone(),
                    children,
                    decorations: c.decorations.clone(),
                }))
            }
        }
    }

    /// Visit this token and all descendants, depth-first, parents first.
    pub fn walk(&self, visit: &mut impl FnMut(&Token)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Largest id in this subtree.
    #[must_use]
    pub fn max_id(&self) -> TokenId {
        let mut max = self.id();
        self.walk(&mut |t| max = max.max(t.id()));
        max
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Token model failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenModelError {
    ZeroTokenId,
    IdOverflow,
    EmptyKindName { raw: String },
}

impl fmt::Display for TokenModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTokenId => write!(f, "token id must be non-zero"),
            Self::IdOverflow => write!(f, "token id space exhausted"),
            Self::EmptyKindName { raw } => write!(f, "token kind {raw:?} has an empty name"),
        }
    }
}

impl std::error::Error for TokenModelError {}
