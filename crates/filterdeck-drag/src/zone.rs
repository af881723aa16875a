#![forbid(unsafe_code)]

//! Drop zones.
//!
//! A [`Zone`] is a typed destination: it owns an ordered token list, an
//! [`AcceptPolicy`], a [`ZoneRole`] that drives hit priority and placement
//! semantics, and a highlight flag written only by hit testing.
//!
//! Zones never store geometry. Bounds are asked of the host's
//! [`LayoutProbe`](crate::host::LayoutProbe) every time they are needed.

use std::collections::BTreeSet;
use std::fmt;

use filterdeck_core::token::{ContainerToken, Token, TokenId, TokenKind, TokenShape};
use serde::{Deserialize, Serialize};

/// Stable identifier for a registered zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(u16);

impl ZoneId {
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone{}", self.0)
    }
}

/// What a zone is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneRole {
    /// Ordinary filter section ("Must", "Should", ...).
    Categorized,
    /// The single favorites/shortcut shelf.
    Favorite,
    /// Return-to-shelf: dropping here deletes a placed token.
    Return,
    /// Holds the staging container that new children are collected into.
    Staging,
}

impl ZoneRole {
    /// Roles of which a board holds at most one.
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        !matches!(self, Self::Categorized)
    }
}

/// Which tokens a zone admits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptPolicy {
    #[default]
    Any,
    Nothing,
    PlainOnly,
    ContainersOnly,
    /// Plain or container tokens whose kind category is listed.
    Categories(BTreeSet<String>),
    /// Exact kinds.
    Kinds(BTreeSet<TokenKind>),
}

impl AcceptPolicy {
    #[must_use]
    pub fn categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Categories(categories.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn kinds(kinds: impl IntoIterator<Item = TokenKind>) -> Self {
        Self::Kinds(kinds.into_iter().collect())
    }

    #[must_use]
    pub fn admits(&self, kind: &TokenKind, shape: TokenShape) -> bool {
        match self {
            Self::Any => true,
            Self::Nothing => false,
            Self::PlainOnly => shape == TokenShape::Plain,
            Self::ContainersOnly => shape == TokenShape::Container,
            Self::Categories(set) => set.contains(kind.category()),
            Self::Kinds(set) => set.contains(kind),
        }
    }
}

/// Registration data for a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    pub role: ZoneRole,
    #[serde(default)]
    pub accepts: AcceptPolicy,
    /// Tie-break among overlapping zones of the same role; higher wins.
    #[serde(default)]
    pub priority: u8,
}

impl ZoneSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, role: ZoneRole) -> Self {
        Self {
            name: name.into(),
            role,
            accepts: AcceptPolicy::Any,
            priority: 0,
        }
    }

    #[must_use]
    pub fn categorized(name: impl Into<String>) -> Self {
        Self::new(name, ZoneRole::Categorized)
    }

    #[must_use]
    pub fn accepts(mut self, policy: AcceptPolicy) -> Self {
        self.accepts = policy;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

/// A registered drop zone and the tokens it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    id: ZoneId,
    name: String,
    role: ZoneRole,
    accepts: AcceptPolicy,
    priority: u8,
    tokens: Vec<Token>,
    highlighted: bool,
}

impl Zone {
    pub(crate) fn from_spec(id: ZoneId, spec: ZoneSpec) -> Self {
        // Return-to-shelf takes anything back.
        let accepts = match spec.role {
            ZoneRole::Return => AcceptPolicy::Any,
            _ => spec.accepts,
        };
        Self {
            id,
            name: spec.name,
            role: spec.role,
            accepts,
            priority: spec.priority,
            tokens: Vec::new(),
            highlighted: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ZoneId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn role(&self) -> ZoneRole {
        self.role
    }

    #[inline]
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    #[must_use]
    pub fn accept_policy(&self) -> &AcceptPolicy {
        &self.accepts
    }

    /// Whether this zone admits `token`.
    #[must_use]
    pub fn accepts(&self, token: &Token) -> bool {
        self.accepts.admits(token.kind(), token.shape())
    }

    #[inline]
    #[must_use]
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub(crate) fn set_highlighted(&mut self, on: bool) {
        self.highlighted = on;
    }

    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of a top-level token.
    #[must_use]
    pub fn position(&self, id: TokenId) -> Option<usize> {
        self.tokens.iter().position(|t| t.id() == id)
    }

    /// Find a token anywhere in this zone. Returns the id of its immediate
    /// parent container (`None` for top-level tokens) and the token.
    #[must_use]
    pub fn find(&self, id: TokenId) -> Option<(Option<TokenId>, &Token)> {
        fn search(
            parent: Option<TokenId>,
            tokens: &[Token],
            id: TokenId,
        ) -> Option<(Option<TokenId>, &Token)> {
            for token in tokens {
                if token.id() == id {
                    return Some((parent, token));
                }
                if let Some(found) = search(Some(token.id()), token.children(), id) {
                    return Some(found);
                }
            }
            None
        }
        search(None, &self.tokens, id)
    }

    /// First top-level container of `kind`, excluding `except`.
    #[must_use]
    pub fn container_of_kind(
        &self,
        kind: &TokenKind,
        except: Option<TokenId>,
    ) -> Option<&ContainerToken> {
        self.tokens
            .iter()
            .filter_map(Token::as_container)
            .find(|c| &c.kind == kind && Some(c.id) != except)
    }

    /// Top-level container tokens, in order.
    pub fn containers(&self) -> impl Iterator<Item = &ContainerToken> {
        self.tokens.iter().filter_map(Token::as_container)
    }

    /// A container anywhere in this zone.
    pub fn container_mut(&mut self, id: TokenId) -> Option<&mut ContainerToken> {
        fn search(tokens: &mut [Token], id: TokenId) -> Option<&mut ContainerToken> {
            for token in tokens {
                if let Token::Container(c) = token {
                    if c.id == id {
                        return Some(c);
                    }
                    if let Some(found) = search(&mut c.children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        search(&mut self.tokens, id)
    }

    /// Append a token.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Insert directly after the top-level token `anchor`, or append when the
    /// anchor is absent.
    pub fn insert_after(&mut self, anchor: TokenId, token: Token) {
        match self.position(anchor) {
            Some(index) => self.tokens.insert(index + 1, token),
            None => self.tokens.push(token),
        }
    }

    /// Remove a token from wherever it sits in this zone (top level or inside
    /// a container), preserving the order of everything else.
    pub fn remove(&mut self, id: TokenId) -> Option<Token> {
        fn take(tokens: &mut Vec<Token>, id: TokenId) -> Option<Token> {
            if let Some(index) = tokens.iter().position(|t| t.id() == id) {
                return Some(tokens.remove(index));
            }
            tokens
                .iter_mut()
                .filter_map(Token::as_container_mut)
                .find_map(|c| take(&mut c.children, id))
        }
        take(&mut self.tokens, id)
    }

    /// Drop every token, returning them in order.
    pub fn clear(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.tokens)
    }
}
