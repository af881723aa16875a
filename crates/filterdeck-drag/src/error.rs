#![forbid(unsafe_code)]

//! Error types for the drag engine and its collaborators.
//!
//! None of these escape a pointer handler: the controller logs them and
//! degrades to a no-op or a cancel. They surface directly only from setup
//! calls (`Board::add_zone`, config loading) and from [`commit`].
//!
//! [`commit`]: crate::resolver::commit

use filterdeck_core::token::{TokenId, TokenModelError};
use thiserror::Error;

use crate::zone::{ZoneId, ZoneRole};

pub type Result<T> = std::result::Result<T, DragError>;

#[derive(Debug, Error)]
pub enum DragError {
    #[error("layout query failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("image lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("ghost surface failed: {0}")]
    Surface(#[from] SurfaceError),

    #[error("hook failed: {0}")]
    Hook(#[from] HookError),

    #[error("token model error: {0}")]
    Token(#[from] TokenModelError),

    #[error("token {token} is no longer where the drag found it")]
    TokenVanished { token: TokenId },

    #[error("token id {token} is already on the board")]
    DuplicateToken { token: TokenId },

    #[error("unknown zone {zone}")]
    UnknownZone { zone: ZoneId },

    #[error("zone name {name:?} is already registered")]
    DuplicateZone { name: String },

    #[error("a {role:?} zone is already registered")]
    DuplicateSingletonRole { role: ZoneRole },

    #[error("config error: {message}")]
    Config { message: String },
}

impl DragError {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Geometry for a zone or container could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The host has not laid the element out yet (first frame, collapsed
    /// panel). Routine; degrades to "no zone".
    #[error("layout not realized")]
    NotRealized,

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("image lookup for {key:?}: {message}")]
pub struct LookupError {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation}: {message}")]
pub struct SurfaceError {
    pub operation: &'static str,
    pub message: String,
}

impl SurfaceError {
    #[must_use]
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{hook} hook: {message}")]
pub struct HookError {
    pub hook: &'static str,
    pub message: String,
}

impl HookError {
    #[must_use]
    pub fn new(hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            hook,
            message: message.into(),
        }
    }
}
