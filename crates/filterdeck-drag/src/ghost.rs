#![forbid(unsafe_code)]

//! The ghost: the single floating visual of the token in flight.
//!
//! Coordinates are overlay-local. The controller converts window-space
//! pointer samples with `pointer - grab_offset - overlay_origin` before they
//! reach [`Ghost::set_target`].

use filterdeck_core::animation::{Follower, FollowerConfig};
use filterdeck_core::geometry::Point;
use filterdeck_core::token::{Token, TokenId, TokenKind};
use serde::{Deserialize, Serialize};

use crate::host::ImageHandle;

/// Position and tilt handed to the host surface each tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GhostTransform {
    pub position: Point,
    pub lean_degrees: f32,
}

/// Everything a host needs to draw the ghost.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostView {
    pub token: TokenId,
    pub kind: TokenKind,
    pub label: String,
    pub image: Option<ImageHandle>,
    pub transform: GhostTransform,
}

#[derive(Debug, Clone)]
pub struct Ghost {
    token: TokenId,
    kind: TokenKind,
    label: String,
    image: Option<ImageHandle>,
    follower: Follower,
    home: Point,
}

impl Ghost {
    /// A ghost resting at `home`, the token's on-screen origin.
    #[must_use]
    pub fn new(token: &Token, image: Option<ImageHandle>, home: Point, config: FollowerConfig) -> Self {
        Self {
            token: token.id(),
            kind: token.kind().clone(),
            label: token.label().to_string(),
            image,
            follower: Follower::new(home, config),
            home,
        }
    }

    #[must_use]
    pub fn token(&self) -> TokenId {
        self.token
    }

    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    /// Where a canceled drag flies back to.
    #[must_use]
    pub fn home(&self) -> Point {
        self.home
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.follower.position()
    }

    #[must_use]
    pub fn target(&self) -> Point {
        self.follower.target()
    }

    #[must_use]
    pub fn lean_degrees(&self) -> f32 {
        self.follower.lean_degrees()
    }

    #[must_use]
    pub fn transform(&self) -> GhostTransform {
        GhostTransform {
            position: self.position(),
            lean_degrees: self.lean_degrees(),
        }
    }

    #[must_use]
    pub fn view(&self) -> GhostView {
        GhostView {
            token: self.token,
            kind: self.kind.clone(),
            label: self.label.clone(),
            image: self.image.clone(),
            transform: self.transform(),
        }
    }

    pub fn set_target(&mut self, target: Point) {
        self.follower.set_target(target);
    }

    /// One follower tick.
    pub fn step(&mut self) -> GhostTransform {
        self.follower.step();
        self.transform()
    }

    /// Scripted placement (return flight).
    pub fn place(&mut self, transform: GhostTransform) {
        self.follower
            .place(transform.position, transform.lean_degrees);
    }
}
