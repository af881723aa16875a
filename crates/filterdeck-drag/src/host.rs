#![forbid(unsafe_code)]

//! Host collaborators.
//!
//! The engine draws nothing, loads nothing and saves nothing itself. Hosts
//! plug in through four small traits:
//!
//! | Trait | Asked for |
//! |-------|-----------|
//! | [`LayoutProbe`] | live zone/container bounds, every query |
//! | [`ImageLookup`] | the ghost's image at drag start |
//! | [`GhostSurface`] | mounting, moving and unmounting the ghost; hiding the source visual |
//! | [`PlacementHooks`] | persistence and favorites side effects after a commit |
//!
//! # Failure Modes
//!
//! Every method may fail. The controller logs failures at `warn` and carries
//! on; `LayoutError::NotRealized` is treated as routine and logged at `debug`.

use std::collections::HashMap;

use ahash::RandomState;
use filterdeck_core::geometry::Rect;
use filterdeck_core::token::{Token, TokenId};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::{HookError, LayoutError, LookupError, SurfaceError};
use crate::ghost::{GhostTransform, GhostView};
use crate::zone::ZoneId;

/// Opaque host image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(pub String);

/// Live geometry. Never cached by the engine.
pub trait LayoutProbe {
    fn zone_rect(&self, zone: ZoneId) -> Result<Rect, LayoutError>;

    /// Bounds of a container token rendered inside `zone`.
    fn container_rect(&self, _zone: ZoneId, _container: TokenId) -> Result<Rect, LayoutError> {
        Err(LayoutError::NotRealized)
    }
}

pub trait ImageLookup {
    /// `Ok(None)` means the token simply has no image.
    fn lookup(&self, token: &Token) -> Result<Option<ImageHandle>, LookupError>;
}

pub trait GhostSurface {
    fn mount(&mut self, ghost: &GhostView) -> Result<(), SurfaceError>;

    /// Called once per tick while the ghost moves.
    fn update(&mut self, _transform: GhostTransform) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn unmount(&mut self) -> Result<(), SurfaceError>;

    fn set_source_hidden(&mut self, token: TokenId, hidden: bool) -> Result<(), SurfaceError>;
}

/// Fire-and-forget side effects of a committed placement.
pub trait PlacementHooks {
    fn persist(&mut self, _board: &Board) -> Result<(), HookError> {
        Ok(())
    }

    fn favorite_added(&mut self, _token: &Token) -> Result<(), HookError> {
        Ok(())
    }
}

/// Collaborator that does nothing and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl ImageLookup for NoopHost {
    fn lookup(&self, _token: &Token) -> Result<Option<ImageHandle>, LookupError> {
        Ok(None)
    }
}

impl GhostSurface for NoopHost {
    fn mount(&mut self, _ghost: &GhostView) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn unmount(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn set_source_hidden(&mut self, _token: TokenId, _hidden: bool) -> Result<(), SurfaceError> {
        Ok(())
    }
}

impl PlacementHooks for NoopHost {}

/// A fixed table of rectangles. Anything missing reports `NotRealized`.
#[derive(Debug, Clone, Default)]
pub struct StaticLayout {
    zones: HashMap<ZoneId, Rect, RandomState>,
    containers: HashMap<(ZoneId, TokenId), Rect, RandomState>,
}

impl StaticLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn zone(mut self, zone: ZoneId, rect: Rect) -> Self {
        self.zones.insert(zone, rect);
        self
    }

    #[must_use]
    pub fn container(mut self, zone: ZoneId, container: TokenId, rect: Rect) -> Self {
        self.containers.insert((zone, container), rect);
        self
    }

    pub fn set_zone(&mut self, zone: ZoneId, rect: Rect) {
        self.zones.insert(zone, rect);
    }

    /// Forget a zone's bounds, as when its panel collapses.
    pub fn unrealize(&mut self, zone: ZoneId) {
        self.zones.remove(&zone);
        self.containers.retain(|(z, _), _| *z != zone);
    }
}

impl LayoutProbe for StaticLayout {
    fn zone_rect(&self, zone: ZoneId) -> Result<Rect, LayoutError> {
        self.zones.get(&zone).copied().ok_or(LayoutError::NotRealized)
    }

    fn container_rect(&self, zone: ZoneId, container: TokenId) -> Result<Rect, LayoutError> {
        self.containers
            .get(&(zone, container))
            .copied()
            .ok_or(LayoutError::NotRealized)
    }
}
