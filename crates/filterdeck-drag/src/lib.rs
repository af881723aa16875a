#![forbid(unsafe_code)]

//! Drag-and-drop placement engine.
//!
//! # Role in filterdeck
//! `filterdeck-drag` turns raw pointer samples into committed board edits.
//! Native platform drag-and-drop is bypassed; the host forwards press, move
//! and release events plus a periodic tick, and supplies live geometry.
//!
//! # Primary responsibilities
//! - **Zones and board**: typed destinations with accept policies, the
//!   template palette, and token lookup.
//! - **Hit testing**: priority-ordered target resolution against live bounds.
//! - **Resolution**: move/copy/merge decisions and their atomic commit.
//! - **Controller**: the drag state machine, ghost follower, return flight,
//!   and guaranteed cleanup.
//!
//! # Example
//!
//! ```
//! use filterdeck_core::geometry::{Point, Rect};
//! use filterdeck_core::token::TokenKind;
//! use filterdeck_drag::{Board, DragConfig, DragController, DragEffect, PlacementRules, StaticLayout, ZoneSpec};
//!
//! let mut board = Board::new();
//! let must = board.add_zone(ZoneSpec::categorized("Must")).unwrap();
//! let template = board.add_template(TokenKind::new("Joker", "Blueprint")).unwrap();
//! let layout = StaticLayout::new().zone(must, Rect::new(0.0, 0.0, 200.0, 100.0));
//!
//! let mut drag = DragController::new(board, PlacementRules::new(), DragConfig::default());
//! drag.start_drag(template, Point::new(410.0, 20.0), Point::new(400.0, 10.0));
//! drag.pointer_move(Point::new(50.0, 50.0), &layout);
//! let done = drag.release(Point::new(50.0, 50.0), &layout);
//!
//! assert!(matches!(done.effect, DragEffect::Placed { .. }));
//! assert_eq!(drag.board().zone(must).unwrap().len(), 1);
//! ```

pub mod board;
pub mod config;
pub mod controller;
pub mod error;
pub mod ghost;
pub mod host;
pub mod palette;
pub mod resolver;
pub mod return_flight;
pub mod rules;
pub mod zone;

pub use board::{Board, Origin, StagingSlot, TokenSource};
pub use config::DragConfig;
pub use controller::{DragController, DragEffect, DragNoopReason, DragPhase, DragSession, DragTransition};
pub use error::{DragError, HookError, LayoutError, LookupError, Result, SurfaceError};
pub use ghost::{Ghost, GhostTransform, GhostView};
pub use hit_test::{DropTarget, Hit, HitTier, hit_test};
pub use host::{GhostSurface, ImageHandle, ImageLookup, LayoutProbe, NoopHost, PlacementHooks, StaticLayout};
pub use palette::Palette;
pub use resolver::{
    CancelReason, CommitOutcome, CommitReport, Destination, Placement, PlacementNoop, PlacementPlan, commit, decide,
};
pub use return_flight::ReturnFlight;
pub use rules::{ContainerCaps, PlacementRules, Restriction};
pub use zone::{AcceptPolicy, Zone, ZoneId, ZoneRole, ZoneSpec};
