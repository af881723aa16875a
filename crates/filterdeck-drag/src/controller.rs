#![forbid(unsafe_code)]

//! Drag session controller.
//!
//! The only component with mutable top-level state. It owns the board, the
//! single [`DragSession`], the ghost, the return flight and the fixed-rate
//! ticker, and talks to the host through the collaborator traits.
//!
//! ```text
//! Idle -> Dragging -> Resolving -> Idle
//!                          \-----> Animating -> Idle
//! ```
//!
//! # Invariants
//!
//! 1. At most one session exists. `start_drag` is refused while a drag is
//!    active or a return flight is in the air.
//! 2. The dragged token stays in its origin until a commit moves it; a cancel
//!    only replays visuals.
//! 3. All in-flight state (session, ghost, return flight, hidden source) lives
//!    in one `Option<Active>`; the phase is derived from it.
//! 4. Every path out of `Dragging` runs cleanup: the source is unhidden, the
//!    drag flag and highlights are cleared, the ghost is unmounted and the
//!    ticker stopped. For a cancel, unhide/unmount/stop wait until the flight
//!    lands.
//! 5. Pointer events never advance animation; only [`tick`](DragController::tick)
//!    does.
//! 6. `transition_id` strictly increases across every handler, including
//!    no-ops and [`force_reset`](DragController::force_reset).
//!
//! # Failure Modes
//!
//! No handler returns an error or panics. Collaborator failures are logged at
//! `warn` and skipped; a failed commit becomes a cancel with animation.

use std::time::Duration;

use filterdeck_core::animation::{Animation, FrameClock, FrameTicker};
use filterdeck_core::geometry::Point;
use filterdeck_core::token::{Token, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};
use web_time::Instant;

use crate::board::{Board, TokenSource};
use crate::config::DragConfig;
use crate::ghost::{Ghost, GhostTransform};
use crate::hit_test::{DropTarget, hit_test};
use crate::host::{GhostSurface, ImageLookup, LayoutProbe, NoopHost, PlacementHooks};
use crate::resolver::{self, CancelReason, CommitOutcome, CommitReport, Placement, PlacementNoop};
use crate::return_flight::ReturnFlight;
use crate::rules::PlacementRules;
use crate::zone::{ZoneId, ZoneRole};

// ---- States and effects ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Dragging,
    /// Transient, inside `release`; never reported by `phase()`.
    Resolving,
    /// Return flight in progress.
    Animating,
}

/// Explicit diagnostics for events that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    ReturnInFlight,
    DragInProgress,
    UnknownToken,
    NotDragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started {
        token: TokenId,
        source: TokenSource,
    },
    Hovered {
        target: Option<DropTarget>,
        highlighted: Option<ZoneId>,
    },
    Placed {
        report: CommitReport,
    },
    Discarded {
        report: CommitReport,
    },
    /// Released with nothing to do and nothing to animate.
    Unchanged {
        reason: PlacementNoop,
    },
    Canceled {
        reason: CancelReason,
        /// Whether a return flight was started.
        returning: bool,
    },
    /// The return flight finished and cleanup ran.
    Landed {
        token: TokenId,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One controller step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragPhase,
    pub to: DragPhase,
    pub effect: DragEffect,
}

// ---- Session ----

/// The one in-flight drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    token: Token,
    source: TokenSource,
    press_point: Point,
    pointer: Point,
    previous_pointer: Point,
    grab_offset: Point,
    hover: Option<DropTarget>,
}

impl DragSession {
    /// Snapshot of the dragged token taken at press time.
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }

    #[must_use]
    pub fn source(&self) -> TokenSource {
        self.source
    }

    #[must_use]
    pub fn press_point(&self) -> Point {
        self.press_point
    }

    #[must_use]
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    #[must_use]
    pub fn grab_offset(&self) -> Point {
        self.grab_offset
    }

    #[must_use]
    pub fn hover(&self) -> Option<DropTarget> {
        self.hover
    }

    /// Displacement between the last two pointer samples.
    #[must_use]
    pub fn velocity(&self) -> Point {
        self.pointer - self.previous_pointer
    }

    /// Zone-resident sources are hidden while dragged; templates stay visible.
    #[must_use]
    pub fn hides_source(&self) -> bool {
        matches!(self.source, TokenSource::Zone(_))
    }
}

/// What the controller holds between press and cleanup.
#[derive(Debug)]
enum Active {
    Dragging {
        session: DragSession,
        ghost: Ghost,
    },
    Returning {
        token: TokenId,
        source_hidden: bool,
        ghost: Ghost,
        flight: ReturnFlight,
    },
}

impl Active {
    fn ghost(&self) -> &Ghost {
        match self {
            Self::Dragging { ghost, .. } | Self::Returning { ghost, .. } => ghost,
        }
    }

    fn token(&self) -> TokenId {
        match self {
            Self::Dragging { session, .. } => session.token.id(),
            Self::Returning { token, .. } => *token,
        }
    }

    fn hidden_source(&self) -> Option<TokenId> {
        match self {
            Self::Dragging { session, .. } => session.hides_source().then(|| session.token.id()),
            Self::Returning {
                token, source_hidden, ..
            } => source_hidden.then_some(*token),
        }
    }
}

// ---- Controller ----

pub struct DragController {
    board: Board,
    rules: PlacementRules,
    config: DragConfig,
    images: Box<dyn ImageLookup>,
    surface: Box<dyn GhostSurface>,
    hooks: Box<dyn PlacementHooks>,
    active: Option<Active>,
    ticker: FrameTicker,
    clock: FrameClock,
    overlay_origin: Point,
    transition_counter: u64,
}

impl std::fmt::Debug for DragController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragController")
            .field("phase", &self.phase())
            .field("active", &self.active)
            .field("transition_counter", &self.transition_counter)
            .finish_non_exhaustive()
    }
}

impl DragController {
    /// A controller with no-op collaborators.
    #[must_use]
    pub fn new(board: Board, rules: PlacementRules, config: DragConfig) -> Self {
        let ticker = FrameTicker::new(config.tick_interval())
            .with_max_catch_up(config.max_catch_up_ticks);
        Self {
            board,
            rules,
            config,
            images: Box::new(NoopHost),
            surface: Box::new(NoopHost),
            hooks: Box::new(NoopHost),
            active: None,
            ticker,
            clock: FrameClock::new(),
            overlay_origin: Point::ZERO,
            transition_counter: 0,
        }
    }

    #[must_use]
    pub fn with_images(mut self, images: impl ImageLookup + 'static) -> Self {
        self.images = Box::new(images);
        self
    }

    #[must_use]
    pub fn with_surface(mut self, surface: impl GhostSurface + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: impl PlacementHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Window position of the ghost overlay's top-left corner.
    pub fn set_overlay_origin(&mut self, origin: Point) {
        self.overlay_origin = origin;
    }

    // ---- Queries ----

    #[must_use]
    pub fn phase(&self) -> DragPhase {
        match self.active {
            None => DragPhase::Idle,
            Some(Active::Dragging { .. }) => DragPhase::Dragging,
            Some(Active::Returning { .. }) => DragPhase::Animating,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        match &self.active {
            Some(Active::Dragging { session, .. }) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn ghost(&self) -> Option<&Ghost> {
        self.active.as_ref().map(Active::ghost)
    }

    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.ticker.is_running()
    }

    #[must_use]
    pub fn is_source_hidden(&self, token: TokenId) -> bool {
        self.active.as_ref().and_then(Active::hidden_source) == Some(token)
    }

    #[must_use]
    pub fn is_being_dragged(&self, token: TokenId) -> bool {
        self.session().is_some_and(|session| session.token.id() == token)
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<ZoneId> {
        self.board.highlighted().next()
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable board access, only while idle.
    pub fn board_mut(&mut self) -> Option<&mut Board> {
        self.active.is_none().then_some(&mut self.board)
    }

    #[must_use]
    pub fn rules(&self) -> &PlacementRules {
        &self.rules
    }

    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    // ---- Handlers ----

    /// Press on a token. `token_origin` is the top-left of the token's visual
    /// in window coordinates.
    pub fn start_drag(&mut self, token: TokenId, pointer: Point, token_origin: Point) -> DragTransition {
        let from = self.phase();
        match from {
            DragPhase::Animating => return self.noop(DragNoopReason::ReturnInFlight),
            DragPhase::Dragging | DragPhase::Resolving => {
                return self.noop(DragNoopReason::DragInProgress);
            }
            DragPhase::Idle => {}
        }
        let Some((source, snapshot)) = self.board.locate(token).map(|(s, t)| (s, t.clone())) else {
            debug!(target: "filterdeck.drag", %token, "press on unknown token ignored");
            return self.noop(DragNoopReason::UnknownToken);
        };
        let _span = debug_span!(target: "filterdeck.drag", "drag.start", %token).entered();

        let image = match self.images.lookup(&snapshot) {
            Ok(image) => image,
            Err(error) => {
                warn!(target: "filterdeck.drag", %token, %error, "image lookup failed; ghost drawn without image");
                None
            }
        };
        let home = token_origin - self.overlay_origin;
        let ghost = Ghost::new(&snapshot, image, home, self.config.follower);
        if let Err(error) = self.surface.mount(&ghost.view()) {
            warn!(target: "filterdeck.drag", %token, %error, "ghost mount failed");
        }
        let session = DragSession {
            token: snapshot,
            source,
            press_point: pointer,
            pointer,
            previous_pointer: pointer,
            grab_offset: pointer - token_origin,
            hover: None,
        };
        if session.hides_source() {
            if let Err(error) = self.surface.set_source_hidden(token, true) {
                warn!(target: "filterdeck.drag", %token, %error, "hiding source visual failed");
            }
        }

        self.active = Some(Active::Dragging { session, ghost });
        self.ticker.start();
        self.clock.reset();
        self.transition(from, DragEffect::Started { token, source })
    }

    /// Record the latest pointer sample and refresh highlights.
    pub fn pointer_move(&mut self, pointer: Point, layout: &dyn LayoutProbe) -> DragTransition {
        let from = self.phase();
        let Some(Active::Dragging { session, ghost }) = self.active.as_mut() else {
            return self.noop(DragNoopReason::NotDragging);
        };
        session.previous_pointer = session.pointer;
        session.pointer = pointer;
        ghost.set_target(pointer - session.grab_offset - self.overlay_origin);

        let target = hit_test(&self.board, layout, &session.token, pointer).map(|hit| hit.target);
        session.hover = target;
        let kind = session.token.kind();
        let highlighted = target.map(DropTarget::zone).filter(|&zone| {
            self.board
                .zone(zone)
                .is_some_and(|z| !self.rules.is_restricted(kind, z))
        });
        self.board.set_highlight(highlighted);
        self.transition(from, DragEffect::Hovered { target, highlighted })
    }

    /// Drop. Resolves, commits, and cleans up whatever the outcome.
    pub fn release(&mut self, pointer: Point, layout: &dyn LayoutProbe) -> DragTransition {
        let from = self.phase();
        let Some(Active::Dragging { session, .. }) = self.active.as_mut() else {
            return self.noop(DragNoopReason::NotDragging);
        };
        session.previous_pointer = session.pointer;
        session.pointer = pointer;
        let token = session.token.id();
        let _span = debug_span!(target: "filterdeck.drag", "drag.release", %token).entered();

        let target = hit_test(&self.board, layout, &session.token, pointer).map(|hit| hit.target);
        let placement = resolver::decide(&self.board, &self.rules, &session.token, session.source, target);
        debug!(target: "filterdeck.drag", %token, ?target, ?placement, "placement resolved");

        match placement {
            Placement::Cancel { reason } => {
                if reason == CancelReason::Restricted {
                    debug!(target: "filterdeck.drag", %token, kind = %session.token.kind(), "placement forbidden by rule");
                }
                self.begin_return(from, reason)
            }
            Placement::Noop { reason } => {
                self.cleanup();
                self.transition(from, DragEffect::Unchanged { reason })
            }
            Placement::Discard { .. } | Placement::Place(_) => {
                match resolver::commit(&mut self.board, &placement) {
                    Ok(report) => {
                        self.after_commit(&report);
                        self.cleanup();
                        let effect = match report.outcome {
                            CommitOutcome::Discarded { .. } => DragEffect::Discarded { report },
                            CommitOutcome::Inserted { .. } | CommitOutcome::Merged { .. } => {
                                DragEffect::Placed { report }
                            }
                        };
                        self.transition(from, effect)
                    }
                    Err(error) => {
                        warn!(target: "filterdeck.drag", %token, %error, "commit failed; returning token");
                        self.begin_return(from, CancelReason::CommitFailed)
                    }
                }
            }
        }
    }

    /// Abandon the active drag (Escape, focus loss). Plays the return flight.
    pub fn cancel(&mut self, reason: CancelReason) -> DragTransition {
        let from = self.phase();
        if from != DragPhase::Dragging {
            return self.noop(DragNoopReason::NotDragging);
        }
        debug!(target: "filterdeck.drag", ?reason, "drag canceled");
        self.begin_return(from, reason)
    }

    /// Advance the fixed-rate timer by `dt`. Returns a transition only when a
    /// return flight lands.
    pub fn tick(&mut self, dt: Duration) -> Option<DragTransition> {
        let due = self.ticker.advance(dt);
        let interval = self.ticker.interval();
        for _ in 0..due {
            match self.active.as_mut() {
                Some(Active::Dragging { ghost, .. }) => {
                    let transform = ghost.step();
                    self.push_transform(transform);
                }
                Some(Active::Returning { ghost, flight, .. }) => {
                    flight.tick(interval);
                    let transform = flight.transform();
                    ghost.place(transform);
                    let landed = flight.is_complete();
                    self.push_transform(transform);
                    if landed {
                        return Some(self.land());
                    }
                }
                None => break,
            }
        }
        None
    }

    /// [`tick`](Self::tick) with the delta taken from a clock sample.
    pub fn tick_at(&mut self, now: Instant) -> Option<DragTransition> {
        let dt = self.clock.sample(now);
        self.tick(dt)
    }

    /// Unconditionally return to `Idle`, clearing every flag and visual.
    ///
    /// Safety valve for teardown paths. Returns `None` when nothing was
    /// active.
    pub fn force_reset(&mut self) -> Option<DragTransition> {
        if self.active.is_none() {
            return None;
        }
        let from = self.phase();
        debug!(target: "filterdeck.drag", ?from, "forced reset");
        self.cleanup();
        Some(self.transition(
            from,
            DragEffect::Canceled {
                reason: CancelReason::Reset,
                returning: false,
            },
        ))
    }

    // ---- Internals ----

    fn begin_return(&mut self, from: DragPhase, reason: CancelReason) -> DragTransition {
        self.board.clear_highlights();
        let Some(Active::Dragging { session, ghost }) = self.active.take() else {
            self.cleanup();
            return self.transition(from, DragEffect::Canceled { reason, returning: false });
        };
        let flight = ReturnFlight::new(ghost.transform(), ghost.home(), self.config.return_duration());
        self.active = Some(Active::Returning {
            token: session.token.id(),
            source_hidden: session.hides_source(),
            ghost,
            flight,
        });
        self.ticker.start();
        self.transition(from, DragEffect::Canceled { reason, returning: true })
    }

    fn land(&mut self) -> DragTransition {
        let token = self.active.as_ref().map_or(TokenId::MIN, Active::token);
        let from = self.phase();
        self.cleanup();
        self.transition(from, DragEffect::Landed { token })
    }

    fn after_commit(&mut self, report: &CommitReport) {
        if let Err(error) = self.hooks.persist(&self.board) {
            warn!(target: "filterdeck.drag", %error, "persist hook failed");
        }
        let entry = match report.outcome {
            CommitOutcome::Inserted { entry } => entry,
            CommitOutcome::Merged { into, .. } => into,
            CommitOutcome::Discarded { .. } => return,
        };
        let to_favorites = self
            .board
            .zone(report.zone)
            .is_some_and(|z| z.role() == ZoneRole::Favorite);
        if !to_favorites {
            return;
        }
        if let Some((_, token)) = self.board.locate(entry) {
            if let Err(error) = self.hooks.favorite_added(token) {
                warn!(target: "filterdeck.drag", %entry, %error, "favorite hook failed");
            }
        }
    }

    fn push_transform(&mut self, transform: GhostTransform) {
        if let Err(error) = self.surface.update(transform) {
            warn!(target: "filterdeck.drag", %error, "ghost update failed");
        }
    }

    fn cleanup(&mut self) {
        if let Some(active) = self.active.take() {
            if let Some(token) = active.hidden_source() {
                if let Err(error) = self.surface.set_source_hidden(token, false) {
                    warn!(target: "filterdeck.drag", %token, %error, "unhiding source visual failed");
                }
            }
            if let Err(error) = self.surface.unmount() {
                warn!(target: "filterdeck.drag", %error, "ghost unmount failed");
            }
        }
        self.board.clear_highlights();
        self.ticker.stop();
        self.clock.reset();
    }

    fn noop(&mut self, reason: DragNoopReason) -> DragTransition {
        let phase = self.phase();
        self.transition(phase, DragEffect::Noop { reason })
    }

    fn transition(&mut self, from: DragPhase, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.phase(),
            effect,
        };
        debug!(
            target: "filterdeck.drag",
            transition_id = transition.transition_id,
            from = ?transition.from,
            to = ?transition.to,
            effect = ?transition.effect,
            "drag transition"
        );
        transition
    }
}

impl Drop for DragController {
    fn drop(&mut self) {
        if let Some(transition) = self.force_reset() {
            debug!(target: "filterdeck.drag", from = ?transition.from, "controller dropped mid-drag");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::{HookError, LookupError, SurfaceError};
    use crate::ghost::GhostView;
    use crate::host::{ImageHandle, StaticLayout};
    use crate::rules::ContainerCaps;
    use crate::zone::ZoneSpec;
    use filterdeck_core::geometry::Rect;
    use filterdeck_core::token::TokenKind;

    const FRAME: Duration = Duration::from_micros(16_667);

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Mount(TokenId),
        Update,
        Unmount,
        Hidden(TokenId, bool),
    }

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<Call>>>,
        fail: bool,
    }

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.calls
                .borrow()
                .iter()
                .filter(|c| **c != Call::Update)
                .cloned()
                .collect()
        }

        fn result(&self) -> Result<(), SurfaceError> {
            if self.fail {
                Err(SurfaceError::new("surface", "overlay detached"))
            } else {
                Ok(())
            }
        }
    }

    impl GhostSurface for Recorder {
        fn mount(&mut self, ghost: &GhostView) -> Result<(), SurfaceError> {
            self.calls.borrow_mut().push(Call::Mount(ghost.token));
            self.result()
        }

        fn update(&mut self, _transform: GhostTransform) -> Result<(), SurfaceError> {
            self.calls.borrow_mut().push(Call::Update);
            self.result()
        }

        fn unmount(&mut self) -> Result<(), SurfaceError> {
            self.calls.borrow_mut().push(Call::Unmount);
            self.result()
        }

        fn set_source_hidden(&mut self, token: TokenId, hidden: bool) -> Result<(), SurfaceError> {
            self.calls.borrow_mut().push(Call::Hidden(token, hidden));
            self.result()
        }
    }

    #[derive(Clone, Default)]
    struct Hooks {
        persisted: Rc<RefCell<usize>>,
        favorites: Rc<RefCell<Vec<TokenKind>>>,
    }

    impl PlacementHooks for Hooks {
        fn persist(&mut self, _board: &Board) -> Result<(), HookError> {
            *self.persisted.borrow_mut() += 1;
            Err(HookError::new("persist", "read-only filesystem"))
        }

        fn favorite_added(&mut self, token: &Token) -> Result<(), HookError> {
            self.favorites.borrow_mut().push(token.kind().clone());
            Ok(())
        }
    }

    struct BrokenImages;

    impl ImageLookup for BrokenImages {
        fn lookup(&self, token: &Token) -> Result<Option<ImageHandle>, LookupError> {
            Err(LookupError {
                key: token.kind().to_string(),
                message: "atlas missing".into(),
            })
        }
    }

    struct Setup {
        controller: DragController,
        layout: StaticLayout,
        surface: Recorder,
        must: ZoneId,
        should: ZoneId,
        favs: ZoneId,
    }

    fn setup_with(surface: Recorder) -> Setup {
        let mut board = Board::new();
        let must = board.add_zone(ZoneSpec::categorized("Must")).unwrap();
        let should = board.add_zone(ZoneSpec::categorized("Should")).unwrap();
        let favs = board.add_zone(ZoneSpec::new("Favs", ZoneRole::Favorite)).unwrap();
        board.add_template(TokenKind::new("Joker", "Blueprint")).unwrap();
        let layout = StaticLayout::new()
            .zone(must, Rect::new(0.0, 0.0, 100.0, 100.0))
            .zone(should, Rect::new(0.0, 200.0, 100.0, 100.0))
            .zone(favs, Rect::new(300.0, 0.0, 50.0, 50.0));
        let controller = DragController::new(board, PlacementRules::new(), DragConfig::default())
            .with_surface(surface.clone());
        Setup {
            controller,
            layout,
            surface,
            must,
            should,
            favs,
        }
    }

    fn setup() -> Setup {
        setup_with(Recorder::default())
    }

    fn template_id(c: &DragController) -> TokenId {
        c.board().palette().iter().next().unwrap().id()
    }

    fn place(controller: &mut DragController, zone: ZoneId) -> TokenId {
        controller
            .board_mut()
            .unwrap()
            .place_new(zone, TokenKind::new("Joker", "Cavendish"))
            .unwrap()
    }

    #[test]
    fn palette_drag_keeps_template_visible() {
        let mut s = setup();
        let t = template_id(&s.controller);
        let tr = s.controller.start_drag(t, Point::new(510.0, 20.0), Point::new(500.0, 10.0));
        assert_eq!(tr.to, DragPhase::Dragging);
        assert!(matches!(tr.effect, DragEffect::Started { source: TokenSource::Palette, .. }));
        assert!(!s.controller.is_source_hidden(t));
        assert!(s.controller.is_being_dragged(t));
        assert!(s.controller.is_timer_running());
        assert_eq!(s.surface.calls(), [Call::Mount(t)]);
    }

    #[test]
    fn zone_drag_hides_source() {
        let mut s = setup();
        let id = place(&mut s.controller, s.must);
        s.controller.start_drag(id, Point::new(10.0, 10.0), Point::new(5.0, 5.0));
        assert!(s.controller.is_source_hidden(id));
        assert_eq!(s.surface.calls(), [Call::Mount(id), Call::Hidden(id, true)]);
    }

    #[test]
    fn second_press_is_refused() {
        let mut s = setup();
        let t = template_id(&s.controller);
        s.controller.start_drag(t, Point::ZERO, Point::ZERO);
        let tr = s.controller.start_drag(t, Point::ZERO, Point::ZERO);
        assert_eq!(
            tr.effect,
            DragEffect::Noop {
                reason: DragNoopReason::DragInProgress
            }
        );
    }

    #[test]
    fn unknown_token_is_ignored() {
        let mut s = setup();
        let tr = s
            .controller
            .start_drag(TokenId::new(9999).unwrap(), Point::ZERO, Point::ZERO);
        assert_eq!(tr.to, DragPhase::Idle);
        assert_eq!(
            tr.effect,
            DragEffect::Noop {
                reason: DragNoopReason::UnknownToken
            }
        );
    }

    #[test]
    fn pointer_moves_do_not_advance_the_ghost() {
        let mut s = setup();
        let t = template_id(&s.controller);
        s.controller.set_overlay_origin(Point::new(100.0, 0.0));
        s.controller.start_drag(t, Point::new(510.0, 20.0), Point::new(500.0, 10.0));
        let home = s.controller.ghost().unwrap().position();
        assert_eq!(home, Point::new(400.0, 10.0));

        s.controller.pointer_move(Point::new(60.0, 50.0), &s.layout);
        let ghost = s.controller.ghost().unwrap();
        assert_eq!(ghost.position(), home);
        assert_eq!(ghost.target(), Point::new(60.0 - 10.0 - 100.0, 50.0 - 10.0));

        s.controller.tick(FRAME);
        assert_ne!(s.controller.ghost().unwrap().position(), home);
    }

    #[test]
    fn hover_highlights_only_the_winner() {
        let mut s = setup();
        let t = template_id(&s.controller);
        s.controller.start_drag(t, Point::ZERO, Point::ZERO);
        let tr = s.controller.pointer_move(Point::new(50.0, 250.0), &s.layout);
        assert_eq!(
            tr.effect,
            DragEffect::Hovered {
                target: Some(DropTarget::Zone { zone: s.should }),
                highlighted: Some(s.should)
            }
        );
        assert_eq!(s.controller.highlighted(), Some(s.should));

        s.controller.pointer_move(Point::new(900.0, 900.0), &s.layout);
        assert_eq!(s.controller.highlighted(), None);
    }

    #[test]
    fn release_on_zone_places_and_cleans_up() {
        let mut s = setup();
        let t = template_id(&s.controller);
        s.controller.start_drag(t, Point::ZERO, Point::ZERO);
        let tr = s.controller.release(Point::new(50.0, 50.0), &s.layout);
        assert_eq!((tr.from, tr.to), (DragPhase::Dragging, DragPhase::Idle));
        assert!(matches!(tr.effect, DragEffect::Placed { .. }));
        assert_eq!(s.controller.board().zone(s.must).unwrap().len(), 1);
        assert!(!s.controller.is_timer_running());
        assert!(s.controller.ghost().is_none());
        assert!(!s.controller.is_being_dragged(t));
    }

    #[test]
    fn cancel_flies_home_then_lands() {
        let mut s = setup();
        let id = place(&mut s.controller, s.must);
        s.controller.start_drag(id, Point::new(10.0, 10.0), Point::new(0.0, 0.0));
        s.controller.pointer_move(Point::new(800.0, 600.0), &s.layout);
        for _ in 0..10 {
            s.controller.tick(FRAME);
        }

        let tr = s.controller.release(Point::new(800.0, 600.0), &s.layout);
        assert_eq!(tr.to, DragPhase::Animating);
        assert!(s.controller.is_source_hidden(id));
        assert!(!s.controller.is_being_dragged(id));
        assert!(s.controller.session().is_none());
        assert!(s.controller.ghost().is_some());

        let refused = s.controller.start_drag(id, Point::ZERO, Point::ZERO);
        assert_eq!(
            refused.effect,
            DragEffect::Noop {
                reason: DragNoopReason::ReturnInFlight
            }
        );

        let mut landed = None;
        for _ in 0..11 {
            if let Some(tr) = s.controller.tick(FRAME) {
                landed = Some(tr);
            }
        }
        assert!(landed.is_none());
        let landed = s.controller.tick(FRAME).unwrap();
        assert_eq!(landed.effect, DragEffect::Landed { token: id });
        assert_eq!(s.controller.phase(), DragPhase::Idle);
        assert!(!s.controller.is_source_hidden(id));
        assert_eq!(s.controller.board().zone(s.must).unwrap().tokens()[0].id(), id);
        assert_eq!(
            s.surface.calls(),
            [
                Call::Mount(id),
                Call::Hidden(id, true),
                Call::Hidden(id, false),
                Call::Unmount
            ]
        );
    }

    #[test]
    fn same_zone_release_needs_no_animation() {
        let mut s = setup();
        let id = place(&mut s.controller, s.must);
        s.controller.start_drag(id, Point::new(10.0, 10.0), Point::ZERO);
        let tr = s.controller.release(Point::new(20.0, 20.0), &s.layout);
        assert_eq!(
            tr.effect,
            DragEffect::Unchanged {
                reason: PlacementNoop::SameZone
            }
        );
        assert_eq!(tr.to, DragPhase::Idle);
        assert!(!s.controller.is_source_hidden(id));
    }

    #[test]
    fn escape_cancel_animates() {
        let mut s = setup();
        let t = template_id(&s.controller);
        s.controller.start_drag(t, Point::ZERO, Point::ZERO);
        let tr = s.controller.cancel(CancelReason::Escape);
        assert_eq!(
            tr.effect,
            DragEffect::Canceled {
                reason: CancelReason::Escape,
                returning: true
            }
        );
        assert_eq!(s.controller.cancel(CancelReason::Escape).to, DragPhase::Animating);
    }

    #[test]
    fn force_reset_interrupts_flight() {
        let mut s = setup();
        let id = place(&mut s.controller, s.must);
        s.controller.start_drag(id, Point::ZERO, Point::ZERO);
        s.controller.cancel(CancelReason::FocusLost);
        let tr = s.controller.force_reset().unwrap();
        assert_eq!((tr.from, tr.to), (DragPhase::Animating, DragPhase::Idle));
        assert!(!s.controller.is_source_hidden(id));
        assert!(!s.controller.is_timer_running());
        assert!(s.controller.force_reset().is_none());
    }

    #[test]
    fn transition_ids_increase_through_noops() {
        let mut s = setup();
        let a = s.controller.pointer_move(Point::ZERO, &s.layout);
        let b = s.controller.release(Point::ZERO, &s.layout);
        let t = template_id(&s.controller);
        let c = s.controller.start_drag(t, Point::ZERO, Point::ZERO);
        let d = s.controller.force_reset().unwrap();
        assert!(a.transition_id < b.transition_id);
        assert!(b.transition_id < c.transition_id);
        assert!(c.transition_id < d.transition_id);
    }

    #[test]
    fn dropping_controller_mid_drag_unmounts() {
        let s = setup();
        let surface = s.surface.clone();
        let mut controller = s.controller;
        let t = template_id(&controller);
        controller.start_drag(t, Point::ZERO, Point::ZERO);
        drop(controller);
        assert_eq!(surface.calls(), [Call::Mount(t), Call::Unmount]);
    }

    #[test]
    fn board_is_locked_during_a_drag() {
        let mut s = setup();
        let t = template_id(&s.controller);
        s.controller.start_drag(t, Point::ZERO, Point::ZERO);
        assert!(s.controller.board_mut().is_none());
    }

    #[test]
    fn collaborator_failures_never_block_cleanup() {
        let mut s = setup_with(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let id = place(&mut s.controller, s.must);
        let mut controller = std::mem::replace(
            &mut s.controller,
            DragController::new(Board::new(), PlacementRules::new(), DragConfig::default()),
        )
        .with_images(BrokenImages);
        controller.start_drag(id, Point::ZERO, Point::ZERO);
        assert!(controller.ghost().unwrap().image().is_none());
        let tr = controller.release(Point::new(50.0, 250.0), &s.layout);
        assert!(matches!(tr.effect, DragEffect::Placed { .. }));
        assert_eq!(controller.phase(), DragPhase::Idle);
        assert!(!controller.is_source_hidden(id));
    }

    #[test]
    fn favorite_hook_fires_and_hook_errors_are_swallowed() {
        let mut s = setup();
        let hooks = Hooks::default();
        let mut controller = std::mem::replace(
            &mut s.controller,
            DragController::new(Board::new(), PlacementRules::new(), DragConfig::default()),
        )
        .with_hooks(hooks.clone());
        let t = template_id(&controller);
        controller.start_drag(t, Point::ZERO, Point::ZERO);
        let tr = controller.release(Point::new(310.0, 10.0), &s.layout);
        assert!(matches!(tr.effect, DragEffect::Placed { report } if report.zone == s.favs));
        assert_eq!(*hooks.persisted.borrow(), 1);
        assert_eq!(hooks.favorites.borrow().len(), 1);
    }

    #[test]
    fn favorite_hook_fires_for_merges_into_favorites() {
        let pack = TokenKind::new("Group", "Pack");
        let mut board = Board::new();
        let must = board.add_zone(ZoneSpec::categorized("Must")).unwrap();
        let favs = board.add_zone(ZoneSpec::new("Favs", ZoneRole::Favorite)).unwrap();
        let resident = board
            .place_new_container(favs, pack.clone(), [TokenKind::new("Joker", "A")])
            .unwrap();
        let dragged = board
            .place_new_container(must, pack.clone(), [TokenKind::new("Joker", "B")])
            .unwrap();
        let layout = StaticLayout::new()
            .zone(must, Rect::new(0.0, 0.0, 100.0, 100.0))
            .zone(favs, Rect::new(300.0, 0.0, 50.0, 50.0));
        let rules = PlacementRules::new().container(pack.clone(), ContainerCaps::MERGEABLE);
        let hooks = Hooks::default();
        let mut controller = DragController::new(board, rules, DragConfig::default()).with_hooks(hooks.clone());

        controller.start_drag(dragged, Point::new(10.0, 10.0), Point::ZERO);
        let tr = controller.release(Point::new(310.0, 10.0), &layout);
        assert!(matches!(
            tr.effect,
            DragEffect::Placed { report } if report.outcome == CommitOutcome::Merged { into: resident, children: 1 }
        ));
        assert_eq!(*hooks.favorites.borrow(), [pack]);
    }

    #[test]
    fn session_and_flight_share_one_slot() {
        let mut s = setup();
        let id = place(&mut s.controller, s.must);
        s.controller.start_drag(id, Point::ZERO, Point::ZERO);
        assert_eq!(s.controller.session().map(|d| d.token().id()), Some(id));
        assert!(s.controller.session().unwrap().hides_source());

        s.controller.cancel(CancelReason::Escape);
        assert_eq!(s.controller.phase(), DragPhase::Animating);
        assert!(s.controller.session().is_none());
        assert!(s.controller.is_source_hidden(id));

        s.controller.force_reset();
        assert_eq!(s.controller.phase(), DragPhase::Idle);
        assert!(s.controller.ghost().is_none());
        assert!(!s.controller.is_source_hidden(id));
        assert!(s.controller.board_mut().is_some());
    }

    #[test]
    fn transitions_serialize_as_tagged_json() {
        let mut s = setup();
        let t = template_id(&s.controller);
        let tr = s.controller.start_drag(t, Point::ZERO, Point::ZERO);
        let json = serde_json::to_string(&tr).unwrap();
        assert!(json.contains("\"effect\":\"started\""));
        assert!(json.contains("\"source\":\"palette\""));
        assert!(json.contains("\"to\":\"dragging\""));
    }
}
