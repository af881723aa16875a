#![forbid(unsafe_code)]

//! Scripted drag sessions.
//!
//! A script is a JSON document describing a board (zones with their bounds,
//! palette templates, resident tokens, staged children), optional tuning and
//! rules, and a list of pointer steps. Running it replays the steps through a
//! [`DragController`] with a fixed frame clock, so output is deterministic.
//!
//! ```json
//! {
//!   "zones": [{"name": "Must", "role": "categorized", "rect": {"x": 0, "y": 0, "width": 300, "height": 100}}],
//!   "templates": ["Joker:Blueprint"],
//!   "steps": [
//!     {"op": "press", "token": {"template": "Joker:Blueprint"}, "at": {"x": 400, "y": 20}},
//!     {"op": "release", "at": {"x": 50, "y": 50}},
//!     {"op": "expect", "zone": "Must", "count": 1}
//!   ]
//! }
//! ```
//!
//! # Failure Modes
//!
//! - Malformed JSON, unknown zone names and out-of-range token references are
//!   [`HarnessError::Script`] errors and stop the run.
//! - `expect` steps that do not hold are collected as failures; the run
//!   continues.

use std::path::Path;
use std::time::Duration;

use filterdeck_core::geometry::{Point, Rect};
use filterdeck_core::token::{Token, TokenId, TokenKind};
use filterdeck_drag::{
    Board, CancelReason, DragConfig, DragController, DragPhase, DragTransition, PlacementRules, StaticLayout,
    ZoneId, ZoneRole, ZoneSpec,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use crate::error::{HarnessError, Result};

/// Upper bound on `settle`, in seconds of simulated time.
const SETTLE_LIMIT_SECS: u32 = 10;

// ---- Document ----

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub config: DragConfig,
    #[serde(default)]
    pub rules: PlacementRules,
    pub zones: Vec<ZoneEntry>,
    #[serde(default)]
    pub templates: Vec<TokenKind>,
    #[serde(default)]
    pub placed: Vec<Resident>,
    /// Children collected into the staging container before the run.
    #[serde(default)]
    pub staged: Vec<TokenKind>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneEntry {
    #[serde(flatten)]
    pub spec: ZoneSpec,
    /// Bounds; a zone without one is never hit.
    #[serde(default)]
    pub rect: Option<Rect>,
    /// Kind of the staging container. Staging zones only.
    #[serde(default)]
    pub staging_kind: Option<TokenKind>,
}

/// A token on the board before the run. Listing `children` makes it a
/// container.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resident {
    pub zone: String,
    pub kind: TokenKind,
    #[serde(default)]
    pub children: Option<Vec<TokenKind>>,
    /// Container bounds inside the zone.
    #[serde(default)]
    pub rect: Option<Rect>,
}

/// How a `press` names its token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenRef {
    Template(TokenKind),
    Resident { zone: String, index: usize },
    Staging,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Press {
        token: TokenRef,
        at: Point,
        /// Top-left of the token's visual; defaults to the press point.
        #[serde(default)]
        origin: Option<Point>,
    },
    Move {
        at: Point,
    },
    Release {
        at: Point,
    },
    Cancel {
        #[serde(default = "escape")]
        reason: CancelReason,
    },
    Tick {
        #[serde(default = "one")]
        frames: u32,
    },
    /// Tick until the controller is idle.
    Settle,
    Expect(Expectation),
}

fn escape() -> CancelReason {
    CancelReason::Escape
}

fn one() -> u32 {
    1
}

/// Checks against one zone. Unset fields are not checked.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    pub zone: String,
    #[serde(default)]
    pub count: Option<usize>,
    /// Kinds of the top-level entries, in order.
    #[serde(default)]
    pub kinds: Option<Vec<TokenKind>>,
    /// Kinds of the children of entry `index`.
    #[serde(default)]
    pub children: Option<Vec<TokenKind>>,
    #[serde(default)]
    pub index: usize,
}

// ---- Output ----

#[derive(Debug, Clone, Serialize)]
pub struct ZoneDump {
    pub name: String,
    pub role: ZoneRole,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(skip)]
    pub transitions: Vec<DragTransition>,
    pub zones: Vec<ZoneDump>,
    pub palette: Vec<TokenKind>,
    pub failures: Vec<String>,
}

// ---- Loading ----

impl Script {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| HarnessError::script(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| HarnessError::script(format!("{}: {e}", path.display())))
    }

    /// Build the board, layout and controller described by the script.
    pub fn build(&self) -> Result<Session> {
        let mut board = Board::new();
        let mut layout = StaticLayout::new();

        for entry in &self.zones {
            let id = match (&entry.staging_kind, entry.spec.role) {
                (Some(kind), ZoneRole::Staging) => board.add_staging_zone(entry.spec.name.clone(), kind.clone())?,
                (Some(_), _) => {
                    return Err(HarnessError::script(format!(
                        "zone {:?}: staging_kind needs role \"staging\"",
                        entry.spec.name
                    )));
                }
                (None, _) => board.add_zone(entry.spec.clone())?,
            };
            if let Some(rect) = entry.rect {
                layout.set_zone(id, rect);
            }
        }
        for kind in &self.templates {
            board.add_template(kind.clone())?;
        }
        for resident in &self.placed {
            let zone = zone_named(&board, &resident.zone)?;
            let id = match &resident.children {
                Some(children) => board.place_new_container(zone, resident.kind.clone(), children.iter().cloned())?,
                None => board.place_new(zone, resident.kind.clone())?,
            };
            if let Some(rect) = resident.rect {
                layout = layout.container(zone, id, rect);
            }
        }
        for kind in &self.staged {
            board.stage(kind.clone())?;
        }

        let errors = self.config.validate();
        if !errors.is_empty() {
            return Err(HarnessError::script(format!("config: {}", errors.join("; "))));
        }
        let frame = self.config.tick_interval();
        let settle_limit = self.config.tick_hz.max(1).saturating_mul(SETTLE_LIMIT_SECS);
        Ok(Session {
            drag: DragController::new(board, self.rules.clone(), self.config.clone()),
            layout,
            frame,
            settle_limit,
        })
    }

    /// Build and replay every step.
    pub fn run(&self) -> Result<RunReport> {
        let mut session = self.build()?;
        let mut transitions = Vec::new();
        let mut failures = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            let _span = info_span!("script.step", index).entered();
            session.apply(step, &mut transitions, &mut failures)?;
        }
        Ok(session.report(transitions, failures))
    }
}

fn zone_named(board: &Board, name: &str) -> Result<ZoneId> {
    board
        .zone_by_name(name)
        .map(|z| z.id())
        .ok_or_else(|| HarnessError::script(format!("unknown zone {name:?}")))
}

// ---- Session ----

/// A built script: controller, bounds and frame clock.
#[derive(Debug)]
pub struct Session {
    drag: DragController,
    layout: StaticLayout,
    frame: Duration,
    settle_limit: u32,
}

impl Session {
    #[must_use]
    pub fn controller(&self) -> &DragController {
        &self.drag
    }

    pub fn apply(
        &mut self,
        step: &Step,
        transitions: &mut Vec<DragTransition>,
        failures: &mut Vec<String>,
    ) -> Result<()> {
        match step {
            Step::Press { token, at, origin } => {
                let id = self.resolve(token)?;
                transitions.push(self.drag.start_drag(id, *at, origin.unwrap_or(*at)));
            }
            Step::Move { at } => transitions.push(self.drag.pointer_move(*at, &self.layout)),
            Step::Release { at } => transitions.push(self.drag.release(*at, &self.layout)),
            Step::Cancel { reason } => transitions.push(self.drag.cancel(*reason)),
            Step::Tick { frames } => {
                for _ in 0..*frames {
                    transitions.extend(self.drag.tick(self.frame));
                }
            }
            Step::Settle => {
                let mut frames = 0;
                while self.drag.phase() != DragPhase::Idle && frames < self.settle_limit {
                    transitions.extend(self.drag.tick(self.frame));
                    frames += 1;
                }
                debug!(frames, phase = ?self.drag.phase(), "settled");
            }
            Step::Expect(expectation) => failures.extend(self.check(expectation)?),
        }
        Ok(())
    }

    fn resolve(&self, token: &TokenRef) -> Result<TokenId> {
        let board = self.drag.board();
        match token {
            TokenRef::Template(kind) => board
                .palette()
                .template_of(kind)
                .map(Token::id)
                .ok_or_else(|| HarnessError::script(format!("no template {kind}"))),
            TokenRef::Resident { zone, index } => {
                let zone_id = zone_named(board, zone)?;
                board
                    .zone(zone_id)
                    .and_then(|z| z.tokens().get(*index))
                    .map(Token::id)
                    .ok_or_else(|| HarnessError::script(format!("zone {zone:?} has no entry {index}")))
            }
            TokenRef::Staging => board
                .staging_container_id()
                .ok_or_else(|| HarnessError::script("no staging zone")),
        }
    }

    fn check(&self, expect: &Expectation) -> Result<Vec<String>> {
        let board = self.drag.board();
        let id = zone_named(board, &expect.zone)?;
        let tokens = board.zone(id).map(|z| z.tokens()).unwrap_or_default();
        let mut failures = Vec::new();
        let name = &expect.zone;

        if let Some(count) = expect.count {
            if tokens.len() != count {
                failures.push(format!("{name}: expected {count} entries, found {}", tokens.len()));
            }
        }
        if let Some(kinds) = &expect.kinds {
            let found: Vec<&TokenKind> = tokens.iter().map(Token::kind).collect();
            if found.iter().copied().ne(kinds.iter()) {
                failures.push(format!("{name}: expected kinds {}, found {}", list(kinds), list(found)));
            }
        }
        if let Some(children) = &expect.children {
            match tokens.get(expect.index) {
                Some(entry) => {
                    let found: Vec<&TokenKind> = entry.children().iter().map(Token::kind).collect();
                    if found.iter().copied().ne(children.iter()) {
                        failures.push(format!(
                            "{name}[{}]: expected children {}, found {}",
                            expect.index,
                            list(children),
                            list(found)
                        ));
                    }
                }
                None => failures.push(format!("{name}: no entry {}", expect.index)),
            }
        }
        Ok(failures)
    }

    #[must_use]
    pub fn report(&self, transitions: Vec<DragTransition>, failures: Vec<String>) -> RunReport {
        let board = self.drag.board();
        RunReport {
            transitions,
            zones: board
                .zones()
                .iter()
                .map(|z| ZoneDump {
                    name: z.name().to_owned(),
                    role: z.role(),
                    tokens: z.tokens().to_vec(),
                })
                .collect(),
            palette: board.palette().iter().map(|t| t.kind().clone()).collect(),
            failures,
        }
    }
}

fn list<T: std::fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let items: Vec<String> = items.into_iter().map(|k| k.to_string()).collect();
    format!("[{}]", items.join(", "))
}
