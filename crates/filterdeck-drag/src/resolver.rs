#![forbid(unsafe_code)]

//! Placement resolution: move, copy, merge or nothing.
//!
//! Resolution is split in two. [`decide`] is a pure function of the board,
//! the rules, the dragged token snapshot, where it came from and what it was
//! dropped on; it never sees the pointer. [`commit`] applies the decision.
//!
//! # Decision order
//!
//! ```text
//! no target                      -> Cancel(NoTarget)
//! Return zone, token from a zone -> Discard
//! Return zone, palette template  -> Noop(NeverResident)
//! target zone == source zone     -> Noop(SameZone)
//! zone rejects the token         -> Cancel(Rejected)
//! kind restricted in the zone    -> Cancel(Restricted)
//! any token on the staging zone  -> into the staging container
//! container token                -> merge | beside hit container | append
//! plain token                    -> into container | append
//! ```
//!
//! # Invariants
//!
//! 1. Palette templates are never moved; placing one inserts a duplicate.
//! 2. The staging container is never removed. Dragging it places a duplicate
//!    and empties the original after the commit succeeds.
//! 3. Any other zone-resident token is moved as itself: same id, no copy.
//! 4. Merging appends children in order without deduplication.
//!
//! # Failure Modes
//!
//! [`commit`] validates every id it needs before touching the board. On error
//! the board is unchanged.

use filterdeck_core::token::{Token, TokenId};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Origin, TokenSource};
use crate::error::{DragError, Result};
use crate::hit_test::DropTarget;
use crate::rules::PlacementRules;
use crate::zone::{ZoneId, ZoneRole};

// ---- Decision types ----

/// Why a drop animates back instead of landing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Released over nothing.
    NoTarget,
    /// The zone's accept policy refused the token.
    Rejected,
    /// A placement rule forbids the token's kind in the zone.
    Restricted,
    /// The commit failed; the board was left untouched.
    CommitFailed,
    /// Escape or an explicit host cancel.
    Escape,
    /// The window lost focus or pointer capture.
    FocusLost,
    /// Hard reset; no animation.
    Reset,
}

/// Why a release changed nothing and needs no animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementNoop {
    /// Dropped back onto the zone it came from.
    SameZone,
    /// A palette template dropped on the return zone.
    NeverResident,
}

/// Where in the target zone the entry goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "at", content = "container", rename_all = "snake_case")]
pub enum Destination {
    Append,
    /// Pushed onto a container's children.
    IntoContainer(TokenId),
    /// Inserted after a top-level container.
    Beside(TokenId),
    /// The dropped container's children are appended to a resident one.
    MergeInto(TokenId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementPlan {
    pub token: TokenId,
    pub source: TokenSource,
    pub zone: ZoneId,
    pub destination: Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "placement", rename_all = "snake_case")]
pub enum Placement {
    Cancel { reason: CancelReason },
    Noop { reason: PlacementNoop },
    Discard { token: TokenId, origin: Origin },
    Place(PlacementPlan),
}

// ---- Decision ----

/// Decide what a release means.
#[must_use]
pub fn decide(
    board: &Board,
    rules: &PlacementRules,
    token: &Token,
    source: TokenSource,
    target: Option<DropTarget>,
) -> Placement {
    let Some(target) = target else {
        return Placement::Cancel {
            reason: CancelReason::NoTarget,
        };
    };
    let Some(zone) = board.zone(target.zone()) else {
        return Placement::Cancel {
            reason: CancelReason::NoTarget,
        };
    };

    if zone.role() == ZoneRole::Return {
        return match source {
            TokenSource::Zone(origin) => Placement::Discard {
                token: token.id(),
                origin,
            },
            TokenSource::Palette => Placement::Noop {
                reason: PlacementNoop::NeverResident,
            },
        };
    }
    if source.origin().is_some_and(|o| o.zone == zone.id()) {
        return Placement::Noop {
            reason: PlacementNoop::SameZone,
        };
    }
    if !zone.accepts(token) {
        return Placement::Cancel {
            reason: CancelReason::Rejected,
        };
    }
    if rules.is_restricted(token.kind(), zone) {
        return Placement::Cancel {
            reason: CancelReason::Restricted,
        };
    }

    let destination = match token {
        Token::Container(dragged) => {
            // The staging container takes any child, containers included.
            if let Some(slot) = board.staging().filter(|slot| slot.zone == zone.id()) {
                return Placement::Place(PlacementPlan {
                    token: token.id(),
                    source,
                    zone: zone.id(),
                    destination: Destination::IntoContainer(slot.container),
                });
            }
            let resident = rules
                .is_mergeable(&dragged.kind)
                .then(|| zone.container_of_kind(&dragged.kind, Some(dragged.id)))
                .flatten();
            match (resident, target.container()) {
                (Some(resident), _) => Destination::MergeInto(resident.id),
                (None, Some(hit)) => Destination::Beside(hit),
                (None, None) => Destination::Append,
            }
        }
        Token::Plain(_) => {
            let staging = board
                .staging()
                .filter(|slot| slot.zone == zone.id())
                .map(|slot| slot.container);
            match target.container() {
                Some(hit) if Some(hit) == staging => Destination::IntoContainer(hit),
                Some(hit) => {
                    let takes_children = zone
                        .find(hit)
                        .is_some_and(|(_, c)| rules.accepts_children(c.kind()));
                    if takes_children {
                        Destination::IntoContainer(hit)
                    } else {
                        Destination::Append
                    }
                }
                None => staging.map_or(Destination::Append, Destination::IntoContainer),
            }
        }
    };

    Placement::Place(PlacementPlan {
        token: token.id(),
        source,
        zone: zone.id(),
        destination,
    })
}

// ---- Commit ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// A new top-level or child entry.
    Inserted { entry: TokenId },
    /// Children appended to a resident container.
    Merged { into: TokenId, children: usize },
    /// Removed through the return zone.
    Discarded { token: TokenId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    /// Zone that received the entry, or lost the discarded token.
    pub zone: ZoneId,
    pub outcome: CommitOutcome,
    /// Set when the token left a zone.
    pub moved_from: Option<Origin>,
    pub staging_cleared: bool,
}

/// Apply a `Discard` or `Place` decision. `Cancel` and `Noop` are rejected
/// with a config error since there is nothing to apply.
pub fn commit(board: &mut Board, placement: &Placement) -> Result<CommitReport> {
    match *placement {
        Placement::Place(plan) => commit_place(board, plan),
        Placement::Discard { token, origin } => commit_discard(board, token, origin),
        Placement::Cancel { .. } | Placement::Noop { .. } => {
            Err(DragError::config("nothing to commit for a cancel or no-op"))
        }
    }
}

fn commit_place(board: &mut Board, plan: PlacementPlan) -> Result<CommitReport> {
    let staging = board.staging_container_id();
    let is_staging = Some(plan.token) == staging;

    // Validate before mutating.
    let template = match board.locate(plan.token) {
        Some((found, token)) if found == plan.source => token.clone(),
        _ => return Err(DragError::TokenVanished { token: plan.token }),
    };
    let zone = board
        .zone(plan.zone)
        .ok_or(DragError::UnknownZone { zone: plan.zone })?;
    match plan.destination {
        Destination::IntoContainer(anchor) | Destination::MergeInto(anchor) => {
            if zone.find(anchor).and_then(|(_, t)| t.as_container()).is_none() {
                return Err(DragError::TokenVanished { token: anchor });
            }
        }
        Destination::Beside(_) | Destination::Append => {}
    }

    let (entry, moved_from) = match plan.source {
        TokenSource::Zone(origin) if !is_staging => {
            let zone = board
                .zone_mut(origin.zone)
                .ok_or(DragError::UnknownZone { zone: origin.zone })?;
            let token = zone
                .remove(plan.token)
                .ok_or(DragError::TokenVanished { token: plan.token })?;
            (token, Some(origin))
        }
        _ => (template.duplicate(board.ids_mut())?, None),
    };

    let zone = board
        .zone_mut(plan.zone)
        .ok_or(DragError::UnknownZone { zone: plan.zone })?;
    let outcome = match plan.destination {
        Destination::Append => {
            let entry_id = entry.id();
            zone.push(entry);
            CommitOutcome::Inserted { entry: entry_id }
        }
        Destination::Beside(anchor) => {
            let entry_id = entry.id();
            zone.insert_after(anchor, entry);
            CommitOutcome::Inserted { entry: entry_id }
        }
        Destination::IntoContainer(anchor) => {
            let entry_id = entry.id();
            let container = zone
                .container_mut(anchor)
                .ok_or(DragError::TokenVanished { token: anchor })?;
            container.children.push(entry);
            CommitOutcome::Inserted { entry: entry_id }
        }
        Destination::MergeInto(anchor) => {
            let children = match entry {
                Token::Container(dropped) => dropped.children,
                Token::Plain(_) => Vec::new(),
            };
            let count = children.len();
            let container = zone
                .container_mut(anchor)
                .ok_or(DragError::TokenVanished { token: anchor })?;
            container.children.extend(children);
            CommitOutcome::Merged {
                into: anchor,
                children: count,
            }
        }
    };

    let staging_cleared = is_staging && clear_staging(board);
    Ok(CommitReport {
        zone: plan.zone,
        outcome,
        moved_from,
        staging_cleared,
    })
}

fn commit_discard(board: &mut Board, token: TokenId, origin: Origin) -> Result<CommitReport> {
    match board.locate(token) {
        Some((TokenSource::Zone(found), _)) if found == origin => {}
        _ => return Err(DragError::TokenVanished { token }),
    }

    // Throwing the staging container away empties it instead.
    if Some(token) == board.staging_container_id() {
        let staging_cleared = clear_staging(board);
        return Ok(CommitReport {
            zone: origin.zone,
            outcome: CommitOutcome::Discarded { token },
            moved_from: None,
            staging_cleared,
        });
    }

    board
        .zone_mut(origin.zone)
        .and_then(|zone| zone.remove(token))
        .ok_or(DragError::TokenVanished { token })?;
    Ok(CommitReport {
        zone: origin.zone,
        outcome: CommitOutcome::Discarded { token },
        moved_from: Some(origin),
        staging_cleared: false,
    })
}

fn clear_staging(board: &mut Board) -> bool {
    let Some(slot) = board.staging() else {
        return false;
    };
    board
        .zone_mut(slot.zone)
        .and_then(|zone| zone.container_mut(slot.container))
        .map(|container| container.children.clear())
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ContainerCaps;
    use crate::zone::{AcceptPolicy, ZoneSpec};
    use filterdeck_core::token::TokenKind;

    fn joker(name: &str) -> TokenKind {
        TokenKind::new("Joker", name)
    }

    fn banned() -> TokenKind {
        TokenKind::new("Group", "Banned")
    }

    struct Fixture {
        board: Board,
        rules: PlacementRules,
        must: ZoneId,
        should: ZoneId,
        bonus: ZoneId,
        shelf: ZoneId,
        staging: ZoneId,
    }

    fn fixture() -> Fixture {
        let mut board = Board::new();
        let must = board.add_zone(ZoneSpec::categorized("Must")).unwrap();
        let should = board.add_zone(ZoneSpec::categorized("Should")).unwrap();
        let bonus = board.add_zone(ZoneSpec::categorized("Bonus")).unwrap();
        let shelf = board.add_zone(ZoneSpec::new("Shelf", ZoneRole::Return)).unwrap();
        let staging = board.add_staging_zone("Staging", banned()).unwrap();
        let rules = PlacementRules::new()
            .container(banned(), ContainerCaps::MERGEABLE | ContainerCaps::ACCEPTS_CHILDREN)
            .forbid(banned(), "Bonus");
        Fixture {
            board,
            rules,
            must,
            should,
            bonus,
            shelf,
            staging,
        }
    }

    fn resolve(f: &Fixture, id: TokenId, target: Option<DropTarget>) -> Placement {
        let (source, token) = f.board.locate(id).unwrap();
        decide(&f.board, &f.rules, token, source, target)
    }

    fn to_zone(zone: ZoneId) -> Option<DropTarget> {
        Some(DropTarget::Zone { zone })
    }

    #[test]
    fn no_target_cancels() {
        let mut f = fixture();
        let t = f.board.add_template(joker("Blueprint")).unwrap();
        assert_eq!(
            resolve(&f, t, None),
            Placement::Cancel {
                reason: CancelReason::NoTarget
            }
        );
    }

    #[test]
    fn palette_template_is_duplicated() {
        let mut f = fixture();
        let t = f.board.add_template(joker("Blueprint")).unwrap();
        let placement = resolve(&f, t, to_zone(f.must));
        let report = commit(&mut f.board, &placement).unwrap();

        let CommitOutcome::Inserted { entry } = report.outcome else {
            panic!("expected insert, got {:?}", report.outcome);
        };
        assert_ne!(entry, t);
        assert_eq!(f.board.palette().template_count(), 1);
        assert_eq!(f.board.zone(f.must).unwrap().len(), 1);
        assert_eq!(report.moved_from, None);
    }

    #[test]
    fn zone_token_moves_as_itself() {
        let mut f = fixture();
        let id = f.board.place_new(f.must, joker("Cavendish")).unwrap();
        let placement = resolve(&f, id, to_zone(f.should));
        let report = commit(&mut f.board, &placement).unwrap();

        assert_eq!(report.outcome, CommitOutcome::Inserted { entry: id });
        assert!(f.board.zone(f.must).unwrap().is_empty());
        assert_eq!(f.board.zone(f.should).unwrap().tokens()[0].id(), id);
    }

    #[test]
    fn same_zone_is_noop() {
        let mut f = fixture();
        let id = f.board.place_new(f.must, joker("Cavendish")).unwrap();
        assert_eq!(
            resolve(&f, id, to_zone(f.must)),
            Placement::Noop {
                reason: PlacementNoop::SameZone
            }
        );
    }

    #[test]
    fn return_zone_discards_or_ignores() {
        let mut f = fixture();
        let placed = f.board.place_new(f.must, joker("Cavendish")).unwrap();
        let template = f.board.add_template(joker("Blueprint")).unwrap();

        assert_eq!(
            resolve(&f, template, to_zone(f.shelf)),
            Placement::Noop {
                reason: PlacementNoop::NeverResident
            }
        );

        let placement = resolve(&f, placed, to_zone(f.shelf));
        let report = commit(&mut f.board, &placement).unwrap();
        assert_eq!(report.outcome, CommitOutcome::Discarded { token: placed });
        assert!(f.board.locate(placed).is_none());
    }

    #[test]
    fn restriction_cancels_container_in_bonus() {
        let mut f = fixture();
        let group = f.board.place_new_container(f.must, banned(), [joker("A")]).unwrap();
        assert_eq!(
            resolve(&f, group, to_zone(f.bonus)),
            Placement::Cancel {
                reason: CancelReason::Restricted
            }
        );
    }

    #[test]
    fn rejected_by_accept_policy() {
        let mut f = fixture();
        let picky = f
            .board
            .add_zone(ZoneSpec::categorized("Vouchers").accepts(AcceptPolicy::categories(["Voucher"])))
            .unwrap();
        let t = f.board.add_template(joker("Blueprint")).unwrap();
        assert_eq!(
            resolve(&f, t, to_zone(picky)),
            Placement::Cancel {
                reason: CancelReason::Rejected
            }
        );
    }

    #[test]
    fn staging_container_merges_and_is_emptied() {
        let mut f = fixture();
        f.board.place_new_container(f.must, banned(), [joker("A")]).unwrap();
        f.board.stage(joker("C1")).unwrap();
        f.board.stage(joker("C2")).unwrap();
        let staging = f.board.staging_container_id().unwrap();

        let placement = resolve(&f, staging, to_zone(f.must));
        let report = commit(&mut f.board, &placement).unwrap();
        assert!(matches!(report.outcome, CommitOutcome::Merged { children: 2, .. }));
        assert!(report.staging_cleared);

        let must = f.board.zone(f.must).unwrap();
        assert_eq!(must.len(), 1);
        let names: Vec<_> = must.tokens()[0].children().iter().map(|c| c.kind().name()).collect();
        assert_eq!(names, ["A", "C1", "C2"]);

        let staged = f.board.zone(f.staging).unwrap();
        assert_eq!(staged.len(), 1);
        assert!(staged.tokens()[0].children().is_empty());
    }

    #[test]
    fn non_mergeable_container_is_appended() {
        let mut f = fixture();
        let pack = TokenKind::new("Group", "Pack");
        f.board.place_new_container(f.must, pack.clone(), []).unwrap();
        let other = f.board.place_new_container(f.should, pack, [joker("X")]).unwrap();

        let placement = resolve(&f, other, to_zone(f.must));
        let report = commit(&mut f.board, &placement).unwrap();
        assert_eq!(report.outcome, CommitOutcome::Inserted { entry: other });
        assert_eq!(f.board.zone(f.must).unwrap().len(), 2);
    }

    #[test]
    fn container_dropped_on_container_lands_beside_it() {
        let mut f = fixture();
        let pack = TokenKind::new("Group", "Pack");
        let first = f.board.place_new(f.must, joker("Head")).unwrap();
        let resident = f.board.place_new_container(f.must, pack.clone(), []).unwrap();
        f.board.place_new(f.must, joker("Tail")).unwrap();
        let dropped = f.board.place_new_container(f.should, pack, []).unwrap();

        let target = Some(DropTarget::Container {
            zone: f.must,
            container: resident,
        });
        let placement = resolve(&f, dropped, target);
        commit(&mut f.board, &placement).unwrap();

        let order: Vec<_> = f.board.zone(f.must).unwrap().tokens().iter().map(Token::id).collect();
        assert_eq!(order[0], first);
        assert_eq!(order[1], resident);
        assert_eq!(order[2], dropped);
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn container_into_staging_zone_becomes_a_staged_child() {
        let mut f = fixture();
        let pack = TokenKind::new("Group", "Pack");
        let group = f.board.place_new_container(f.must, pack.clone(), [joker("A")]).unwrap();
        let slot = f.board.staging().unwrap();
        let target = Some(DropTarget::Container {
            zone: f.staging,
            container: slot.container,
        });

        let placement = resolve(&f, group, target);
        assert!(matches!(
            placement,
            Placement::Place(PlacementPlan {
                destination: Destination::IntoContainer(anchor),
                ..
            }) if anchor == slot.container
        ));
        assert_eq!(resolve(&f, group, to_zone(f.staging)), placement);

        let report = commit(&mut f.board, &placement).unwrap();
        assert_eq!(report.outcome, CommitOutcome::Inserted { entry: group });
        assert!(f.board.zone(f.must).unwrap().is_empty());
        let staged = f.board.zone(f.staging).unwrap().tokens()[0].children();
        assert_eq!(staged.last().map(Token::id), Some(group));
        assert_eq!(staged.last().map(|t| t.children().len()), Some(1));
    }

    #[test]
    fn plain_token_into_accepting_container() {
        let mut f = fixture();
        let group = f.board.place_new_container(f.must, banned(), [joker("A")]).unwrap();
        let t = f.board.add_template(joker("B")).unwrap();
        let target = Some(DropTarget::Container {
            zone: f.must,
            container: group,
        });
        let placement = resolve(&f, t, target);
        commit(&mut f.board, &placement).unwrap();

        let must = f.board.zone(f.must).unwrap();
        assert_eq!(must.len(), 1);
        assert_eq!(must.tokens()[0].children().len(), 2);
    }

    #[test]
    fn plain_token_on_closed_container_appends_to_zone() {
        let mut f = fixture();
        let pack = TokenKind::new("Group", "Pack");
        let group = f.board.place_new_container(f.must, pack, []).unwrap();
        let t = f.board.add_template(joker("B")).unwrap();
        let target = Some(DropTarget::Container {
            zone: f.must,
            container: group,
        });
        assert!(matches!(
            resolve(&f, t, target),
            Placement::Place(PlacementPlan {
                destination: Destination::Append,
                ..
            })
        ));
    }

    #[test]
    fn plain_token_on_staging_zone_goes_into_staging_container() {
        let mut f = fixture();
        let t = f.board.add_template(joker("B")).unwrap();
        let placement = resolve(&f, t, to_zone(f.staging));
        let staging = f.board.staging_container_id().unwrap();
        assert!(matches!(
            placement,
            Placement::Place(PlacementPlan {
                destination: Destination::IntoContainer(c),
                ..
            }) if c == staging
        ));
        commit(&mut f.board, &placement).unwrap();
        assert_eq!(f.board.zone(f.staging).unwrap().tokens()[0].children().len(), 1);
    }

    #[test]
    fn staged_child_moves_out_of_the_staging_container() {
        let mut f = fixture();
        let child = f.board.stage(joker("C1")).unwrap();
        let placement = resolve(&f, child, to_zone(f.must));
        let report = commit(&mut f.board, &placement).unwrap();
        assert_eq!(report.outcome, CommitOutcome::Inserted { entry: child });
        assert!(!report.staging_cleared);
        assert!(f.board.zone(f.staging).unwrap().tokens()[0].children().is_empty());
    }

    #[test]
    fn discarding_staging_container_empties_it() {
        let mut f = fixture();
        f.board.stage(joker("C1")).unwrap();
        let staging = f.board.staging_container_id().unwrap();
        let placement = resolve(&f, staging, to_zone(f.shelf));
        let report = commit(&mut f.board, &placement).unwrap();
        assert!(report.staging_cleared);
        assert!(f.board.locate(staging).is_some());
    }

    #[test]
    fn commit_of_vanished_token_leaves_board_untouched() {
        let mut f = fixture();
        let id = f.board.place_new(f.must, joker("Cavendish")).unwrap();
        let placement = resolve(&f, id, to_zone(f.should));
        f.board.zone_mut(f.must).unwrap().remove(id);

        let before_should = f.board.zone(f.should).unwrap().len();
        assert!(matches!(
            commit(&mut f.board, &placement),
            Err(DragError::TokenVanished { .. })
        ));
        assert_eq!(f.board.zone(f.should).unwrap().len(), before_should);
    }

    #[test]
    fn commit_rejects_cancel() {
        let mut f = fixture();
        let placement = Placement::Cancel {
            reason: CancelReason::NoTarget,
        };
        assert!(commit(&mut f.board, &placement).is_err());
    }
}
