#![forbid(unsafe_code)]

//! The board: registered zones, the palette, and token id allocation.
//!
//! # Invariants
//!
//! 1. Zones keep registration order; [`ZoneId`]s are dense registration
//!    indices and never reused.
//! 2. At most one `Favorite`, one `Return` and one `Staging` zone exist.
//! 3. A staging zone holds exactly one staging container, created together
//!    with the zone.
//! 4. Token ids are unique across zones and palette; every id that enters the
//!    board is reserved in the allocator so fresh ids never collide.
//!
//! # Failure Modes
//!
//! Setup calls return [`DragError`]; nothing here logs or panics.

use filterdeck_core::token::{Token, TokenId, TokenIdAllocator, TokenKind};
use serde::{Deserialize, Serialize};

use crate::error::{DragError, Result};
use crate::palette::Palette;
use crate::zone::{Zone, ZoneId, ZoneRole, ZoneSpec};

/// Kind given to the staging container when none is specified.
pub const DEFAULT_STAGING_KIND: &str = "Group:Staging";

/// Where a zone-resident token sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    pub zone: ZoneId,
    /// Immediate parent container, `None` for top-level tokens.
    pub parent: Option<TokenId>,
}

/// Where a drag picked its token up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TokenSource {
    Palette,
    Zone(Origin),
}

impl TokenSource {
    #[must_use]
    pub fn origin(self) -> Option<Origin> {
        match self {
            Self::Palette => None,
            Self::Zone(origin) => Some(origin),
        }
    }
}

/// The staging zone and its one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingSlot {
    pub zone: ZoneId,
    pub container: TokenId,
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    zones: Vec<Zone>,
    palette: Palette,
    ids: TokenIdAllocator,
    staging: Option<StagingSlot>,
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Registration ----

    /// Register a zone. A `Staging` zone gets a container of
    /// [`DEFAULT_STAGING_KIND`].
    pub fn add_zone(&mut self, spec: ZoneSpec) -> Result<ZoneId> {
        let staging_kind = match spec.role {
            ZoneRole::Staging => Some(TokenKind::parse(DEFAULT_STAGING_KIND)?),
            _ => None,
        };
        self.register(spec, staging_kind)
    }

    /// Register the staging zone with a container of `container_kind`.
    pub fn add_staging_zone(
        &mut self,
        name: impl Into<String>,
        container_kind: TokenKind,
    ) -> Result<ZoneId> {
        self.register(ZoneSpec::new(name, ZoneRole::Staging), Some(container_kind))
    }

    fn register(&mut self, spec: ZoneSpec, staging_kind: Option<TokenKind>) -> Result<ZoneId> {
        if self.zone_by_name(&spec.name).is_some() {
            return Err(DragError::DuplicateZone { name: spec.name });
        }
        if spec.role.is_singleton() && self.zone_with_role(spec.role).is_some() {
            return Err(DragError::DuplicateSingletonRole { role: spec.role });
        }
        let raw = u16::try_from(self.zones.len())
            .map_err(|_| DragError::config("zone limit reached"))?;
        let id = ZoneId::new(raw);

        let mut zone = Zone::from_spec(id, spec);
        if let Some(kind) = staging_kind {
            let container = self.ids.allocate()?;
            zone.push(Token::container(container, kind, Vec::new()));
            self.staging = Some(StagingSlot { zone: id, container });
        }
        self.zones.push(zone);
        Ok(id)
    }

    /// Add a plain palette template of `kind`.
    pub fn add_template(&mut self, kind: TokenKind) -> Result<TokenId> {
        let id = self.ids.allocate()?;
        self.palette.insert(Token::plain(id, kind));
        Ok(id)
    }

    /// Add a prebuilt palette template, keeping its ids.
    pub fn add_template_token(&mut self, template: Token) -> Result<TokenId> {
        self.claim_ids(&template)?;
        let id = template.id();
        self.palette.insert(template);
        Ok(id)
    }

    /// Put an existing token (for example one restored from a saved filter)
    /// at the end of a zone, keeping its ids.
    pub fn adopt(&mut self, zone: ZoneId, token: Token) -> Result<TokenId> {
        if self.zone(zone).is_none() {
            return Err(DragError::UnknownZone { zone });
        }
        self.claim_ids(&token)?;
        let id = token.id();
        self.zone_mut(zone)
            .ok_or(DragError::UnknownZone { zone })?
            .push(token);
        Ok(id)
    }

    /// Append a fresh plain token of `kind` to a zone.
    pub fn place_new(&mut self, zone: ZoneId, kind: TokenKind) -> Result<TokenId> {
        let id = self.ids.allocate()?;
        self.adopt(zone, Token::plain(id, kind))
    }

    /// Append a fresh container of `kind` holding fresh plain children.
    pub fn place_new_container(
        &mut self,
        zone: ZoneId,
        kind: TokenKind,
        children: impl IntoIterator<Item = TokenKind>,
    ) -> Result<TokenId> {
        let id = self.ids.allocate()?;
        let children = children
            .into_iter()
            .map(|child| -> Result<Token> { Ok(Token::plain(self.ids.allocate()?, child)) })
            .collect::<Result<Vec<_>>>()?;
        self.adopt(zone, Token::container(id, kind, children))
    }

    /// Append a fresh plain child of `kind` to the staging container.
    pub fn stage(&mut self, kind: TokenKind) -> Result<TokenId> {
        let slot = self
            .staging
            .ok_or_else(|| DragError::config("no staging zone registered"))?;
        let id = self.ids.allocate()?;
        let zone = self
            .zone_mut(slot.zone)
            .ok_or(DragError::UnknownZone { zone: slot.zone })?;
        let container = zone
            .container_mut(slot.container)
            .ok_or(DragError::TokenVanished {
                token: slot.container,
            })?;
        container.children.push(Token::plain(id, kind));
        Ok(id)
    }

    fn claim_ids(&mut self, token: &Token) -> Result<()> {
        let mut clash = None;
        token.walk(&mut |t| {
            if clash.is_none() && self.contains(t.id()) {
                clash = Some(t.id());
            }
        });
        if let Some(token) = clash {
            return Err(DragError::DuplicateToken { token });
        }
        self.ids.reserve_through(token.max_id());
        Ok(())
    }

    fn contains(&self, id: TokenId) -> bool {
        self.locate(id).is_some()
    }

    // ---- Queries ----

    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(usize::from(id.get()))
    }

    pub fn zone_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(usize::from(id.get()))
    }

    #[must_use]
    pub fn zone_by_name(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name() == name)
    }

    /// The zone holding a singleton role.
    #[must_use]
    pub fn zone_with_role(&self, role: ZoneRole) -> Option<&Zone> {
        self.zones.iter().find(|z| z.role() == role)
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub fn staging(&self) -> Option<StagingSlot> {
        self.staging
    }

    #[must_use]
    pub fn staging_container_id(&self) -> Option<TokenId> {
        self.staging.map(|s| s.container)
    }

    /// Find a token by id: zones first (registration order, depth-first),
    /// then the palette.
    #[must_use]
    pub fn locate(&self, id: TokenId) -> Option<(TokenSource, &Token)> {
        for zone in &self.zones {
            if let Some((parent, token)) = zone.find(id) {
                let origin = Origin {
                    zone: zone.id(),
                    parent,
                };
                return Some((TokenSource::Zone(origin), token));
            }
        }
        self.palette
            .find(id)
            .map(|token| (TokenSource::Palette, token))
    }

    /// Zones currently highlighted.
    pub fn highlighted(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.zones
            .iter()
            .filter(|z| z.is_highlighted())
            .map(Zone::id)
    }

    // ---- Engine internals ----

    pub(crate) fn ids_mut(&mut self) -> &mut TokenIdAllocator {
        &mut self.ids
    }

    /// Light exactly `zone` (or nothing).
    pub(crate) fn set_highlight(&mut self, zone: Option<ZoneId>) {
        for z in &mut self.zones {
            z.set_highlighted(Some(z.id()) == zone);
        }
    }

    pub(crate) fn clear_highlights(&mut self) {
        self.set_highlight(None);
    }
}
