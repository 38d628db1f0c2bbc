/// Spatial queries — single source of truth for movement and collisions.
///
/// ## Architecture
///
/// All queries are pure functions over the arena slice plus the avatar.
/// They read facets only (rules.rs), so adding an entity kind never touches
/// this file. `WorldState` wraps them as methods; mutation (actually moving a
/// marble, killing a pit) happens in world.rs / step.rs.
///
/// ## Presence
///
/// An entity takes part in a query only while `alive && detectable`. An entity
/// killed earlier in the current tick is therefore already absent, even though
/// it stays in the arena until the reap at the end of the tick. A carried
/// (hidden) pickup is absent for the same reason.
///
/// ## Projectile resolution order
///
///   1. Avatar on the cell          → `Contact::Avatar`
///   2. Any damageable entity       → `Contact::Damage(id)` (first in creation order)
///   3. Any blocking entity         → `Contact::Block`
///   4. Anything else present       → `Contact::PassOver`
///   5. Empty cell                  → `Contact::Nothing`

use super::entity::{Avatar, Entity, EntityId};
use super::grid::{Dir, Pos};
use super::rules::SPAWNER_RADIUS;

/// Playfield dimensions. Cells outside are never enterable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    #[inline]
    pub fn contains(&self, p: Pos) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }
}

// ══════════════════════════════════════════════════════════════
// Presence
// ══════════════════════════════════════════════════════════════

/// Entities present (alive + detectable) at `pos`, in creation order.
pub fn present_at(entities: &[Entity], pos: Pos) -> impl Iterator<Item = &Entity> {
    entities.iter().filter(move |e| e.pos == pos && e.is_present())
}

/// First visible collectable pickup at `pos`.
pub fn pickup_at(entities: &[Entity], pos: Pos) -> Option<EntityId> {
    present_at(entities, pos)
        .find(|e| e.facets().collectable)
        .map(|e| e.id)
}

/// Live thieves with |dx| < 3 and |dy| < 3 of `center`.
pub fn thieves_near(entities: &[Entity], center: Pos) -> usize {
    entities.iter()
        .filter(|e| e.is_present() && e.facets().thief)
        .filter(|e| {
            (e.pos.x - center.x).abs() < SPAWNER_RADIUS
                && (e.pos.y - center.y).abs() < SPAWNER_RADIUS
        })
        .count()
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

/// What stands in the avatar's way.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AvatarMove {
    /// Nothing blocking; the avatar may step in.
    Open,
    /// A pushable occupant must be displaced first.
    Push(EntityId),
    Blocked,
}

/// Classify the avatar's target cell. Avatar-passable occupants are ignored;
/// a single pushable occupant yields `Push`; anything else blocks.
pub fn avatar_move(entities: &[Entity], bounds: Bounds, target: Pos) -> AvatarMove {
    if !bounds.contains(target) { return AvatarMove::Blocked; }

    let mut push = None;
    for e in present_at(entities, target) {
        let f = e.facets();
        if f.avatar_passable { continue; }
        if f.pushable && push.is_none() {
            push = Some(e.id);
            continue;
        }
        return AvatarMove::Blocked;
    }
    match push {
        Some(id) => AvatarMove::Push(id),
        None => AvatarMove::Open,
    }
}

/// Where a pushed marble would land.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PushTarget {
    Clear,
    /// Exactly one pit and nothing else: marble and pit both vanish.
    Pit(EntityId),
    Blocked,
}

pub fn push_target(entities: &[Entity], bounds: Bounds, target: Pos) -> PushTarget {
    if !bounds.contains(target) { return PushTarget::Blocked; }

    let mut pit = None;
    for e in present_at(entities, target) {
        if e.facets().marble_passable && pit.is_none() {
            pit = Some(e.id);
        } else {
            return PushTarget::Blocked;
        }
    }
    match pit {
        Some(id) => PushTarget::Pit(id),
        None => PushTarget::Clear,
    }
}

/// Can an enemy step into `target`? Enemies never push and never share a
/// cell with the avatar.
pub fn enemy_can_enter(entities: &[Entity], avatar: &Avatar, bounds: Bounds, target: Pos) -> bool {
    if !bounds.contains(target) { return false; }
    if avatar.alive && avatar.pos == target { return false; }
    present_at(entities, target).all(|e| e.facets().avatar_passable)
}

// ══════════════════════════════════════════════════════════════
// Ranged attacks
// ══════════════════════════════════════════════════════════════

/// Is the avatar strictly ahead of `from` along `dir`, with no projectile-
/// reactive entity in the cells strictly between?
pub fn line_of_sight(entities: &[Entity], avatar: &Avatar, from: Pos, dir: Dir) -> bool {
    if !avatar.alive { return false; }
    let to = avatar.pos;
    let aligned = match dir {
        Dir::Up    => to.x == from.x && to.y < from.y,
        Dir::Down  => to.x == from.x && to.y > from.y,
        Dir::Left  => to.y == from.y && to.x < from.x,
        Dir::Right => to.y == from.y && to.x > from.x,
    };
    if !aligned { return false; }

    let mut cell = from.step(dir);
    while cell != to {
        let obstructed = present_at(entities, cell).any(|e| {
            let f = e.facets();
            f.pea_blocking || f.pea_damageable
        });
        if obstructed { return false; }
        cell = cell.step(dir);
    }
    true
}

/// Result of a projectile checking one cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Contact {
    Avatar,
    Damage(EntityId),
    Block,
    PassOver,
    Nothing,
}

impl Contact {
    /// Does this contact end the projectile?
    pub fn stops(self) -> bool {
        matches!(self, Contact::Avatar | Contact::Damage(_) | Contact::Block)
    }
}

/// Resolve what a projectile meets at `pos`. `skip` is the projectile itself.
/// See the priority list in the module docs.
pub fn projectile_contact(entities: &[Entity], avatar: &Avatar, pos: Pos, skip: EntityId) -> Contact {
    if avatar.alive && avatar.pos == pos { return Contact::Avatar; }

    let mut block = false;
    let mut occupied = false;
    for e in present_at(entities, pos).filter(|e| e.id != skip) {
        let f = e.facets();
        if f.pea_damageable { return Contact::Damage(e.id); }
        if f.pea_blocking {
            block = true;
        } else {
            occupied = true;
        }
    }
    if block {
        Contact::Block
    } else if occupied {
        Contact::PassOver
    } else {
        Contact::Nothing
    }
}
