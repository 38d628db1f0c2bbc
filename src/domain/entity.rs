/// Entities: the avatar plus everything stored in the world's arena.
///
/// Every arena entity shares one record (position, facing, alive, detectable,
/// birth tick) and carries kind-specific state in `Kind`. Peers never inspect
/// `Kind` to decide how to interact; they go through `Facets` (see rules.rs).

use super::grid::{Dir, Pos};
use super::rules::{self, Facets};

/// Stable handle into the world arena. Ids only ever grow, so the arena
/// (kept in creation order) is also sorted by id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntityId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ThiefTier {
    Regular,
    Mean,
}

impl ThiefTier {
    pub fn hit_points(self) -> i32 {
        match self {
            ThiefTier::Regular => rules::REGULAR_THIEF_HP,
            ThiefTier::Mean => rules::MEAN_THIEF_HP,
        }
    }

    pub fn kill_score(self) -> u32 {
        match self {
            ThiefTier::Regular => rules::REGULAR_THIEF_SCORE,
            ThiefTier::Mean => rules::MEAN_THIEF_SCORE,
        }
    }

    /// Only the mean tier shoots at the avatar.
    pub fn fires(self) -> bool {
        matches!(self, ThiefTier::Mean)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GoodieKind {
    ExtraLife,
    RestoreHealth,
    Ammo,
}

/// Item-stealing patroller state.
#[derive(Clone, Debug)]
pub struct Thief {
    pub tier: ThiefTier,
    pub hp: i32,
    pub walked: u32,   // steps taken since the last turn
    pub budget: u32,   // steps allowed before turning
    /// Pickup being carried. The pickup stays in the arena, hidden.
    pub carried: Option<EntityId>,
}

impl Thief {
    pub fn new(tier: ThiefTier, budget: u32) -> Self {
        Thief {
            tier,
            hp: tier.hit_points(),
            walked: 0,
            budget,
            carried: None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Kind {
    Wall,
    Pit,
    Exit { revealed: bool },
    Crystal,
    Goodie(GoodieKind),
    Marble { hp: i32 },
    Pea,
    Patroller { hp: i32 },
    Thief(Thief),
    Spawner { tier: ThiefTier },
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub id: EntityId,
    pub pos: Pos,
    pub dir: Dir,
    pub alive: bool,
    /// Hidden entities (a carried pickup) still exist but are skipped by queries.
    pub detectable: bool,
    /// Tick the entity was created on; it first acts on the tick after.
    pub born: u64,
    pub kind: Kind,
}

impl Entity {
    pub fn new(id: EntityId, pos: Pos, dir: Dir, born: u64, kind: Kind) -> Self {
        Entity { id, pos, dir, alive: true, detectable: true, born, kind }
    }

    #[inline]
    pub fn facets(&self) -> Facets {
        rules::facets(&self.kind)
    }

    /// Alive and visible to spatial queries.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.alive && self.detectable
    }

    /// Hit-point counter, for kinds that have one.
    pub fn hit_points_mut(&mut self) -> Option<&mut i32> {
        match &mut self.kind {
            Kind::Marble { hp } | Kind::Patroller { hp } => Some(hp),
            Kind::Thief(t) => Some(&mut t.hp),
            _ => None,
        }
    }

    pub fn thief(&self) -> Option<&Thief> {
        match &self.kind {
            Kind::Thief(t) => Some(t),
            _ => None,
        }
    }
}

/// The player-controlled avatar. Lives outside the arena.
#[derive(Clone, Debug)]
pub struct Avatar {
    pub pos: Pos,
    pub dir: Dir,
    pub hp: i32,
    pub ammo: u32,
    pub alive: bool,
}

impl Avatar {
    pub fn new(pos: Pos) -> Self {
        Avatar {
            pos,
            dir: Dir::Right,
            hp: rules::AVATAR_HP,
            ammo: rules::AVATAR_START_AMMO,
            alive: true,
        }
    }

    /// Health as a percentage of full hit points.
    pub fn health_percent(&self) -> i32 {
        self.hp.max(0) * 100 / rules::AVATAR_HP
    }
}

/// One player command per tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Move(Dir),
    Fire,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub action: Option<Action>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thief_tiers_differ() {
        let regular = Thief::new(ThiefTier::Regular, 3);
        let mean = Thief::new(ThiefTier::Mean, 3);
        assert_eq!(regular.hp, 5);
        assert_eq!(mean.hp, 8);
        assert!(ThiefTier::Regular.kill_score() < ThiefTier::Mean.kill_score());
        assert!(!ThiefTier::Regular.fires());
        assert!(ThiefTier::Mean.fires());
    }

    #[test]
    fn hit_points_only_for_damageable_kinds() {
        let mut wall = Entity::new(EntityId(0), Pos::new(0, 0), Dir::Right, 0, Kind::Wall);
        assert!(wall.hit_points_mut().is_none());
        let mut marble = Entity::new(EntityId(1), Pos::new(1, 0), Dir::Right, 0, Kind::Marble { hp: 10 });
        assert_eq!(marble.hit_points_mut().copied(), Some(10));
    }

    #[test]
    fn avatar_health_percent() {
        let mut a = Avatar::new(Pos::new(1, 1));
        assert_eq!(a.health_percent(), 100);
        a.hp = 5;
        assert_eq!(a.health_percent(), 25);
        a.hp = -1;
        assert_eq!(a.health_percent(), 0);
    }
}
