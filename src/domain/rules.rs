/// Interaction rules: the facet truth table and the game's fixed numbers.
///
/// ## Facets
///
/// Every arena entity answers the same seven yes/no questions. Movement and
/// projectile resolution (physics.rs) only ever look at these, never at the
/// concrete kind.
///
/// ┌───────────┬────────┬────────┬──────┬────────┬───────┬─────────┬───────┐
/// │ Kind      │ avatar │ marble │ push │ pea    │ pea   │ collect │ thief │
/// │           │ passes │ passes │      │ damage │ block │         │       │
/// ├───────────┼────────┼────────┼──────┼────────┼───────┼─────────┼───────┤
/// │ Wall      │        │        │      │        │   ✓   │         │       │
/// │ Pit       │        │   ✓    │      │        │       │         │       │
/// │ Exit      │   ✓    │        │      │        │       │         │       │
/// │ Crystal   │   ✓    │        │      │        │       │         │       │
/// │ Goodie    │   ✓    │        │      │        │       │    ✓    │       │
/// │ Marble    │        │        │  ✓   │   ✓    │   ✓   │         │       │
/// │ Pea       │        │        │      │        │       │         │       │
/// │ Patroller │        │        │      │   ✓    │   ✓   │         │       │
/// │ Thief     │        │        │      │   ✓    │   ✓   │         │   ✓   │
/// │ Spawner   │        │        │      │        │   ✓   │         │       │
/// └───────────┴────────┴────────┴──────┴────────┴───────┴─────────┴───────┘
///
/// The avatar itself is outside the arena; it is always checked first by
/// projectile resolution and always blocks enemies.

use super::entity::Kind;

// ── Hit points ──

pub const AVATAR_HP: i32 = 20;
pub const AVATAR_START_AMMO: u32 = 20;
pub const MARBLE_HP: i32 = 10;
pub const PATROLLER_HP: i32 = 10;
pub const REGULAR_THIEF_HP: i32 = 5;
pub const MEAN_THIEF_HP: i32 = 8;
pub const PEA_DAMAGE: i32 = 2;

// ── Score ──

pub const CRYSTAL_SCORE: u32 = 50;
pub const RESTORE_HEALTH_SCORE: u32 = 500;
pub const EXTRA_LIFE_SCORE: u32 = 1000;
pub const AMMO_SCORE: u32 = 100;
pub const AMMO_REFILL: u32 = 20;
pub const PATROLLER_SCORE: u32 = 100;
pub const REGULAR_THIEF_SCORE: u32 = 10;
pub const MEAN_THIEF_SCORE: u32 = 20;
pub const LEVEL_COMPLETE_SCORE: u32 = 2000;
pub const START_BONUS: u32 = 1000;

// ── Spawner ──

/// Thieves counted within this many cells (exclusive) of a spawner.
pub const SPAWNER_RADIUS: i32 = 3;
/// A spawner stops producing once this many thieves are nearby.
pub const SPAWNER_CAP: usize = 3;

/// The seven interaction facets of an arena entity.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Facets {
    /// The avatar may share the cell without pushing or being blocked.
    pub avatar_passable: bool,
    /// A pushed marble may land on this cell (and sinks into it).
    pub marble_passable: bool,
    pub pushable: bool,
    /// A projectile damages this entity.
    pub pea_damageable: bool,
    /// A projectile stops here.
    pub pea_blocking: bool,
    pub collectable: bool,
    pub thief: bool,
}

/// Facet lookup keyed on kind. See the table above.
pub fn facets(kind: &Kind) -> Facets {
    let none = Facets::default();
    match kind {
        Kind::Wall => Facets { pea_blocking: true, ..none },
        Kind::Pit => Facets { marble_passable: true, ..none },
        Kind::Exit { .. } | Kind::Crystal => Facets { avatar_passable: true, ..none },
        Kind::Goodie(_) => Facets { avatar_passable: true, collectable: true, ..none },
        Kind::Marble { .. } => Facets {
            pushable: true,
            pea_damageable: true,
            pea_blocking: true,
            ..none
        },
        Kind::Pea => none,
        Kind::Patroller { .. } => Facets { pea_damageable: true, pea_blocking: true, ..none },
        Kind::Thief(_) => Facets {
            pea_damageable: true,
            pea_blocking: true,
            thief: true,
            ..none
        },
        Kind::Spawner { .. } => Facets { pea_blocking: true, ..none },
    }
}

/// Ticks between enemy decisions. Later levels act faster, never faster
/// than every third tick.
///
/// level 0 → 7, level 1 → 6, level 16+ → 3.
pub fn action_period(level: u32) -> u64 {
    let period = (28 - level.min(28) as i64) / 4;
    period.max(3) as u64
}

/// Does an enemy act on this tick?
#[inline]
pub fn can_act(tick: u64, level: u32) -> bool {
    tick % action_period(level) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{GoodieKind, Thief, ThiefTier};

    #[test]
    fn period_at_level_one_is_six() {
        assert_eq!(action_period(1), 6);
    }

    #[test]
    fn period_floors_at_three() {
        assert_eq!(action_period(15), 3);
        assert_eq!(action_period(16), 3);
        assert_eq!(action_period(40), 3);
        assert_eq!(action_period(99), 3);
    }

    #[test]
    fn period_early_levels() {
        assert_eq!(action_period(0), 7);
        assert_eq!(action_period(4), 6);
        assert_eq!(action_period(8), 5);
        assert_eq!(action_period(12), 4);
    }

    #[test]
    fn can_act_on_period_multiples() {
        assert!(can_act(0, 1));
        assert!(!can_act(5, 1));
        assert!(can_act(6, 1));
        assert!(can_act(12, 1));
        assert!(can_act(9, 20));
        assert!(!can_act(10, 20));
    }

    #[test]
    fn wall_blocks_everything() {
        let f = facets(&Kind::Wall);
        assert!(!f.avatar_passable && !f.marble_passable && !f.pushable);
        assert!(f.pea_blocking && !f.pea_damageable);
    }

    #[test]
    fn only_pit_accepts_marble() {
        let kinds = [
            Kind::Wall, Kind::Exit { revealed: false }, Kind::Crystal,
            Kind::Goodie(GoodieKind::Ammo), Kind::Marble { hp: 10 }, Kind::Pea,
            Kind::Patroller { hp: 10 }, Kind::Spawner { tier: ThiefTier::Mean },
        ];
        assert!(kinds.iter().all(|k| !facets(k).marble_passable));
        assert!(facets(&Kind::Pit).marble_passable);
    }

    #[test]
    fn goodies_collectable_crystals_not() {
        assert!(facets(&Kind::Goodie(GoodieKind::ExtraLife)).collectable);
        assert!(!facets(&Kind::Crystal).collectable);
        assert!(facets(&Kind::Crystal).avatar_passable);
    }

    #[test]
    fn thief_flag_only_on_thieves() {
        assert!(facets(&Kind::Thief(Thief::new(ThiefTier::Regular, 1))).thief);
        assert!(!facets(&Kind::Patroller { hp: 10 }).thief);
        assert!(!facets(&Kind::Spawner { tier: ThiefTier::Regular }).thief);
    }
}
