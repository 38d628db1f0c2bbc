/// WorldState: the live level session.
///
/// ## Arena
///
/// All non-avatar entities live in `entities`, in creation order. Ids are
/// handed out from a counter that only grows, so the vector is also sorted by
/// id and `index_of` is a binary search. Nothing is ever removed during an
/// update pass: `kill()` only flags, and `reap()` compacts with an
/// order-preserving `retain` once the pass is over.
///
/// ## Queries
///
/// Spatial queries delegate to `domain::physics` with the arena slice and the
/// avatar. Prefer these methods over calling `physics::` directly.

use crate::domain::entity::{Avatar, Entity, EntityId, Kind};
use crate::domain::grid::{Dir, Pos};
use crate::domain::physics::{self, AvatarMove, Bounds, Contact, PushTarget};
use super::event::GameEvent;

pub struct WorldState {
    pub bounds: Bounds,
    pub avatar: Avatar,
    pub entities: Vec<Entity>,
    next_id: u32,

    /// Level number; drives the enemy action period.
    pub level: u32,
    pub tick: u64,
    pub crystals_left: u32,
    /// Counts down once per tick; paid out on completion.
    pub bonus: u32,
    /// Set when the avatar steps on the active exit.
    pub finished: bool,
}

// ── Construction / arena ──

impl WorldState {
    pub fn new(level: u32, bounds: Bounds, avatar: Avatar) -> Self {
        WorldState {
            bounds,
            avatar,
            entities: Vec::new(),
            next_id: 0,
            level,
            tick: 0,
            crystals_left: 0,
            bonus: crate::domain::rules::START_BONUS,
            finished: false,
        }
    }

    /// Add an entity. It is born on the current tick and first acts on the next.
    pub fn spawn(&mut self, pos: Pos, dir: Dir, kind: Kind) -> EntityId {
        debug_assert!(self.bounds.contains(pos), "spawn outside the grid at {pos:?}");
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(Entity::new(id, pos, dir, self.tick, kind));
        id
    }

    #[inline]
    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    /// Flag an entity dead. It disappears from every query immediately and
    /// from the arena at the next `reap()`.
    pub fn kill(&mut self, id: EntityId) {
        if let Some(e) = self.get_mut(id) {
            e.alive = false;
        }
    }

    /// Drop every dead entity. Returns how many were removed.
    pub fn reap(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| e.alive);
        before - self.entities.len()
    }

    /// Ids of live entities, in creation order: the update pass iterates this
    /// snapshot, never the arena itself.
    pub fn live_ids(&self) -> Vec<EntityId> {
        self.entities.iter().filter(|e| e.alive).map(|e| e.id).collect()
    }

    /// Present entities at `pos` (renderer and tests).
    pub fn entities_at(&self, pos: Pos) -> impl Iterator<Item = &Entity> {
        physics::present_at(&self.entities, pos)
    }

    pub fn exit_active(&self) -> bool {
        self.crystals_left == 0
    }
}

// ── Spatial queries ──

impl WorldState {
    #[inline]
    pub fn enemy_can_enter(&self, target: Pos) -> bool {
        physics::enemy_can_enter(&self.entities, &self.avatar, self.bounds, target)
    }

    #[inline]
    pub fn line_of_sight(&self, from: Pos, dir: Dir) -> bool {
        physics::line_of_sight(&self.entities, &self.avatar, from, dir)
    }

    #[inline]
    pub fn projectile_contact(&self, pos: Pos, projectile: EntityId) -> Contact {
        physics::projectile_contact(&self.entities, &self.avatar, pos, projectile)
    }

    #[inline]
    pub fn pickup_at(&self, pos: Pos) -> Option<EntityId> {
        physics::pickup_at(&self.entities, pos)
    }

    #[inline]
    pub fn thieves_near(&self, center: Pos) -> usize {
        physics::thieves_near(&self.entities, center)
    }
}

// ── Movement with side effects ──

impl WorldState {
    /// Push the marble `id` one cell along `dir`. Landing on a lone pit
    /// destroys both and still counts as a successful push.
    pub fn try_push(&mut self, id: EntityId, dir: Dir, events: &mut Vec<GameEvent>) -> bool {
        let from = match self.get(id) {
            Some(e) if e.is_present() => e.pos,
            _ => return false,
        };
        let to = from.step(dir);
        match physics::push_target(&self.entities, self.bounds, to) {
            PushTarget::Clear => {
                if let Some(e) = self.get_mut(id) {
                    e.pos = to;
                }
                events.push(GameEvent::ObstaclePushed { to });
                true
            }
            PushTarget::Pit(pit) => {
                self.kill(id);
                self.kill(pit);
                log::debug!("marble {id:?} sank into pit {pit:?} at {to:?}");
                events.push(GameEvent::ObstacleSunk { at: to });
                true
            }
            PushTarget::Blocked => false,
        }
    }

    /// Step the avatar along `dir`, pushing a marble if one is in the way.
    /// Facing is the caller's job.
    pub fn try_move_avatar(&mut self, dir: Dir, events: &mut Vec<GameEvent>) -> bool {
        let target = self.avatar.pos.step(dir);
        let open = match physics::avatar_move(&self.entities, self.bounds, target) {
            AvatarMove::Open => true,
            AvatarMove::Push(id) => self.try_push(id, dir, events),
            AvatarMove::Blocked => false,
        };
        if open {
            self.avatar.pos = target;
        }
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::GoodieKind;
    use crate::sim::level::test_support::world_from;

    #[test]
    fn ids_stay_sorted_after_reap() {
        let mut w = world_from(&["@    "], 1);
        let a = w.spawn(Pos::new(1, 0), Dir::Right, Kind::Pea);
        let b = w.spawn(Pos::new(2, 0), Dir::Right, Kind::Pea);
        let c = w.spawn(Pos::new(3, 0), Dir::Right, Kind::Pea);
        w.kill(b);
        assert_eq!(w.reap(), 1);
        assert!(w.get(b).is_none());
        assert_eq!(w.get(a).map(|e| e.pos), Some(Pos::new(1, 0)));
        assert_eq!(w.get(c).map(|e| e.pos), Some(Pos::new(3, 0)));
        let d = w.spawn(Pos::new(4, 0), Dir::Right, Kind::Pea);
        assert!(d > c);
        assert_eq!(w.index_of(d), Some(2));
    }

    #[test]
    fn killed_entity_absent_before_reap() {
        let mut w = world_from(&["@#  "], 1);
        let wall = w.entities[0].id;
        let mut ev = vec![];
        w.kill(wall);
        assert_eq!(w.entities.len(), 1);
        assert_eq!(w.entities_at(Pos::new(1, 0)).count(), 0);
        assert!(w.enemy_can_enter(Pos::new(1, 0)));
        assert!(w.try_move_avatar(Dir::Right, &mut ev));
    }

    #[test]
    fn avatar_blocked_by_wall() {
        let mut w = world_from(&["@#"], 1);
        let mut ev = vec![];
        assert!(!w.try_move_avatar(Dir::Right, &mut ev));
        assert_eq!(w.avatar.pos, Pos::new(0, 0));
    }

    #[test]
    fn avatar_walks_over_pickups() {
        let mut w = world_from(&["@e*x"], 1);
        let mut ev = vec![];
        for _ in 0..3 {
            assert!(w.try_move_avatar(Dir::Right, &mut ev));
        }
        assert_eq!(w.avatar.pos, Pos::new(3, 0));
    }

    #[test]
    fn push_marble_into_empty() {
        let mut w = world_from(&["@b  "], 1);
        let mut ev = vec![];
        assert!(w.try_move_avatar(Dir::Right, &mut ev));
        assert_eq!(w.avatar.pos, Pos::new(1, 0));
        assert_eq!(w.entities[0].pos, Pos::new(2, 0));
        assert_eq!(ev, vec![GameEvent::ObstaclePushed { to: Pos::new(2, 0) }]);
    }

    #[test]
    fn push_marble_blocked_keeps_everything() {
        let mut w = world_from(&["@bb "], 1);
        let mut ev = vec![];
        // Two marbles in a row: the first cannot move.
        assert!(!w.try_move_avatar(Dir::Right, &mut ev));
        assert_eq!(w.avatar.pos, Pos::new(0, 0));
        assert_eq!(w.entities[0].pos, Pos::new(1, 0));
        assert!(ev.is_empty());
    }

    #[test]
    fn push_marble_into_goodie_blocked() {
        let mut w = world_from(&["@ba "], 1);
        let mut ev = vec![];
        assert!(!w.try_move_avatar(Dir::Right, &mut ev));
    }

    #[test]
    fn push_marble_into_pit_destroys_both() {
        let mut w = world_from(&["@bo "], 1);
        let mut ev = vec![];
        assert!(w.try_move_avatar(Dir::Right, &mut ev));
        assert_eq!(w.avatar.pos, Pos::new(1, 0));
        assert!(w.entities.iter().all(|e| !e.alive));
        assert_eq!(ev, vec![GameEvent::ObstacleSunk { at: Pos::new(2, 0) }]);
        w.reap();
        // The old pit cell is now plain floor.
        assert!(w.try_move_avatar(Dir::Right, &mut ev));
        assert_eq!(w.avatar.pos, Pos::new(2, 0));
    }

    #[test]
    fn pit_blocks_avatar_until_filled() {
        let mut w = world_from(&["@o"], 1);
        let mut ev = vec![];
        assert!(!w.try_move_avatar(Dir::Right, &mut ev));
    }

    #[test]
    fn hidden_pickup_not_found() {
        let mut w = world_from(&["@a"], 1);
        let id = w.entities[0].id;
        assert_eq!(w.pickup_at(Pos::new(1, 0)), Some(id));
        w.get_mut(id).unwrap().detectable = false;
        assert_eq!(w.pickup_at(Pos::new(1, 0)), None);
        assert!(matches!(w.entities[0].kind, Kind::Goodie(GoodieKind::Ammo)));
    }
}
