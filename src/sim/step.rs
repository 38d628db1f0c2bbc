/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Bonus countdown, tick counter
///   2. Snapshot of live entity ids
///   3. Avatar (move / push / fire)
///   4. Every snapshotted entity in creation order, skipping the dead
///   5. Reap
///   6. Terminal status (player died → life lost, level finished → payout)
///
/// Entities created during this tick (projectiles, spawned thieves) are not in
/// the snapshot and first act on the next tick. Once the avatar dies or the
/// level finishes, the rest of the pass is skipped; the reap still runs.

use crate::domain::ai::{self, Dice};
use crate::domain::entity::{Action, EntityId, FrameInput, GoodieKind, Kind, Thief, ThiefTier};
use crate::domain::grid::{Dir, Pos};
use crate::domain::physics::Contact;
use crate::domain::rules;
use super::event::GameEvent;
use super::score::ScoreSink;
use super::world::WorldState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickStatus {
    Continue,
    PlayerDied,
    LevelFinished,
}

#[derive(Debug)]
pub struct StepOutcome {
    pub status: TickStatus,
    pub events: Vec<GameEvent>,
}

/// Collaborators threaded through every behavior for one tick.
struct Ctx<'a> {
    score: &'a mut dyn ScoreSink,
    dice: &'a mut dyn Dice,
    events: Vec<GameEvent>,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(
    world: &mut WorldState,
    input: FrameInput,
    score: &mut dyn ScoreSink,
    dice: &mut dyn Dice,
) -> StepOutcome {
    // Terminal worlds do not advance.
    if let Some(status) = terminal_status(world) {
        return StepOutcome { status, events: Vec::new() };
    }

    let mut cx = Ctx { score, dice, events: Vec::new() };

    world.bonus = world.bonus.saturating_sub(1);
    world.tick += 1;
    let snapshot = world.live_ids();

    update_avatar(world, input, &mut cx);

    for id in snapshot {
        if terminal_status(world).is_some() { break; }
        let kind = match world.get(id) {
            Some(e) if e.alive && e.born < world.tick => e.kind.clone(),
            _ => continue,
        };
        match kind {
            Kind::Pea => update_pea(world, id, &mut cx),
            Kind::Crystal => update_crystal(world, id, &mut cx),
            Kind::Exit { .. } => update_exit(world, id, &mut cx),
            Kind::Goodie(goodie) => update_goodie(world, id, goodie, &mut cx),
            Kind::Patroller { .. } => update_patroller(world, id, &mut cx),
            Kind::Thief(_) => update_thief(world, id, &mut cx),
            Kind::Spawner { tier } => update_spawner(world, id, tier, &mut cx),
            Kind::Wall | Kind::Pit | Kind::Marble { .. } => {}
        }
    }

    let reaped = world.reap();
    if reaped > 0 {
        log::trace!("tick {}: reaped {reaped} entities", world.tick);
    }

    let status = terminal_status(world).unwrap_or(TickStatus::Continue);
    match status {
        TickStatus::PlayerDied => {
            cx.score.lose_life();
            log::info!("level {}: avatar died on tick {}", world.level, world.tick);
        }
        TickStatus::LevelFinished => {
            cx.score.add_score(rules::LEVEL_COMPLETE_SCORE + world.bonus);
            log::info!(
                "level {}: finished on tick {} with bonus {}",
                world.level, world.tick, world.bonus,
            );
        }
        TickStatus::Continue => {}
    }

    StepOutcome { status, events: cx.events }
}

fn terminal_status(world: &WorldState) -> Option<TickStatus> {
    if !world.avatar.alive {
        Some(TickStatus::PlayerDied)
    } else if world.finished {
        Some(TickStatus::LevelFinished)
    } else {
        None
    }
}

// ══════════════════════════════════════════════════════════════
// Avatar
// ══════════════════════════════════════════════════════════════

fn update_avatar(world: &mut WorldState, input: FrameInput, cx: &mut Ctx) {
    match input.action {
        Some(Action::Move(dir)) => {
            world.avatar.dir = dir;
            world.try_move_avatar(dir, &mut cx.events);
        }
        Some(Action::Fire) => {
            if world.avatar.ammo == 0 { return; }
            world.avatar.ammo -= 1;
            let dir = world.avatar.dir;
            let at = world.avatar.pos.step(dir);
            if world.bounds.contains(at) {
                world.spawn(at, dir, Kind::Pea);
            }
            cx.events.push(GameEvent::PlayerFired);
        }
        None => {}
    }
}

fn damage_avatar(world: &mut WorldState, cx: &mut Ctx) {
    let avatar = &mut world.avatar;
    avatar.hp -= rules::PEA_DAMAGE;
    if avatar.hp <= 0 {
        avatar.alive = false;
        cx.events.push(GameEvent::PlayerDied);
    } else {
        cx.events.push(GameEvent::PlayerHit { hp: avatar.hp });
    }
}

// ══════════════════════════════════════════════════════════════
// Projectiles
// ══════════════════════════════════════════════════════════════

/// Two-phase check: the current cell, then (after moving) the next one.
/// A stop in the first phase ends the tick for this projectile.
fn update_pea(world: &mut WorldState, id: EntityId, cx: &mut Ctx) {
    let (pos, dir) = match world.get(id) {
        Some(e) => (e.pos, e.dir),
        None => return,
    };
    if resolve_pea(world, id, pos, cx) { return; }

    let next = pos.step(dir);
    if !world.bounds.contains(next) {
        world.kill(id);
        return;
    }
    if let Some(e) = world.get_mut(id) {
        e.pos = next;
    }
    resolve_pea(world, id, next, cx);
}

/// Apply whatever the projectile meets at `pos`. Returns true if it stopped.
fn resolve_pea(world: &mut WorldState, pea: EntityId, pos: Pos, cx: &mut Ctx) -> bool {
    let contact = world.projectile_contact(pos, pea);
    match contact {
        Contact::Avatar => damage_avatar(world, cx),
        Contact::Damage(target) => damage_entity(world, target, cx),
        Contact::Block | Contact::PassOver | Contact::Nothing => {}
    }
    if contact.stops() {
        world.kill(pea);
    }
    contact.stops()
}

fn damage_entity(world: &mut WorldState, id: EntityId, cx: &mut Ctx) {
    let Some(e) = world.get_mut(id) else { return };
    let at = e.pos;
    let Some(hp) = e.hit_points_mut() else { return };
    *hp -= rules::PEA_DAMAGE;
    let dead = *hp <= 0;

    match &mut e.kind {
        Kind::Marble { .. } => {
            if dead {
                e.alive = false;
                log::debug!("marble {id:?} destroyed at {at:?}");
            }
        }
        Kind::Patroller { .. } => {
            if dead {
                e.alive = false;
                cx.score.add_score(rules::PATROLLER_SCORE);
                cx.events.push(GameEvent::EnemyDied { at });
            } else {
                cx.events.push(GameEvent::EnemyHit { at });
            }
        }
        Kind::Thief(thief) => {
            if dead {
                let loot = thief.carried.take();
                let reward = thief.tier.kill_score();
                e.alive = false;
                if let Some(loot) = loot {
                    drop_loot(world, loot, at);
                }
                cx.score.add_score(reward);
                cx.events.push(GameEvent::EnemyDied { at });
                log::debug!("thief {id:?} died at {at:?}, dropped {loot:?}");
            } else {
                cx.events.push(GameEvent::EnemyHit { at });
            }
        }
        _ => {}
    }
}

/// Make a carried pickup visible again at `at`.
fn drop_loot(world: &mut WorldState, loot: EntityId, at: Pos) {
    if let Some(g) = world.get_mut(loot) {
        g.pos = at;
        g.detectable = true;
    }
}

// ══════════════════════════════════════════════════════════════
// Pickups and exit
// ══════════════════════════════════════════════════════════════

fn update_crystal(world: &mut WorldState, id: EntityId, cx: &mut Ctx) {
    let Some(e) = world.get(id) else { return };
    if e.pos != world.avatar.pos { return; }

    world.kill(id);
    world.crystals_left = world.crystals_left.saturating_sub(1);
    cx.score.add_score(rules::CRYSTAL_SCORE);
    cx.events.push(GameEvent::CrystalCollected { remaining: world.crystals_left });
}

fn update_exit(world: &mut WorldState, id: EntityId, cx: &mut Ctx) {
    if !world.exit_active() { return; }
    let on_exit = world.avatar.pos;
    let Some(e) = world.get_mut(id) else { return };

    if let Kind::Exit { revealed } = &mut e.kind {
        if !*revealed {
            *revealed = true;
            cx.events.push(GameEvent::ExitRevealed);
            log::info!("exit revealed at {:?}", e.pos);
        }
    }
    if e.pos == on_exit {
        world.finished = true;
        cx.events.push(GameEvent::LevelCompleted);
    }
}

fn update_goodie(world: &mut WorldState, id: EntityId, kind: GoodieKind, cx: &mut Ctx) {
    let Some(e) = world.get(id) else { return };
    if !e.detectable || e.pos != world.avatar.pos { return; }

    match kind {
        GoodieKind::ExtraLife => {
            cx.score.gain_life();
            cx.score.add_score(rules::EXTRA_LIFE_SCORE);
        }
        GoodieKind::RestoreHealth => {
            world.avatar.hp = rules::AVATAR_HP;
            cx.score.add_score(rules::RESTORE_HEALTH_SCORE);
        }
        GoodieKind::Ammo => {
            world.avatar.ammo += rules::AMMO_REFILL;
            cx.score.add_score(rules::AMMO_SCORE);
        }
    }
    world.kill(id);
    cx.events.push(GameEvent::PickupCollected { kind });
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

/// Shoot along `dir` if the avatar is in sight. Returns true if fired.
fn try_fire(world: &mut WorldState, from: Pos, dir: Dir, cx: &mut Ctx) -> bool {
    if !world.line_of_sight(from, dir) { return false; }
    world.spawn(from.step(dir), dir, Kind::Pea);
    cx.events.push(GameEvent::EnemyFired { at: from });
    true
}

fn update_patroller(world: &mut WorldState, id: EntityId, cx: &mut Ctx) {
    if !rules::can_act(world.tick, world.level) { return; }
    let (pos, dir) = match world.get(id) {
        Some(e) => (e.pos, e.dir),
        None => return,
    };

    if try_fire(world, pos, dir, cx) { return; }

    let ahead = pos.step(dir);
    let (dir, to) = if world.enemy_can_enter(ahead) {
        (dir, Some(ahead))
    } else {
        let back = dir.reverse();
        let behind = pos.step(back);
        // Turn around, but only step if that cell is open too.
        (back, world.enemy_can_enter(behind).then_some(behind))
    };

    if let Some(e) = world.get_mut(id) {
        e.dir = dir;
        if let Some(to) = to {
            e.pos = to;
        }
    }
}

fn update_thief(world: &mut WorldState, id: EntityId, cx: &mut Ctx) {
    if !rules::can_act(world.tick, world.level) { return; }
    let (pos, dir, thief) = match world.get(id) {
        Some(e) => match e.thief() {
            Some(t) => (e.pos, e.dir, t.clone()),
            None => return,
        },
        None => return,
    };

    // (a) shoot
    if thief.tier.fires() && try_fire(world, pos, dir, cx) { return; }

    // (b) steal
    if thief.carried.is_none() && cx.dice.steal_roll() {
        if let Some(loot) = world.pickup_at(pos) {
            if let Some(g) = world.get_mut(loot) {
                g.detectable = false;
            }
            with_thief(world, id, |t| t.carried = Some(loot));
            cx.events.push(GameEvent::PickupStolen { at: pos });
            log::debug!("thief {id:?} picked up {loot:?} at {pos:?}");
            return;
        }
    }

    // (c) keep walking
    let ahead = pos.step(dir);
    if thief.walked < thief.budget && world.enemy_can_enter(ahead) {
        move_thief(world, id, ahead, dir);
        return;
    }

    // (d) turn
    let budget = cx.dice.walk_budget();
    with_thief(world, id, |t| {
        t.budget = budget;
        t.walked = 0;
    });
    let rolled = cx.dice.direction();
    for d in ai::turn_order(rolled) {
        let to = pos.step(d);
        if world.enemy_can_enter(to) {
            move_thief(world, id, to, d);
            return;
        }
    }
    if let Some(e) = world.get_mut(id) {
        e.dir = rolled;
    }
}

fn with_thief(world: &mut WorldState, id: EntityId, f: impl FnOnce(&mut Thief)) {
    if let Some(Kind::Thief(t)) = world.get_mut(id).map(|e| &mut e.kind) {
        f(t);
    }
}

/// Step a thief (and whatever it carries) to `to`, facing `dir`.
fn move_thief(world: &mut WorldState, id: EntityId, to: Pos, dir: Dir) {
    let mut carried = None;
    if let Some(e) = world.get_mut(id) {
        e.pos = to;
        e.dir = dir;
        if let Kind::Thief(t) = &mut e.kind {
            t.walked += 1;
            carried = t.carried;
        }
    }
    if let Some(loot) = carried.and_then(|g| world.get_mut(g)) {
        loot.pos = to;
    }
}

fn update_spawner(world: &mut WorldState, id: EntityId, tier: ThiefTier, cx: &mut Ctx) {
    let Some(pos) = world.get(id).map(|e| e.pos) else { return };
    if world.thieves_near(pos) >= rules::SPAWNER_CAP { return; }
    if !cx.dice.spawn_roll() { return; }

    let Some(at) = Dir::ALL.into_iter()
        .map(|d| pos.step(d))
        .find(|&p| world.enemy_can_enter(p))
    else {
        return;
    };
    let thief = Thief::new(tier, cx.dice.walk_budget());
    let new_id = world.spawn(at, Dir::Right, Kind::Thief(thief));
    cx.events.push(GameEvent::EnemySpawned { at });
    log::debug!("spawner {id:?} produced {tier:?} thief {new_id:?} at {at:?}");
}
