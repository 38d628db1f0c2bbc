/// Enemy decision randomness.
///
/// Enemy behaviors never touch a generator directly; they ask a `Dice`.
/// The session owns a seeded `Pcg32` and wraps it in `RngDice`, so a whole
/// level replays identically for a given seed. Tests can script the dice.

use rand::Rng;

use super::grid::Dir;

pub trait Dice {
    /// Steps a thief walks before turning: uniform in 1..=6.
    fn walk_budget(&mut self) -> u32;
    /// 1-in-10 chance a thief grabs the pickup it stands on.
    fn steal_roll(&mut self) -> bool;
    /// 1-in-50 chance a spawner produces a thief this tick.
    fn spawn_roll(&mut self) -> bool;
    /// Uniformly random facing.
    fn direction(&mut self) -> Dir;
}

/// `Dice` backed by any `rand` generator.
pub struct RngDice<R> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        RngDice { rng }
    }
}

impl<R: Rng> Dice for RngDice<R> {
    fn walk_budget(&mut self) -> u32 {
        self.rng.random_range(1..=6)
    }

    fn steal_roll(&mut self) -> bool {
        self.rng.random_ratio(1, 10)
    }

    fn spawn_roll(&mut self) -> bool {
        self.rng.random_ratio(1, 50)
    }

    fn direction(&mut self) -> Dir {
        Dir::ALL[self.rng.random_range(0..Dir::ALL.len())]
    }
}

/// Directions a blocked thief tries: the rolled one first, then the
/// remaining three in the fixed `Dir::ALL` order.
pub fn turn_order(first: Dir) -> impl Iterator<Item = Dir> {
    std::iter::once(first).chain(Dir::ALL.into_iter().filter(move |&d| d != first))
}

#[cfg(test)]
pub mod scripted {
    //! Deterministic dice for behavior tests.

    use std::collections::VecDeque;

    use super::{Dice, Dir};

    /// Returns queued answers; falls back to "no" / 1 / `Right` when empty.
    #[derive(Default)]
    pub struct ScriptedDice {
        pub budgets: VecDeque<u32>,
        pub steals: VecDeque<bool>,
        pub spawns: VecDeque<bool>,
        pub dirs: VecDeque<Dir>,
    }

    impl Dice for ScriptedDice {
        fn walk_budget(&mut self) -> u32 { self.budgets.pop_front().unwrap_or(1) }
        fn steal_roll(&mut self) -> bool { self.steals.pop_front().unwrap_or(false) }
        fn spawn_roll(&mut self) -> bool { self.spawns.pop_front().unwrap_or(false) }
        fn direction(&mut self) -> Dir { self.dirs.pop_front().unwrap_or(Dir::Right) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn walk_budget_covers_one_to_six() {
        let mut dice = RngDice::new(Pcg32::seed_from_u64(7));
        let mut seen = [false; 7];
        for _ in 0..600 {
            let b = dice.walk_budget();
            assert!((1..=6).contains(&b), "budget {b} out of range");
            seen[b as usize] = true;
        }
        assert!(seen[1..].iter().all(|&s| s));
    }

    #[test]
    fn same_seed_same_rolls() {
        let mut a = RngDice::new(Pcg32::seed_from_u64(99));
        let mut b = RngDice::new(Pcg32::seed_from_u64(99));
        for _ in 0..50 {
            assert_eq!(a.direction(), b.direction());
            assert_eq!(a.spawn_roll(), b.spawn_roll());
            assert_eq!(a.walk_budget(), b.walk_budget());
        }
    }

    #[test]
    fn steal_roll_is_rare() {
        let mut dice = RngDice::new(Pcg32::seed_from_u64(3));
        let hits = (0..10_000).filter(|_| dice.steal_roll()).count();
        assert!((700..1300).contains(&hits), "hits = {hits}");
    }

    #[test]
    fn turn_order_rolled_first_then_fixed() {
        let order: Vec<Dir> = turn_order(Dir::Left).collect();
        assert_eq!(order, vec![Dir::Left, Dir::Up, Dir::Down, Dir::Right]);
        let order: Vec<Dir> = turn_order(Dir::Up).collect();
        assert_eq!(order, vec![Dir::Up, Dir::Down, Dir::Left, Dir::Right]);
    }
}
