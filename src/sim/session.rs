/// Game session: level progression, lives, and the pauses between levels.
///
/// The session is the driver side of the world contract. It owns the score
/// service and the dice, loads levels, calls `step()` while playing, and turns
/// `TickStatus` into phase changes:
///
///   Playing ──PlayerDied──→ Dying ──(pause)──→ Playing (same level)
///      │          └──(no lives left)──→ GameOver
///      └──LevelFinished──→ LevelComplete ──(pause)──→ Playing (next level)
///                                              └──(no more levels)──→ GameWon
///
/// A level that fails to load ends in `LoadError`, except that running out of
/// level files after clearing at least one level is a win.

use rand_pcg::Pcg32;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::domain::ai::RngDice;
use crate::domain::entity::FrameInput;
use super::event::GameEvent;
use super::level::{load_level, LevelError, LevelSource};
use super::score::{ScoreSink, Scoreboard};
use super::step::{step, TickStatus};
use super::world::WorldState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Dying { ticks_left: u32 },
    LevelComplete { ticks_left: u32 },
    GameOver,
    GameWon,
    LoadError(String),
}

/// What one session tick amounted to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameStatus {
    Continue,
    PlayerDied,
    LevelFinished,
    LevelLoadError,
    AllLevelsWon,
}

pub struct SessionTick {
    pub status: GameStatus,
    pub events: Vec<GameEvent>,
}

impl SessionTick {
    fn quiet(status: GameStatus) -> Self {
        SessionTick { status, events: Vec::new() }
    }
}

pub struct GameSession {
    source: LevelSource,
    dice: RngDice<Pcg32>,
    dying_ticks: u32,
    complete_ticks: u32,
    pub scoreboard: Scoreboard,
    pub level: u32,
    pub world: Option<WorldState>,
    pub phase: Phase,
    levels_cleared: u32,
    pub seed: u64,
}

impl GameSession {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_source(config, LevelSource::detect(&config.levels_dir))
    }

    pub fn with_source(config: &GameConfig, source: LevelSource) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("session seed {seed}");
        let mut session = GameSession {
            source,
            dice: RngDice::new(Pcg32::seed_from_u64(seed)),
            dying_ticks: config.speed.dying_ticks,
            complete_ticks: config.speed.complete_ticks,
            scoreboard: Scoreboard::new(config.start_lives),
            level: 0,
            world: None,
            phase: Phase::Playing,
            levels_cleared: 0,
            seed,
        };
        session.start_level();
        session
    }

    /// (Re)load `self.level` and enter the matching phase.
    fn start_level(&mut self) -> GameStatus {
        match load_level(&self.source, self.level) {
            Ok(world) => {
                self.world = Some(world);
                self.phase = Phase::Playing;
                GameStatus::Continue
            }
            Err(LevelError::Missing(what)) if self.levels_cleared > 0 => {
                log::info!("{what}: no more levels, game won");
                self.world = None;
                self.phase = Phase::GameWon;
                GameStatus::AllLevelsWon
            }
            Err(e) => {
                log::error!("{e}");
                self.world = None;
                self.phase = Phase::LoadError(e.to_string());
                GameStatus::LevelLoadError
            }
        }
    }

    /// Throw away the current level state and start it over. Lives are kept.
    pub fn restart_level(&mut self) -> GameStatus {
        match self.phase {
            Phase::Playing | Phase::Dying { .. } => {
                log::info!("restarting level {}", self.level);
                self.start_level()
            }
            _ => GameStatus::Continue,
        }
    }

    /// Advance one tick of whichever phase is active.
    pub fn advance(&mut self, input: FrameInput) -> SessionTick {
        match self.phase.clone() {
            Phase::Playing => self.play(input),
            Phase::Dying { ticks_left: 0 } => SessionTick::quiet(self.start_level()),
            Phase::Dying { ticks_left } => {
                self.phase = Phase::Dying { ticks_left: ticks_left - 1 };
                SessionTick::quiet(GameStatus::Continue)
            }
            Phase::LevelComplete { ticks_left: 0 } => {
                self.level += 1;
                SessionTick::quiet(self.start_level())
            }
            Phase::LevelComplete { ticks_left } => {
                self.phase = Phase::LevelComplete { ticks_left: ticks_left - 1 };
                SessionTick::quiet(GameStatus::Continue)
            }
            Phase::GameOver | Phase::GameWon | Phase::LoadError(_) => {
                SessionTick::quiet(GameStatus::Continue)
            }
        }
    }

    fn play(&mut self, input: FrameInput) -> SessionTick {
        let Some(world) = self.world.as_mut() else {
            return SessionTick::quiet(GameStatus::Continue);
        };
        let outcome = step(world, input, &mut self.scoreboard, &mut self.dice);

        let status = match outcome.status {
            TickStatus::Continue => GameStatus::Continue,
            TickStatus::PlayerDied => {
                self.phase = if self.scoreboard.lives() == 0 {
                    log::info!("game over with score {}", self.scoreboard.score);
                    Phase::GameOver
                } else {
                    Phase::Dying { ticks_left: self.dying_ticks }
                };
                GameStatus::PlayerDied
            }
            TickStatus::LevelFinished => {
                self.levels_cleared += 1;
                self.phase = Phase::LevelComplete { ticks_left: self.complete_ticks };
                GameStatus::LevelFinished
            }
        };
        SessionTick { status, events: outcome.events }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver | Phase::GameWon | Phase::LoadError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Action, Kind};
    use crate::domain::grid::{Dir, Pos};
    use crate::sim::level::level_file_name;
    use tempfile::TempDir;

    fn config() -> GameConfig {
        let mut cfg = GameConfig::default();
        cfg.seed = Some(11);
        cfg.speed.dying_ticks = 2;
        cfg.speed.complete_ticks = 1;
        cfg
    }

    /// Session over a scratch levels directory. Keep the `TempDir` alive for
    /// the whole test; it is removed on drop, pass or fail.
    fn session_in(levels: &[(u32, &str)]) -> (GameSession, TempDir) {
        let dir = TempDir::new().unwrap();
        for (n, text) in levels {
            std::fs::write(dir.path().join(level_file_name(*n)), text).unwrap();
        }
        let source = LevelSource::Directory(dir.path().to_path_buf());
        (GameSession::with_source(&config(), source), dir)
    }

    /// Avatar one step left of the exit, nothing else.
    fn one_step_level() -> String {
        let mut rows = vec!["###############".to_string()];
        rows.push("#@x           #".into());
        for _ in 0..12 {
            rows.push("#             #".into());
        }
        rows.push("###############".into());
        rows.join("\n")
    }

    /// A pea one cell from an avatar with one hit left.
    fn doom(s: &mut GameSession) {
        let w = s.world.as_mut().unwrap();
        w.avatar.hp = 2;
        w.spawn(Pos::new(2, 1), Dir::Left, Kind::Pea);
    }

    fn right() -> FrameInput {
        FrameInput { action: Some(Action::Move(Dir::Right)) }
    }

    #[test]
    fn built_in_session_starts_playing() {
        let s = GameSession::with_source(&config(), LevelSource::Embedded);
        assert_eq!(s.phase, Phase::Playing);
        assert_eq!(s.level, 0);
        assert_eq!(s.scoreboard.lives, 3);
        assert!(s.world.is_some());
    }

    #[test]
    fn missing_first_level_is_load_error() {
        let (s, _dir) = session_in(&[]);
        assert!(matches!(s.phase, Phase::LoadError(_)));
        assert!(s.is_over());
    }

    #[test]
    fn malformed_level_is_load_error() {
        let (s, _dir) = session_in(&[(0, "###\n#@#\n###\n")]);
        match &s.phase {
            Phase::LoadError(msg) => assert!(msg.contains("rows"), "{msg}"),
            other => panic!("unexpected phase {other:?}"),
        }
    }

    #[test]
    fn scratch_levels_removed_even_after_a_failed_assert() {
        let mut seen = None;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let (_s, dir) = session_in(&[(0, &one_step_level())]);
            seen = Some(dir.path().to_path_buf());
            panic!("assertion failed mid-test");
        }));
        assert!(result.is_err());
        assert!(seen.is_some_and(|p| !p.exists()));
    }

    #[test]
    fn clearing_last_level_wins() {
        let level = one_step_level();
        let (mut s, _dir) = session_in(&[(0, &level), (1, &level)]);

        assert_eq!(s.advance(right()).status, GameStatus::LevelFinished);
        assert_eq!(s.phase, Phase::LevelComplete { ticks_left: 1 });
        assert_eq!(s.advance(FrameInput::default()).status, GameStatus::Continue);
        assert_eq!(s.advance(FrameInput::default()).status, GameStatus::Continue);
        assert_eq!((s.level, s.phase.clone()), (1, Phase::Playing));

        assert_eq!(s.advance(right()).status, GameStatus::LevelFinished);
        s.advance(FrameInput::default());
        assert_eq!(s.advance(FrameInput::default()).status, GameStatus::AllLevelsWon);
        assert_eq!(s.phase, Phase::GameWon);
        // Two completions, each 2000 + the bonus left after one tick.
        assert_eq!(s.scoreboard.score, 2 * (2000 + 999));
    }

    #[test]
    fn death_costs_a_life_and_restarts() {
        let level = one_step_level();
        let (mut s, _dir) = session_in(&[(0, &level)]);
        doom(&mut s);
        assert_eq!(s.advance(FrameInput::default()).status, GameStatus::PlayerDied);
        assert_eq!(s.scoreboard.lives, 2);
        assert_eq!(s.phase, Phase::Dying { ticks_left: 2 });
        for _ in 0..3 {
            s.advance(FrameInput::default());
        }
        assert_eq!(s.phase, Phase::Playing);
        assert!(s.world.as_ref().is_some_and(|w| w.avatar.alive && w.tick == 0));
    }

    #[test]
    fn last_life_ends_game() {
        let level = one_step_level();
        let (mut s, _dir) = session_in(&[(0, &level)]);
        s.scoreboard.lives = 1;
        doom(&mut s);
        assert_eq!(s.advance(FrameInput::default()).status, GameStatus::PlayerDied);
        assert_eq!(s.phase, Phase::GameOver);
        assert!(s.is_over());
    }

    #[test]
    fn restart_reloads_level_keeping_score() {
        let mut s = GameSession::with_source(&config(), LevelSource::Embedded);
        s.advance(FrameInput::default());
        s.scoreboard.score = 120;
        assert_eq!(s.restart_level(), GameStatus::Continue);
        assert_eq!(s.world.as_ref().map(|w| w.tick), Some(0));
        assert_eq!(s.scoreboard.score, 120);
    }

    #[test]
    fn fixed_seed_replays_identically() {
        let a = GameSession::with_source(&config(), LevelSource::Embedded);
        let b = GameSession::with_source(&config(), LevelSource::Embedded);
        let (mut a, mut b) = (a, b);
        for _ in 0..300 {
            a.advance(FrameInput::default());
            b.advance(FrameInput::default());
        }
        let pos = |s: &GameSession| -> Vec<_> {
            s.world.as_ref().map(|w| w.entities.iter().map(|e| (e.id, e.pos)).collect())
                .unwrap_or_default()
        };
        assert_eq!(pos(&a), pos(&b));
    }
}
