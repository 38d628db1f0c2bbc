/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound; the core never waits on them.

use crate::domain::entity::GoodieKind;
use crate::domain::grid::Pos;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    EnemySpawned { at: Pos },
    EnemyFired { at: Pos },
    EnemyHit { at: Pos },
    EnemyDied { at: Pos },
    PickupStolen { at: Pos },
    PickupCollected { kind: GoodieKind },
    CrystalCollected { remaining: u32 },
    PlayerHit { hp: i32 },
    PlayerDied,
    PlayerFired,
    ObstaclePushed { to: Pos },
    ObstacleSunk { at: Pos },
    ExitRevealed,
    LevelCompleted,
}
