/// Score and lives bookkeeping.
///
/// The simulation only reports deltas through `ScoreSink`; whoever drives the
/// session decides what a life count of zero means.

pub trait ScoreSink {
    fn add_score(&mut self, points: u32);
    fn gain_life(&mut self);
    fn lose_life(&mut self);
    fn lives(&self) -> u32;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scoreboard {
    pub score: u32,
    pub lives: u32,
}

impl Scoreboard {
    pub fn new(lives: u32) -> Self {
        Scoreboard { score: 0, lives }
    }
}

impl ScoreSink for Scoreboard {
    fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    fn gain_life(&mut self) {
        self.lives = self.lives.saturating_add(1);
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }

    fn lives(&self) -> u32 {
        self.lives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lives_never_underflow() {
        let mut s = Scoreboard::new(1);
        s.lose_life();
        s.lose_life();
        assert_eq!(s.lives, 0);
        s.gain_life();
        assert_eq!(s.lives, 1);
    }

    #[test]
    fn score_accumulates() {
        let mut s = Scoreboard::new(3);
        s.add_score(50);
        s.add_score(2000);
        assert_eq!(s.score, 2050);
    }
}
