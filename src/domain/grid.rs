/// Grid coordinates and the four movement directions.
///
/// y grows downward: row 0 is the top line of a level file.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    /// The neighbouring cell one step along `dir`.
    #[inline]
    pub fn step(self, dir: Dir) -> Pos {
        let (dx, dy) = dir.delta();
        Pos { x: self.x + dx, y: self.y + dy }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Fixed fallback order used when an enemy looks for a way out.
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up    => (0, -1),
            Dir::Down  => (0, 1),
            Dir::Left  => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    pub fn reverse(self) -> Dir {
        match self {
            Dir::Up    => Dir::Down,
            Dir::Down  => Dir::Up,
            Dir::Left  => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_follows_delta() {
        let p = Pos::new(5, 5);
        assert_eq!(p.step(Dir::Up), Pos::new(5, 4));
        assert_eq!(p.step(Dir::Down), Pos::new(5, 6));
        assert_eq!(p.step(Dir::Left), Pos::new(4, 5));
        assert_eq!(p.step(Dir::Right), Pos::new(6, 5));
    }

    #[test]
    fn reverse_is_involution() {
        for d in Dir::ALL {
            assert_eq!(d.reverse().reverse(), d);
            assert_ne!(d.reverse(), d);
        }
    }
}
