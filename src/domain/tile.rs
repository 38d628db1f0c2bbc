/// Level cell tokens, as read from a level file.
/// Tokens only exist at bootstrap time; the world turns each one into
/// an entity (or the avatar) at the matching coordinates.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Pit,
    Marble,             // pushable obstacle
    Exit,
    AvatarStart,
    HorizontalPatroller,
    VerticalPatroller,
    ThiefSpawner,       // spawns regular thieves
    MeanThiefSpawner,   // spawns mean thieves
    Crystal,
    ExtraLife,
    RestoreHealth,
    Ammo,
}

impl Tile {
    /// Decode one level-file character. `None` = unknown character.
    pub fn from_char(ch: char) -> Option<Tile> {
        let tile = match ch {
            ' ' | '.' => Tile::Empty,
            '#' => Tile::Wall,
            'o' => Tile::Pit,
            'b' => Tile::Marble,
            'x' => Tile::Exit,
            '@' => Tile::AvatarStart,
            'h' => Tile::HorizontalPatroller,
            'v' => Tile::VerticalPatroller,
            '1' => Tile::ThiefSpawner,
            '2' => Tile::MeanThiefSpawner,
            '*' => Tile::Crystal,
            'e' => Tile::ExtraLife,
            'r' => Tile::RestoreHealth,
            'a' => Tile::Ammo,
            _ => return None,
        };
        Some(tile)
    }

    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }
}
