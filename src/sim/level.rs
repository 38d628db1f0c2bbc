/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `levelNN.txt` files)
///   2. Built-in embedded levels
///
/// ## File format (`levelNN.txt`, NN = two-digit level number):
///   Exactly 15 lines of exactly 15 characters. Every border cell is a wall,
///   and there is exactly one avatar start and exactly one exit.
///
/// ## Tile legend:
///   ' ' / '.' = Empty            '#' = Wall
///   '@' = Avatar start           'x' = Exit
///   'b' = Marble (pushable)      'o' = Pit
///   '*' = Crystal                'h' / 'v' = Horizontal / vertical patroller
///   '1' = Thief spawner          '2' = Mean thief spawner
///   'e' = Extra life             'r' = Restore health       'a' = Ammo

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::entity::{Avatar, GoodieKind, Kind, ThiefTier};
use crate::domain::grid::{Dir, Pos};
use crate::domain::physics::Bounds;
use crate::domain::rules;
use crate::domain::tile::Tile;
use crate::sim::world::WorldState;

pub const LEVEL_SIZE: usize = 15;
/// File names only have room for two digits.
pub const MAX_LEVEL: u32 = 99;

const EMBEDDED: &[&str] = &[
    include_str!("../../levels/level00.txt"),
    include_str!("../../levels/level01.txt"),
];

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("no level data at {0}")]
    Missing(String),
    #[error("level {level}, line {line}: {reason}")]
    Malformed {
        level: u32,
        line: usize,
        reason: String,
    },
}

/// A validated level: one token per cell, row-major.
pub struct LevelGrid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Tile>,
    pub avatar: Pos,
}

impl LevelGrid {
    pub fn tile_at(&self, x: usize, y: usize) -> Tile {
        self.cells[y * self.width + x]
    }
}

/// Where level text comes from.
#[derive(Clone, Debug)]
pub enum LevelSource {
    Directory(PathBuf),
    Embedded,
}

impl LevelSource {
    /// The configured directory if it exists, otherwise the built-in levels.
    pub fn detect(levels_dir: &Path) -> Self {
        if levels_dir.is_dir() {
            LevelSource::Directory(levels_dir.to_path_buf())
        } else {
            log::info!("{} not found; using built-in levels", levels_dir.display());
            LevelSource::Embedded
        }
    }

    pub fn read(&self, level: u32) -> Result<String, LevelError> {
        if level > MAX_LEVEL {
            return Err(LevelError::Missing(format!("level {level}")));
        }
        match self {
            LevelSource::Directory(dir) => {
                let path = dir.join(level_file_name(level));
                std::fs::read_to_string(&path)
                    .map_err(|_| LevelError::Missing(path.display().to_string()))
            }
            LevelSource::Embedded => EMBEDDED
                .get(level as usize)
                .map(|text| text.to_string())
                .ok_or_else(|| LevelError::Missing(format!("built-in level {level}"))),
        }
    }
}

pub fn level_file_name(level: u32) -> String {
    format!("level{level:02}.txt")
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Read, validate and bootstrap one level.
pub fn load_level(source: &LevelSource, level: u32) -> Result<WorldState, LevelError> {
    let text = source.read(level)?;
    let grid = parse_level(&text, level)?;
    let world = bootstrap(&grid, level);
    log::info!(
        "loaded level {level}: {} entities, {} crystals",
        world.entities.len(), world.crystals_left,
    );
    Ok(world)
}

pub fn parse_level(text: &str, level: u32) -> Result<LevelGrid, LevelError> {
    let malformed = |line: usize, reason: String| LevelError::Malformed { level, line, reason };

    let mut rows: Vec<&str> = text.lines().collect();
    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.len() != LEVEL_SIZE {
        return Err(malformed(rows.len().min(LEVEL_SIZE) + 1,
            format!("expected {LEVEL_SIZE} rows, found {}", rows.len())));
    }

    let mut cells = Vec::with_capacity(LEVEL_SIZE * LEVEL_SIZE);
    let mut avatars = vec![];
    let mut exits = 0;

    for (y, row) in rows.iter().enumerate() {
        let line = y + 1;
        let width = row.chars().count();
        if width != LEVEL_SIZE {
            return Err(malformed(line, format!("expected {LEVEL_SIZE} columns, found {width}")));
        }
        for (x, ch) in row.chars().enumerate() {
            let tile = Tile::from_char(ch)
                .ok_or_else(|| malformed(line, format!("unknown character {ch:?} at column {}", x + 1)))?;
            let border = x == 0 || y == 0 || x == LEVEL_SIZE - 1 || y == LEVEL_SIZE - 1;
            if border && !tile.is_wall() {
                return Err(malformed(line, format!("border cell at column {} is not a wall", x + 1)));
            }
            match tile {
                Tile::AvatarStart => avatars.push(Pos::new(x as i32, y as i32)),
                Tile::Exit => exits += 1,
                _ => {}
            }
            cells.push(tile);
        }
    }

    let avatar = match avatars.as_slice() {
        [only] => *only,
        _ => return Err(malformed(0, format!("expected one avatar start, found {}", avatars.len()))),
    };
    if exits != 1 {
        return Err(malformed(0, format!("expected one exit, found {exits}")));
    }

    Ok(LevelGrid { width: LEVEL_SIZE, height: LEVEL_SIZE, cells, avatar })
}

/// Turn tokens into entities, row-major, and count crystals.
pub fn bootstrap(grid: &LevelGrid, level: u32) -> WorldState {
    let bounds = Bounds { width: grid.width as i32, height: grid.height as i32 };
    let mut world = WorldState::new(level, bounds, Avatar::new(grid.avatar));

    for y in 0..grid.height {
        for x in 0..grid.width {
            let pos = Pos::new(x as i32, y as i32);
            let (dir, kind) = match grid.tile_at(x, y) {
                Tile::Empty | Tile::AvatarStart => continue,
                Tile::Wall => (Dir::Right, Kind::Wall),
                Tile::Pit => (Dir::Right, Kind::Pit),
                Tile::Marble => (Dir::Right, Kind::Marble { hp: rules::MARBLE_HP }),
                Tile::Exit => (Dir::Right, Kind::Exit { revealed: false }),
                Tile::HorizontalPatroller => (Dir::Right, Kind::Patroller { hp: rules::PATROLLER_HP }),
                Tile::VerticalPatroller => (Dir::Down, Kind::Patroller { hp: rules::PATROLLER_HP }),
                Tile::ThiefSpawner => (Dir::Right, Kind::Spawner { tier: ThiefTier::Regular }),
                Tile::MeanThiefSpawner => (Dir::Right, Kind::Spawner { tier: ThiefTier::Mean }),
                Tile::Crystal => {
                    world.crystals_left += 1;
                    (Dir::Right, Kind::Crystal)
                }
                Tile::ExtraLife => (Dir::Right, Kind::Goodie(GoodieKind::ExtraLife)),
                Tile::RestoreHealth => (Dir::Right, Kind::Goodie(GoodieKind::RestoreHealth)),
                Tile::Ammo => (Dir::Right, Kind::Goodie(GoodieKind::Ammo)),
            };
            world.spawn(pos, dir, kind);
        }
    }
    world
}

#[cfg(test)]
pub mod test_support {
    //! Small unvalidated worlds drawn as strings.

    use super::*;

    /// Any rectangle, no border or exit rules. Exactly one '@' is required.
    pub fn world_from(rows: &[&str], level: u32) -> WorldState {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut cells = vec![Tile::Empty; width * rows.len()];
        let mut avatar = None;
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let tile = Tile::from_char(ch).unwrap_or_else(|| panic!("bad test tile {ch:?}"));
                if tile == Tile::AvatarStart {
                    assert!(avatar.is_none(), "two avatars in test grid");
                    avatar = Some(Pos::new(x as i32, y as i32));
                }
                cells[y * width + x] = tile;
            }
        }
        let grid = LevelGrid {
            width,
            height: rows.len(),
            cells,
            avatar: avatar.expect("test grid needs an '@'"),
        };
        bootstrap(&grid, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_rows() -> Vec<String> {
        let mut rows = vec!["###############".to_string()];
        rows.push("#@   *   h    #".into());
        for _ in 0..11 {
            rows.push("#             #".into());
        }
        rows.push("#  1  v   *  x#".into());
        rows.push("###############".into());
        rows
    }

    fn parse_rows(rows: &[String]) -> Result<LevelGrid, LevelError> {
        parse_level(&rows.join("\n"), 3)
    }

    fn malformed_line(err: LevelError) -> usize {
        match err {
            LevelError::Malformed { line, .. } => line,
            other => panic!("expected malformed, got {other}"),
        }
    }

    #[test]
    fn built_in_levels_are_valid() {
        for level in 0..EMBEDDED.len() as u32 {
            let world = load_level(&LevelSource::Embedded, level).unwrap();
            assert_eq!(world.level, level);
            assert!(world.crystals_left > 0);
        }
    }

    #[test]
    fn past_last_built_in_is_missing() {
        let err = load_level(&LevelSource::Embedded, EMBEDDED.len() as u32).err().unwrap();
        assert!(matches!(err, LevelError::Missing(_)));
    }

    #[test]
    fn level_above_99_is_missing() {
        let dir = LevelSource::Directory(PathBuf::from("."));
        assert!(matches!(dir.read(100), Err(LevelError::Missing(_))));
    }

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(level_file_name(0), "level00.txt");
        assert_eq!(level_file_name(7), "level07.txt");
        assert_eq!(level_file_name(42), "level42.txt");
    }

    #[test]
    fn parses_valid_grid() {
        let grid = parse_rows(&valid_rows()).unwrap();
        assert_eq!(grid.avatar, Pos::new(1, 1));
        assert_eq!(grid.tile_at(9, 1), Tile::HorizontalPatroller);
        assert_eq!(grid.tile_at(13, 13), Tile::Exit);
    }

    #[test]
    fn trailing_blank_lines_and_crlf_accepted() {
        let text = valid_rows().join("\r\n") + "\r\n\r\n";
        assert!(parse_level(&text, 0).is_ok());
    }

    #[test]
    fn wrong_row_count_rejected() {
        let mut rows = valid_rows();
        rows.remove(5);
        assert_eq!(malformed_line(parse_rows(&rows).err().unwrap()), 15);
    }

    #[test]
    fn wrong_width_rejected() {
        let mut rows = valid_rows();
        rows[4] = "#            #".into();
        assert_eq!(malformed_line(parse_rows(&rows).err().unwrap()), 5);
    }

    #[test]
    fn unknown_character_reports_line() {
        let mut rows = valid_rows();
        rows[6] = "#     Q       #".into();
        let err = parse_rows(&rows).err().unwrap();
        assert!(err.to_string().contains("'Q'"), "{err}");
        assert_eq!(malformed_line(err), 7);
    }

    #[test]
    fn open_border_rejected() {
        let mut rows = valid_rows();
        rows[8] = "              #".into();
        assert_eq!(malformed_line(parse_rows(&rows).err().unwrap()), 9);
    }

    #[test]
    fn avatar_and_exit_must_be_unique() {
        let mut rows = valid_rows();
        rows[2] = "#  @          #".into();
        assert!(parse_rows(&rows).is_err());

        let mut rows = valid_rows();
        rows[2] = "#  x          #".into();
        assert!(parse_rows(&rows).is_err());

        let mut rows = valid_rows();
        rows[13] = "#  1  v   *   #".into();
        assert!(parse_rows(&rows).is_err());
    }

    #[test]
    fn bootstrap_orients_and_counts() {
        let grid = parse_rows(&valid_rows()).unwrap();
        let world = bootstrap(&grid, 3);
        assert_eq!(world.crystals_left, 2);
        assert_eq!(world.avatar.pos, Pos::new(1, 1));
        assert_eq!(world.avatar.hp, rules::AVATAR_HP);

        let dirs: Vec<Dir> = world.entities.iter()
            .filter(|e| matches!(e.kind, Kind::Patroller { .. }))
            .map(|e| e.dir)
            .collect();
        assert_eq!(dirs, vec![Dir::Right, Dir::Down]);

        // Creation order is row-major.
        let ids: Vec<u32> = world.entities.iter().map(|e| e.id.0).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(world.entities.iter().all(|e| e.born == 0));
    }

    #[test]
    fn directory_source_reads_numbered_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("level04.txt"), valid_rows().join("\n")).unwrap();

        let source = LevelSource::detect(tmp.path());
        assert!(matches!(source, LevelSource::Directory(_)));
        let world = load_level(&source, 4).unwrap();
        assert_eq!(world.level, 4);
        assert!(matches!(load_level(&source, 5), Err(LevelError::Missing(_))));
    }

    #[test]
    fn missing_directory_falls_back_to_built_in() {
        let source = LevelSource::detect(Path::new("/definitely/not/a/levels/dir"));
        assert!(matches!(source, LevelSource::Embedded));
    }
}
