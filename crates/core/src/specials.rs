//! Special piece resolver - what a classified match earns, and where it lands

use crate::matcher::MatchResult;
use crate::types::{Color, Orientation, Position, SpecialKind};

/// A special piece to place after a match is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecialSpawn {
    pub kind: SpecialKind,
    pub color: Color,
    pub position: Position,
}

/// Special earned by a match, if any.
///
/// L/T shapes win over length and always spawn at the pivot. Straight runs of 4 and
/// 5+ spawn on the swapped cell when the player's swap touched the match (`to`
/// first), otherwise at the pivot.
pub fn resolve_special(
    m: &MatchResult,
    swap: Option<(Position, Position)>,
) -> Option<SpecialSpawn> {
    if m.is_l_shape {
        return Some(SpecialSpawn {
            kind: SpecialKind::AreaClear,
            color: m.color,
            position: m.pivot,
        });
    }

    let kind = match m.length {
        0..=3 => return None,
        // A run clears across itself.
        4 => match m.orientation {
            Orientation::Horizontal => SpecialKind::ColumnClear,
            Orientation::Vertical => SpecialKind::RowClear,
        },
        _ => SpecialKind::ColorClear,
    };

    let position = swap
        .and_then(|(from, to)| [to, from].into_iter().find(|&p| m.contains(p)))
        .unwrap_or(m.pivot);

    Some(SpecialSpawn {
        kind,
        color: m.color,
        position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::matcher::find_matches;

    fn only_match(rows: &[&str]) -> MatchResult {
        let board = Board::from_layout(rows).unwrap();
        let mut matches = find_matches(&board);
        assert_eq!(matches.len(), 1);
        matches.remove(0)
    }

    #[test]
    fn run_of_three_earns_nothing() {
        let m = only_match(&["RRRG", "GBYB", "BYGY"]);
        assert_eq!(resolve_special(&m, None), None);
    }

    #[test]
    fn horizontal_four_makes_column_clear_at_pivot() {
        let m = only_match(&["GGGG", "RBYB", "BYRY"]);
        let spawn = resolve_special(&m, None).unwrap();
        assert_eq!(spawn.kind, SpecialKind::ColumnClear);
        assert_eq!(spawn.position, Position::new(0, 2));
        assert_eq!(spawn.color, Color::Green);
    }

    #[test]
    fn vertical_four_makes_row_clear() {
        let m = only_match(&["BR", "BG", "BY", "BG"]);
        let spawn = resolve_special(&m, None).unwrap();
        assert_eq!(spawn.kind, SpecialKind::RowClear);
    }

    #[test]
    fn four_spawns_on_swapped_cell_inside_match() {
        let m = only_match(&["GGGG", "RBYB", "BYRY"]);
        let swap = (Position::new(1, 0), Position::new(0, 0));
        let spawn = resolve_special(&m, Some(swap)).unwrap();
        assert_eq!(spawn.position, Position::new(0, 0));

        let outside = (Position::new(1, 1), Position::new(2, 1));
        let spawn = resolve_special(&m, Some(outside)).unwrap();
        assert_eq!(spawn.position, m.pivot);
    }

    #[test]
    fn five_makes_color_clear() {
        let m = only_match(&["BBBBB", "RGRGR", "GRGRG"]);
        let spawn = resolve_special(&m, None).unwrap();
        assert_eq!(spawn.kind, SpecialKind::ColorClear);
        assert_eq!(spawn.position, Position::new(0, 2));
    }

    #[test]
    fn l_shape_beats_length_and_uses_pivot() {
        let m = only_match(&["YYYYG", "YBGBR", "YGBGB"]);
        assert_eq!(m.length, 4);
        let swap = (Position::new(1, 3), Position::new(0, 3));
        let spawn = resolve_special(&m, Some(swap)).unwrap();
        assert_eq!(spawn.kind, SpecialKind::AreaClear);
        assert_eq!(spawn.position, Position::new(0, 0));
    }
}
