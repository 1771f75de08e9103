//! Detection of positions that are symmetric under the point reflection of
//! the board, with the colors of each pair of players exchanged.
//!
//! In the symmetric variants the second color of a pair can answer every
//! move of the first color with its mirror image. Such positions are scored
//! as a draw in the playouts, which pushes the first player to break the
//! symmetry early.

use crate::board::Board;
use crate::variant::Color;

/// Color that mirrors `c` (0 <-> 1, 2 <-> 3).
#[inline]
pub fn mirror_color(c: Color) -> Color {
    Color(c.0 ^ 1)
}

/// Check if the position is no longer symmetric.
///
/// If the first color of a pair is to play, every point must be mirrored by
/// a point of the mirror color. If the second color is to play, the last
/// move of the first color is allowed to be unanswered as long as its
/// mirror points are still empty.
pub fn is_symmetry_broken(bd: &Board) -> bool {
    let geo = bd.geometry();
    if !bd.variant().is_symmetric() || !geo.is_point_symmetric() {
        return true;
    }
    let to_play = bd.to_play();
    let mut last_points: &[_] = &[];
    if !to_play.is_first_of_pair() {
        match bd.moves().last() {
            Some(last) if last.mv.is_regular() && last.color == mirror_color(to_play) => {
                last_points = bd.board_const().move_info(last.mv).points();
            }
            Some(_) => return true,
            None => {}
        }
    }
    for &p in geo.points() {
        let symm = geo.symmetric_point(p);
        if last_points.contains(&p) {
            if bd.point_state(symm).is_some() {
                return true;
            }
            continue;
        }
        let expected = bd.point_state(p).map(mirror_color);
        if bd.point_state(symm) != expected && !last_points.contains(&symm) {
            return true;
        }
    }
    false
}
