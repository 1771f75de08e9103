//! Game variants, colors and the per-variant tunables.

use std::fmt;
use std::str::FromStr;

use crate::error::VariantParseError;
use crate::geometry::GeometryKind;

/// Player color. Variants have 2 to 4 colors, played in index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Color(pub u8);

impl Color {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this color moves first in its pair of a symmetric variant.
    #[inline]
    pub fn is_first_of_pair(self) -> bool {
        self.0 % 2 == 0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 4] = ["blue", "yellow", "red", "green"];
        write!(f, "{}", NAMES.get(self.index()).copied().unwrap_or("?"))
    }
}

/// Board geometry shared between variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoardType {
    Duo,
    Classic,
    Trigon,
    Trigon3,
}

impl BoardType {
    pub fn geometry_kind(self) -> GeometryKind {
        match self {
            BoardType::Duo | BoardType::Classic => GeometryKind::Square,
            BoardType::Trigon | BoardType::Trigon3 => GeometryKind::Trigon,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Two colors on a 14x14 board.
    Duo,
    /// Four players on a 20x20 board.
    Classic,
    /// Two players with two colors each on a 20x20 board.
    Classic2,
    /// Four players on a hexagon of triangles.
    Trigon,
    /// Two players with two colors each on a hexagon of triangles.
    Trigon2,
    /// Three players on a smaller hexagon.
    Trigon3,
}

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::Duo,
        Variant::Classic,
        Variant::Classic2,
        Variant::Trigon,
        Variant::Trigon2,
        Variant::Trigon3,
    ];

    pub fn board_type(self) -> BoardType {
        match self {
            Variant::Duo => BoardType::Duo,
            Variant::Classic | Variant::Classic2 => BoardType::Classic,
            Variant::Trigon | Variant::Trigon2 => BoardType::Trigon,
            Variant::Trigon3 => BoardType::Trigon3,
        }
    }

    pub fn nu_colors(self) -> u8 {
        match self {
            Variant::Duo => 2,
            Variant::Trigon3 => 3,
            _ => 4,
        }
    }

    pub fn nu_players(self) -> u8 {
        match self {
            Variant::Duo | Variant::Classic2 | Variant::Trigon2 => 2,
            Variant::Trigon3 => 3,
            Variant::Classic | Variant::Trigon => 4,
        }
    }

    pub fn colors(self) -> impl Iterator<Item = Color> {
        (0..self.nu_colors()).map(Color)
    }

    /// Color that moves after `c`.
    #[inline]
    pub fn next(self, c: Color) -> Color {
        Color((c.0 + 1) % self.nu_colors())
    }

    /// The team partner of `c`, or `c` itself if each player has one color.
    #[inline]
    pub fn second_color(self, c: Color) -> Color {
        if self.nu_colors() > self.nu_players() {
            Color((c.0 + 2) % 4)
        } else {
            c
        }
    }

    /// Player who owns color `c`.
    #[inline]
    pub fn player(self, c: Color) -> usize {
        c.index() % self.nu_players() as usize
    }

    /// Variants where the second player can mirror the first one.
    pub fn is_symmetric(self) -> bool {
        matches!(self, Variant::Duo | Variant::Trigon2)
    }

    /// Number of pieces on board from which a still symmetric position ends
    /// the playout as a draw.
    pub fn symmetry_min_nu_pieces(self) -> u32 {
        match self {
            Variant::Trigon2 => 5,
            _ => 3,
        }
    }

    /// Gamma factors `(piece size, piece attach points)` of the playout
    /// policy.
    pub fn gamma_factors(self) -> (f64, f64) {
        match self.board_type() {
            BoardType::Classic => (5.0, 1.0),
            BoardType::Duo => (3.0, 1.8),
            BoardType::Trigon | BoardType::Trigon3 => (5.0, 1.0),
        }
    }

    /// Number of pieces on board from which all pieces are considered in
    /// move generation.
    pub fn min_move_all_considered(self) -> u32 {
        4 * self.nu_colors() as u32
    }

    /// Smallest piece size considered with `nu_onboard` pieces on board.
    pub fn min_considered_size(self, nu_onboard: u32, max_size: usize) -> usize {
        let nu_colors = self.nu_colors() as u32;
        if nu_onboard < 2 * nu_colors {
            max_size
        } else if nu_onboard < self.min_move_all_considered() {
            max_size - 1
        } else {
            1
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Variant::Duo => "duo",
            Variant::Classic => "classic",
            Variant::Classic2 => "classic_2",
            Variant::Trigon => "trigon",
            Variant::Trigon2 => "trigon_2",
            Variant::Trigon3 => "trigon_3",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Variant {
    type Err = VariantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VariantParseError(s.to_string()))
    }
}
