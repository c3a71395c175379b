//! Pyramid level candidates and their ordering.

/// A resolution level as declared by a vendor descriptor.
///
/// Only the width is needed to order levels; height and tile geometry are
/// read from the directory once the level is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    /// Directory holding the level's tiles
    pub directory: i64,

    /// Declared width in pixels
    pub width: i64,
}

/// Accumulates level candidates in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl LevelTable {
    /// Levels ordered widest first.
    ///
    /// The sort is stable, so levels of equal width keep the order they
    /// were pushed in.
    pub fn into_sorted(mut self) -> Vec<Level> {
        self.levels.sort_by(|a, b| b.width.cmp(&a.width));
        self.levels
    }
}

impl FromIterator<Level> for LevelTable {
    fn from_iter<I: IntoIterator<Item = Level>>(iter: I) -> Self {
        Self {
            levels: iter.into_iter().collect(),
        }
    }
}
