//! RNG module - deterministic randomness owned by a session
//!
//! A small LCG drives every random decision in the engine: refill colors, reshuffles,
//! bonus-move targets and level generation. Nothing reads a global generator, so the
//! same seed and the same inputs always replay the same game.
//!
//! [`PieceFactory`] wraps the generator together with the active palette and the piece
//! id counter, so ids restart at 1 for every session.

use crate::types::{Color, Piece};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Scales by the high bits; the low bits of a power-of-two LCG cycle quickly.
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// True with probability `percent / 100`
    pub fn chance(&mut self, percent: u32) -> bool {
        self.next_range(100) < percent
    }

    /// Pick a random element
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_range(items.len() as u32) as usize)
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Current internal state (replays the remaining sequence when fed to `new`)
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Source of fresh pieces for one session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PieceFactory {
    palette: &'static [Color],
    rng: SimpleRng,
    next_id: u32,
}

impl PieceFactory {
    pub fn new(palette: &'static [Color], seed: u32) -> Self {
        Self {
            palette,
            rng: SimpleRng::new(seed),
            next_id: 1,
        }
    }

    pub fn palette(&self) -> &'static [Color] {
        self.palette
    }

    /// Allocate the next piece id
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Make sure future ids come after `last`
    pub fn reserve_ids(&mut self, last: u32) {
        self.next_id = self.next_id.max(last.saturating_add(1));
    }

    /// A plain piece of a random active color
    pub fn spawn(&mut self) -> Piece {
        let color = self.random_color();
        let id = self.next_id();
        Piece::new(color, id)
    }

    /// A plain piece avoiding `excluded`, falling back to any active color when every
    /// color is excluded
    pub fn spawn_excluding(&mut self, excluded: &[Color]) -> Piece {
        let allowed: Vec<Color> = self
            .palette
            .iter()
            .copied()
            .filter(|c| !excluded.contains(c))
            .collect();
        let color = match self.rng.pick(&allowed) {
            Some(&c) => c,
            None => self.random_color(),
        };
        let id = self.next_id();
        Piece::new(color, id)
    }

    pub fn random_color(&mut self) -> Color {
        self.rng.pick(self.palette).copied().unwrap_or(Color::Red)
    }

    pub fn rng_mut(&mut self) -> &mut SimpleRng {
        &mut self.rng
    }
}
