//! Color sources for chart series and segments.
//!
//! Reshaping never reaches for a global random generator; callers hand in a
//! [`ColorSource`] so the same rows can be reshaped deterministically.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An RGB color, displayed in chart.js form `rgb(r,g,b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized color '{0}'")]
pub struct ParseColorError(pub String);

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Accepts `rgb(r,g,b)`, `#rrggbb`, and a handful of color names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseColorError(s.to_string());

        if let Some(inner) = s.strip_prefix("rgb(").and_then(|rest| rest.strip_suffix(')')) {
            let channels: Vec<u8> = inner
                .split(',')
                .map(|c| c.trim().parse::<u8>())
                .collect::<Result<_, _>>()
                .map_err(|_| err())?;
            return match channels.as_slice() {
                [r, g, b] => Ok(Rgb::new(*r, *g, *b)),
                _ => Err(err()),
            };
        }

        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(err());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
            return Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?));
        }

        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Rgb::new(255, 0, 0)),
            "green" => Ok(Rgb::new(0, 255, 0)),
            "blue" => Ok(Rgb::new(0, 0, 255)),
            "black" => Ok(Rgb::new(0, 0, 0)),
            "white" => Ok(Rgb::new(255, 255, 255)),
            "yellow" => Ok(Rgb::new(255, 255, 0)),
            "cyan" => Ok(Rgb::new(0, 255, 255)),
            "magenta" => Ok(Rgb::new(255, 0, 255)),
            "orange" => Ok(Rgb::new(255, 159, 64)),
            _ => Err(err()),
        }
    }
}

/// Supplies one display color per series or segment
pub trait ColorSource {
    fn next_color(&mut self) -> Rgb;
}

impl<C: ColorSource + ?Sized> ColorSource for &mut C {
    fn next_color(&mut self) -> Rgb {
        (**self).next_color()
    }
}

impl<C: ColorSource + ?Sized> ColorSource for Box<C> {
    fn next_color(&mut self) -> Rgb {
        (**self).next_color()
    }
}

/// Uniformly random channels in [0, 255]
pub struct RandomRgb<R: Rng = ThreadRng> {
    rng: R,
}

impl RandomRgb<ThreadRng> {
    /// Unseeded; colors differ on every run
    pub fn new() -> Self {
        Self { rng: rand::thread_rng() }
    }
}

impl Default for RandomRgb<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomRgb<StdRng> {
    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl<R: Rng> ColorSource for RandomRgb<R> {
    fn next_color(&mut self) -> Rgb {
        Rgb::new(
            self.rng.gen_range(0..=255),
            self.rng.gen_range(0..=255),
            self.rng.gen_range(0..=255),
        )
    }
}

/// Cycles through a fixed list of colors
#[derive(Debug, Clone)]
pub struct FixedPalette {
    colors: Vec<Rgb>,
    next: usize,
}

impl FixedPalette {
    /// Panics on an empty color list
    pub fn new(colors: Vec<Rgb>) -> Self {
        assert!(!colors.is_empty(), "palette needs at least one color");
        Self { colors, next: 0 }
    }

    /// The d3 category10 scheme
    pub fn category10() -> Self {
        Self::new(vec![
            Rgb::new(31, 119, 180),
            Rgb::new(255, 127, 14),
            Rgb::new(44, 160, 44),
            Rgb::new(214, 39, 40),
            Rgb::new(148, 103, 189),
            Rgb::new(140, 86, 75),
            Rgb::new(227, 119, 194),
            Rgb::new(127, 127, 127),
            Rgb::new(188, 189, 34),
            Rgb::new(23, 190, 207),
        ])
    }

    /// Red, orange, yellow, green, blue as used by the status doughnut
    pub fn status_defaults() -> Self {
        Self::new(vec![
            Rgb::new(255, 99, 132),
            Rgb::new(255, 159, 64),
            Rgb::new(255, 205, 86),
            Rgb::new(75, 192, 192),
            Rgb::new(54, 162, 235),
        ])
    }

    /// Color at `idx`, wrapping around the palette
    pub fn get(&self, idx: usize) -> Rgb {
        self.colors[idx % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl FromStr for FixedPalette {
    type Err = ParseColorError;

    /// `category10`, `status`, or a comma-separated list of colors
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "category10" => Ok(Self::category10()),
            "status" => Ok(Self::status_defaults()),
            list => {
                let colors = split_colors(list)
                    .map(str::parse::<Rgb>)
                    .collect::<Result<Vec<_>, _>>()?;
                if colors.is_empty() {
                    return Err(ParseColorError(s.to_string()));
                }
                Ok(Self::new(colors))
            }
        }
    }
}

/// Split on commas outside `rgb(...)`
fn split_colors(list: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty())
}

impl ColorSource for FixedPalette {
    fn next_color(&mut self) -> Rgb {
        let color = self.get(self.next);
        self.next = (self.next + 1) % self.colors.len();
        color
    }
}
