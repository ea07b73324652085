use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{OptimizeError, Result as OptimizeResult};

/// Largest board side or kerf accepted, in millimetres. Keeps every
/// coordinate sum well inside `u32` and every area product inside `i64`.
pub const MAX_BOARD_SIDE: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    /// A rect with a zero side can never be placed.
    pub fn is_degenerate(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Accepts any JSON number for an integral millimetre field. Fractions are
/// rounded; zero, negative and non-finite values collapse to 0.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(clamp_to_u32(value))
}

pub fn clamp_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value.round() as u32
    }
}

fn default_true() -> bool {
    true
}

fn default_quantity() -> u32 {
    1
}

fn default_thickness() -> f64 {
    18.0
}

/// One line of a cut list as entered by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceSpec {
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
    #[serde(
        default = "default_quantity",
        deserialize_with = "deserialize_u32_from_number"
    )]
    pub quantity: u32,
    #[serde(default = "default_true")]
    pub rotatable: bool,
    #[serde(default)]
    pub material: String,
    #[serde(default = "default_thickness")]
    pub thickness: f64,
}

impl PieceSpec {
    pub fn new(name: impl Into<String>, width: u32, height: u32, quantity: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            quantity,
            rotatable: true,
            material: String::new(),
            thickness: default_thickness(),
        }
    }

    pub fn fixed(mut self) -> Self {
        self.rotatable = false;
        self
    }
}

/// Final position of a piece on a board, in usable-area coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub rect: Rect,
    pub x: u32,
    pub y: u32,
    pub rotated: bool,
}

impl Placement {
    pub fn right(&self) -> u32 {
        self.x + self.rect.w
    }

    pub fn top(&self) -> u32 {
        self.y + self.rect.h
    }
}

/// A single unit of a [`PieceSpec`], expanded by quantity.
///
/// The stored size is always the unrotated one; orientation trials are pure
/// and only [`Piece::place`] records the chosen orientation.
#[derive(Debug, Clone)]
pub struct Piece {
    pub name: String,
    /// Index of the spec this piece was expanded from.
    pub group: usize,
    pub size: Rect,
    pub rotatable: bool,
    pub material: String,
    pub thickness: f64,
    pub placement: Option<Placement>,
}

impl Piece {
    pub fn new(name: impl Into<String>, group: usize, size: Rect, rotatable: bool) -> Self {
        Self {
            name: name.into(),
            group,
            size,
            rotatable,
            material: String::new(),
            thickness: default_thickness(),
            placement: None,
        }
    }

    pub fn area(&self) -> u64 {
        self.size.area()
    }

    /// Squares have no effective rotation.
    pub fn can_rotate(&self) -> bool {
        self.rotatable && self.size.w != self.size.h
    }

    pub fn oriented(&self, rotated: bool) -> Rect {
        if rotated { self.size.rotated() } else { self.size }
    }

    /// Orientations to try, unrotated first.
    pub fn orientations(&self, allow_rotation: bool) -> &'static [bool] {
        if allow_rotation && self.can_rotate() {
            &[false, true]
        } else {
            &[false]
        }
    }

    pub fn place(&mut self, x: u32, y: u32, rotated: bool) -> Placement {
        let placement = Placement {
            rect: self.oriented(rotated),
            x,
            y,
            rotated,
        };
        self.placement = Some(placement);
        placement
    }

    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    /// Copy of this piece with its placement cleared.
    pub fn unplaced(&self) -> Self {
        Self {
            placement: None,
            ..self.clone()
        }
    }
}

fn default_margin() -> u32 {
    10
}

fn default_kerf() -> u32 {
    3
}

/// Stock board dimensions and cutting allowances, all in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
    #[serde(
        default = "default_margin",
        deserialize_with = "deserialize_u32_from_number"
    )]
    pub margin: u32,
    #[serde(default = "default_kerf", deserialize_with = "deserialize_u32_from_number")]
    pub kerf: u32,
}

impl BoardConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            margin: default_margin(),
            kerf: default_kerf(),
        }
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_kerf(mut self, kerf: u32) -> Self {
        self.kerf = kerf;
        self
    }

    /// Usable area after removing the margin on every edge.
    pub fn check(&self) -> OptimizeResult<Rect> {
        if self.width > MAX_BOARD_SIDE || self.height > MAX_BOARD_SIDE {
            return Err(OptimizeError::InvalidBoard(format!(
                "board {} exceeds {}mm per side",
                self, MAX_BOARD_SIDE
            )));
        }
        if self.kerf > MAX_BOARD_SIDE {
            return Err(OptimizeError::InvalidBoard(format!(
                "kerf {}mm exceeds {}mm",
                self.kerf, MAX_BOARD_SIDE
            )));
        }
        let inset = self.margin.saturating_mul(2);
        let w = self.width.saturating_sub(inset);
        let h = self.height.saturating_sub(inset);
        if w == 0 || h == 0 {
            return Err(OptimizeError::InvalidBoard(format!(
                "board {} has no usable area",
                self
            )));
        }
        Ok(Rect::new(w, h))
    }

    /// `None` when [`BoardConfig::check`] rejects the board.
    pub fn usable(&self) -> Option<Rect> {
        self.check().ok()
    }
}

impl std::fmt::Display for BoardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} (margin {}, kerf {})",
            self.width, self.height, self.margin, self.kerf
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Algorithm {
    Blf,
    Bfdh,
    Guillotine,
    Genetic,
    #[default]
    Hybrid,
}

impl Algorithm {
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::Blf => "Bottom Left Fill",
            Algorithm::Bfdh => "Best Fit Decreasing Height",
            Algorithm::Guillotine => "Guillotine",
            Algorithm::Genetic => "Genetic",
            Algorithm::Hybrid => "Hybrid Multi-Strategy",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Algorithm::Blf => "BLF",
            Algorithm::Bfdh => "BFDH",
            Algorithm::Guillotine => "GUILLOTINE",
            Algorithm::Genetic => "GENETIC",
            Algorithm::Hybrid => "HYBRID",
        };
        f.write_str(tag)
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BLF" => Ok(Algorithm::Blf),
            "BFDH" => Ok(Algorithm::Bfdh),
            "GUILLOTINE" => Ok(Algorithm::Guillotine),
            "GENETIC" => Ok(Algorithm::Genetic),
            "HYBRID" => Ok(Algorithm::Hybrid),
            _ => Err(format!(
                "invalid algorithm '{}', expected: blf, bfdh, guillotine, genetic, or hybrid",
                s
            )),
        }
    }
}

/// How much a single run reports through `tracing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Summary,
    /// Every committed placement is logged.
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneticParams {
    pub population: usize,
    pub generations: u32,
    pub mutation_rate: f64,
    pub elite_fraction: f64,
    pub tournament_size: usize,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population: 20,
            generations: 50,
            mutation_rate: 0.1,
            elite_fraction: 0.2,
            tournament_size: 3,
        }
    }
}

impl GeneticParams {
    pub fn elite_count(&self) -> usize {
        (self.population as f64 * self.elite_fraction).floor() as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub algorithm: Algorithm,
    /// Advisory only; exceeding it is logged, not enforced.
    pub max_boards: usize,
    pub allow_rotation: bool,
    /// Carried for callers; no algorithm reads it.
    pub error_margin: f64,
    /// Seed for the genetic search; entropy when absent.
    pub seed: Option<u64>,
    pub timeout_ms: Option<u64>,
    /// Upper bound on BLF grid positions per axis.
    pub max_scan_steps: u32,
    pub verbosity: Verbosity,
    pub genetic: GeneticParams,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Hybrid,
            max_boards: 50,
            allow_rotation: true,
            error_margin: 0.1,
            seed: None,
            timeout_ms: None,
            max_scan_steps: 1000,
            verbosity: Verbosity::Summary,
            genetic: GeneticParams::default(),
        }
    }
}

impl Options {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_rotation(mut self, allow: bool) -> Self {
        self.allow_rotation = allow;
        self
    }
}
