//! JSON request/response schema shared by the HTTP server and `--json` CLI output.

use serde::{Deserialize, Serialize};

use crate::guillotine::Cut;
use crate::scoring::Stats;
use crate::strategy::Solution;
use crate::types::{Algorithm, BoardConfig, Options, Piece, PieceSpec};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub pieces: Vec<PieceSpec>,
    pub board: BoardConfig,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub boards: Vec<BoardResponse>,
    pub unplaced: Vec<UnplacedPiece>,
    pub algorithm: Algorithm,
    pub stats: Stats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    pub usable_width: u32,
    pub usable_height: u32,
    pub utilization: f64,
    pub pieces: Vec<PlacedPiece>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cuts: Vec<Cut>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedPiece {
    pub name: String,
    pub group: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
    pub material: String,
    pub thickness: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnplacedPiece {
    pub name: String,
    pub group: usize,
    pub width: u32,
    pub height: u32,
}

impl From<&Piece> for UnplacedPiece {
    fn from(p: &Piece) -> Self {
        Self {
            name: p.name.clone(),
            group: p.group,
            width: p.size.w,
            height: p.size.h,
        }
    }
}

impl From<&Solution> for OptimizeResponse {
    fn from(solution: &Solution) -> Self {
        let boards = solution
            .boards
            .iter()
            .map(|b| BoardResponse {
                id: b.id,
                width: b.config.width,
                height: b.config.height,
                usable_width: b.usable.w,
                usable_height: b.usable.h,
                utilization: b.utilization(),
                pieces: b
                    .pieces
                    .iter()
                    .filter_map(|p| {
                        let placement = p.placement?;
                        Some(PlacedPiece {
                            name: p.name.clone(),
                            group: p.group,
                            x: placement.x,
                            y: placement.y,
                            width: placement.rect.w,
                            height: placement.rect.h,
                            rotated: placement.rotated,
                            material: p.material.clone(),
                            thickness: p.thickness,
                        })
                    })
                    .collect(),
                cuts: b.cuts().to_vec(),
            })
            .collect();

        Self {
            boards,
            unplaced: solution.unplaced.iter().map(UnplacedPiece::from).collect(),
            algorithm: solution.algorithm,
            stats: solution.stats,
            score: solution.score,
        }
    }
}
