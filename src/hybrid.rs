use crate::bfdh::BestFitDecreasingHeight;
use crate::blf::BottomLeftFill;
use crate::error::{OptimizeError, Result};
use crate::guillotine::Guillotine;
use crate::strategy::{PlacementStrategy, RunContext, Solution};
use crate::types::{Algorithm, Piece};

/// Runs every base heuristic on the same pieces and keeps the best-scoring
/// layout. The result stays tagged with the heuristic that produced it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hybrid;

impl Hybrid {
    pub fn strategies() -> [&'static dyn PlacementStrategy; 3] {
        [&BottomLeftFill, &BestFitDecreasingHeight, &Guillotine]
    }
}

impl PlacementStrategy for Hybrid {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Hybrid
    }

    fn pack(&self, pieces: &[Piece], ctx: &RunContext<'_>) -> Result<Solution> {
        let mut best: Option<(Solution, f64)> = None;
        let mut failures = Vec::new();

        for strategy in Self::strategies() {
            let algorithm = strategy.algorithm();
            match strategy.pack(pieces, ctx) {
                Ok(solution) => {
                    let score = solution.score();
                    if ctx.summaries() {
                        tracing::info!(
                            %algorithm,
                            boards = solution.board_count(),
                            unplaced = solution.unplaced.len(),
                            score = format_args!("{score:.2}"),
                            "strategy finished"
                        );
                    }
                    if best.as_ref().is_none_or(|(_, s)| score > *s) {
                        best = Some((solution, score));
                    }
                }
                Err(e) if e.is_abort() => return Err(e),
                Err(e) => {
                    if ctx.summaries() {
                        tracing::warn!(%algorithm, error = %e, "strategy failed, skipping");
                    }
                    failures.push(format!("{algorithm}: {e}"));
                }
            }
        }

        match best {
            Some((solution, score)) => Ok(solution.with_score(score)),
            None => Err(OptimizeError::AllStrategiesFailed(failures.join("; "))),
        }
    }
}
