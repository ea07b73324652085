use crate::bfdh::BestFitDecreasingHeight;
use crate::blf::BottomLeftFill;
use crate::cancel::CancelToken;
use crate::error::{OptimizeError, Result};
use crate::genetic::Genetic;
use crate::guillotine::Guillotine;
use crate::hybrid::Hybrid;
use crate::strategy::{PlacementStrategy, RunContext, Solution};
use crate::types::{Algorithm, BoardConfig, MAX_BOARD_SIDE, Options, Piece, PieceSpec, Rect};

/// Largest `maxScanSteps` accepted.
pub const MAX_SCAN_STEPS: u32 = 10_000;
/// Upper bound on genetic individuals evaluated, including the initial population.
pub const MAX_GENETIC_EVALUATIONS: u64 = 100_000;
/// Largest expanded cut list accepted.
pub const MAX_PIECES: u64 = 100_000;

/// Entry point: expands a cut list, runs the selected algorithm and returns
/// the boards together with whatever could not be placed.
pub struct Optimizer {
    board: BoardConfig,
    options: Options,
}

impl Optimizer {
    pub fn new(board: BoardConfig, options: Options) -> Self {
        Self { board, options }
    }

    /// Runs with the timeout from the options, if any.
    pub fn optimize(&self, specs: &[PieceSpec]) -> Result<Solution> {
        let cancel = match self.options.timeout_ms {
            Some(ms) => CancelToken::with_timeout(ms),
            None => CancelToken::new(),
        };
        self.optimize_with(specs, &cancel)
    }

    pub fn optimize_with(&self, specs: &[PieceSpec], cancel: &CancelToken) -> Result<Solution> {
        self.validate()?;
        let total: u64 = specs.iter().map(|s| s.quantity as u64).sum();
        if total > MAX_PIECES {
            return Err(OptimizeError::InvalidOptions(format!(
                "{} pieces requested, at most {} allowed",
                total, MAX_PIECES
            )));
        }
        let pieces = expand(specs);
        let ctx = RunContext::new(self.board, &self.options, cancel);

        if ctx.summaries() {
            tracing::info!(
                algorithm = self.options.algorithm.label(),
                specs = specs.len(),
                pieces = pieces.len(),
                board = %self.board,
                "starting optimization"
            );
        }

        let solution = self.strategy().pack(&pieces, &ctx)?;

        if ctx.summaries() {
            tracing::info!(
                algorithm = %solution.algorithm,
                boards = solution.board_count(),
                placed = solution.placed_count(),
                unplaced = solution.unplaced.len(),
                utilization = format_args!("{:.1}%", solution.stats.utilization),
                "optimization finished"
            );
            if solution.board_count() > self.options.max_boards {
                tracing::warn!(
                    boards = solution.board_count(),
                    max_boards = self.options.max_boards,
                    "layout uses more boards than requested"
                );
            }
        }
        Ok(solution)
    }

    fn strategy(&self) -> Box<dyn PlacementStrategy> {
        match self.options.algorithm {
            Algorithm::Blf => Box::new(BottomLeftFill),
            Algorithm::Bfdh => Box::new(BestFitDecreasingHeight),
            Algorithm::Guillotine => Box::new(Guillotine),
            Algorithm::Genetic => Box::new(Genetic::new(self.options.genetic, self.options.seed)),
            Algorithm::Hybrid => Box::new(Hybrid),
        }
    }

    fn validate(&self) -> Result<()> {
        // Only the size limits are checked here; a margin that leaves no
        // usable area fails inside each strategy.
        let b = &self.board;
        if b.width.max(b.height).max(b.kerf) > MAX_BOARD_SIDE {
            b.check()?;
        }

        let g = &self.options.genetic;
        if g.population == 0 {
            return Err(OptimizeError::InvalidOptions(
                "genetic population must be non-zero".to_string(),
            ));
        }
        let evaluations = g.population as u64 * (g.generations as u64 + 1);
        if evaluations > MAX_GENETIC_EVALUATIONS {
            return Err(OptimizeError::InvalidOptions(format!(
                "genetic search of {} x {} exceeds {} evaluations",
                g.population, g.generations, MAX_GENETIC_EVALUATIONS
            )));
        }
        if g.tournament_size > g.population {
            return Err(OptimizeError::InvalidOptions(format!(
                "tournament size {} exceeds population {}",
                g.tournament_size, g.population
            )));
        }
        if !(0.0..=1.0).contains(&g.mutation_rate) {
            return Err(OptimizeError::InvalidOptions(format!(
                "mutation rate {} is outside 0..=1",
                g.mutation_rate
            )));
        }
        if !(0.0..=1.0).contains(&g.elite_fraction) {
            return Err(OptimizeError::InvalidOptions(format!(
                "elite fraction {} is outside 0..=1",
                g.elite_fraction
            )));
        }
        if self.options.max_scan_steps == 0 || self.options.max_scan_steps > MAX_SCAN_STEPS {
            return Err(OptimizeError::InvalidOptions(format!(
                "max scan steps {} is outside 1..={}",
                self.options.max_scan_steps, MAX_SCAN_STEPS
            )));
        }
        Ok(())
    }
}

/// One [`Piece`] per unit of quantity, named `<spec>_<n>` and tagged with the
/// index of the spec it came from. Zero quantities contribute nothing.
pub fn expand(specs: &[PieceSpec]) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for (group, spec) in specs.iter().enumerate() {
        for i in 0..spec.quantity {
            let mut piece = Piece::new(
                format!("{}_{}", spec.name, i + 1),
                group,
                Rect::new(spec.width, spec.height),
                spec.rotatable,
            );
            piece.material = spec.material.clone();
            piece.thickness = spec.thickness;
            pieces.push(piece);
        }
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::solution_score;
    use crate::strategy::testing::assert_solution_valid;
    use crate::types::{GeneticParams, Verbosity};

    const BASE: [Algorithm; 3] = [Algorithm::Blf, Algorithm::Bfdh, Algorithm::Guillotine];
    const ALL: [Algorithm; 5] = [
        Algorithm::Blf,
        Algorithm::Bfdh,
        Algorithm::Guillotine,
        Algorithm::Genetic,
        Algorithm::Hybrid,
    ];

    fn options(algorithm: Algorithm) -> Options {
        Options {
            verbosity: Verbosity::Quiet,
            ..Options::default()
        }
        .with_algorithm(algorithm)
        .with_seed(2024)
    }

    fn quick_genetic(algorithm: Algorithm) -> Options {
        Options {
            genetic: GeneticParams {
                population: 8,
                generations: 6,
                ..GeneticParams::default()
            },
            ..options(algorithm)
        }
    }

    fn cabinet() -> Vec<PieceSpec> {
        vec![
            PieceSpec::new("side", 720, 560, 4),
            PieceSpec::new("shelf", 764, 540, 6),
            PieceSpec::new("door", 716, 396, 4).fixed(),
            PieceSpec::new("back", 800, 720, 2),
            PieceSpec::new("drawer", 400, 150, 8),
        ]
    }

    #[test]
    fn test_expand() {
        let mut specs = vec![PieceSpec::new("a", 100, 50, 3), PieceSpec::new("b", 20, 20, 0)];
        specs[0].material = "MDF".to_string();
        specs.push(PieceSpec::new("c", 10, 10, 1).fixed());
        let pieces = expand(&specs);
        let names: Vec<&str> = pieces.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a_1", "a_2", "a_3", "c_1"]);
        assert_eq!(pieces[3].group, 2);
        assert_eq!(pieces[0].material, "MDF");
        assert!(!pieces[3].rotatable);
    }

    #[test]
    fn test_scenario_single_full_board() {
        let board = BoardConfig::new(1000, 1000).with_margin(0).with_kerf(0);
        let specs = [PieceSpec::new("slab", 1000, 1000, 1)];
        for algorithm in ALL {
            let sol = Optimizer::new(board, quick_genetic(algorithm))
                .optimize(&specs)
                .unwrap();
            assert_solution_valid(&sol, 1);
            assert_eq!(sol.board_count(), 1, "{algorithm}");
            let p = sol.boards[0].pieces[0].placement.unwrap();
            assert_eq!((p.x, p.y), (0, 0));
            assert!((sol.stats.utilization - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_scenario_two_large_pieces_need_two_boards() {
        let board = BoardConfig::new(1000, 1000);
        let specs = [PieceSpec::new("a", 600, 600, 1), PieceSpec::new("b", 600, 600, 1)];
        for algorithm in ALL {
            let sol = Optimizer::new(board, quick_genetic(algorithm))
                .optimize(&specs)
                .unwrap();
            assert_solution_valid(&sol, 2);
            assert_eq!(sol.board_count(), 2, "{algorithm}");
            for b in &sol.boards {
                assert_eq!(b.pieces.len(), 1);
                let p = b.pieces[0].placement.unwrap();
                assert_eq!((p.x, p.y), (0, 0));
            }
        }
    }

    #[test]
    fn test_scenario_oversized_piece_is_unplaced() {
        let board = BoardConfig::new(1000, 1000);
        let specs = [PieceSpec::new("slab", 1500, 1200, 1)];
        for algorithm in ALL {
            let sol = Optimizer::new(board, quick_genetic(algorithm))
                .optimize(&specs)
                .unwrap();
            assert_solution_valid(&sol, 1);
            assert_eq!(sol.board_count(), 0, "{algorithm}");
            assert_eq!(sol.unplaced[0].name, "slab_1");
        }
    }

    #[test]
    fn test_scenario_hybrid_is_best_of_base() {
        let board = BoardConfig::new(2440, 1220);
        let specs = cabinet();
        let hybrid = Optimizer::new(board, options(Algorithm::Hybrid))
            .optimize(&specs)
            .unwrap();
        let best = hybrid.score.unwrap();
        for algorithm in BASE {
            let single = Optimizer::new(board, options(algorithm)).optimize(&specs).unwrap();
            assert!(best >= solution_score(&single.boards), "{algorithm} beat hybrid");
        }
    }

    #[test]
    fn test_invariants_hold_for_every_algorithm() {
        let board = BoardConfig::new(2440, 1220).with_kerf(4);
        let specs = cabinet();
        let total: u32 = specs.iter().map(|s| s.quantity).sum();
        for algorithm in ALL {
            let sol = Optimizer::new(board, quick_genetic(algorithm))
                .optimize(&specs)
                .unwrap();
            assert_solution_valid(&sol, total as usize);
            assert!(sol.unplaced.is_empty(), "{algorithm} left pieces behind");
        }
    }

    #[test]
    fn test_base_strategies_are_deterministic() {
        let board = BoardConfig::new(2440, 1220);
        let specs = cabinet();
        for algorithm in BASE {
            let optimizer = Optimizer::new(board, options(algorithm));
            let a = optimizer.optimize(&specs).unwrap();
            let b = optimizer.optimize(&specs).unwrap();
            let layout = |s: &Solution| {
                s.boards
                    .iter()
                    .flat_map(|b| b.pieces.iter().map(|p| (b.id, p.name.clone(), p.placement)))
                    .collect::<Vec<_>>()
            };
            assert_eq!(layout(&a), layout(&b), "{algorithm}");
        }
    }

    #[test]
    fn test_rotation_disabled_globally() {
        let board = BoardConfig::new(1000, 500).with_margin(0).with_kerf(0);
        let specs = [PieceSpec::new("tall", 400, 1000, 1)];
        for algorithm in [Algorithm::Blf, Algorithm::Bfdh] {
            let rotating = Optimizer::new(board, options(algorithm))
                .optimize(&specs)
                .unwrap();
            assert_eq!(rotating.board_count(), 1);

            let fixed = Optimizer::new(board, options(algorithm).with_rotation(false))
                .optimize(&specs)
                .unwrap();
            assert_eq!(fixed.board_count(), 0);
            assert_eq!(fixed.unplaced.len(), 1);
        }
    }

    #[test]
    fn test_zero_sized_pieces_are_unplaced() {
        let board = BoardConfig::new(1000, 1000);
        let specs = [PieceSpec::new("ghost", 0, 300, 2), PieceSpec::new("real", 300, 300, 1)];
        for algorithm in ALL {
            let sol = Optimizer::new(board, quick_genetic(algorithm))
                .optimize(&specs)
                .unwrap();
            assert_solution_valid(&sol, 3);
            assert_eq!(sol.unplaced.len(), 2, "{algorithm}");
        }
    }

    #[test]
    fn test_invalid_board_is_fatal() {
        let board = BoardConfig::new(100, 100).with_margin(50);
        let specs = [PieceSpec::new("a", 10, 10, 1)];
        let err = Optimizer::new(board, options(Algorithm::Hybrid))
            .optimize(&specs)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::AllStrategiesFailed(_)));

        let err = Optimizer::new(board, options(Algorithm::Blf))
            .optimize(&specs)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidBoard(_)));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut opts = options(Algorithm::Genetic);
        opts.genetic.mutation_rate = 1.5;
        let err = Optimizer::new(BoardConfig::new(1000, 1000), opts)
            .optimize(&[])
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidOptions(_)));
    }

    #[test]
    fn test_huge_board_rejected_for_every_algorithm() {
        let board = BoardConfig::new(4_000_000_000, 4_000_000_000)
            .with_margin(0)
            .with_kerf(0);
        let specs = [
            PieceSpec::new("small", 10, 10, 1),
            PieceSpec::new("vast", 3_000_000_000, 3_000_000_000, 2),
        ];
        for algorithm in ALL {
            let err = Optimizer::new(board, quick_genetic(algorithm))
                .optimize(&specs)
                .unwrap_err();
            assert!(matches!(err, OptimizeError::InvalidBoard(_)), "{algorithm}: {err}");
        }

        let wide_kerf = BoardConfig::new(1000, 1000).with_kerf(u32::MAX);
        let err = Optimizer::new(wide_kerf, options(Algorithm::Blf))
            .optimize(&specs)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidBoard(_)));
    }

    #[test]
    fn test_largest_board_with_huge_pieces() {
        let board = BoardConfig::new(MAX_BOARD_SIDE, MAX_BOARD_SIDE).with_kerf(MAX_BOARD_SIDE);
        let specs = [
            PieceSpec::new("vast", u32::MAX, u32::MAX, 1),
            PieceSpec::new("long", u32::MAX, 10, 1),
            PieceSpec::new("big", 900_000, 900_000, 1),
            PieceSpec::new("small", 1000, 1000, 2),
        ];
        for algorithm in ALL {
            let sol = Optimizer::new(board, quick_genetic(algorithm))
                .optimize(&specs)
                .unwrap();
            assert_solution_valid(&sol, 5);
            assert_eq!(sol.unplaced.len(), 2, "{algorithm}");
        }
    }

    #[test]
    fn test_runaway_limits_rejected() {
        let board = BoardConfig::new(1000, 1000);
        let specs = [PieceSpec::new("a", 100, 100, 1)];
        let reject = |opts: Options| {
            let err = Optimizer::new(board, opts).optimize(&specs).unwrap_err();
            assert!(matches!(err, OptimizeError::InvalidOptions(_)), "{err}");
        };

        let mut opts = options(Algorithm::Blf);
        opts.max_scan_steps = u32::MAX;
        reject(opts);

        let mut opts = options(Algorithm::Genetic);
        opts.genetic.population = 100_000_000;
        reject(opts);

        let mut opts = options(Algorithm::Genetic);
        opts.genetic.generations = u32::MAX;
        reject(opts);

        let mut opts = options(Algorithm::Genetic);
        opts.genetic.tournament_size = 1_000;
        reject(opts);

        let err = Optimizer::new(board, options(Algorithm::Blf))
            .optimize(&[PieceSpec::new("swarm", 10, 10, u32::MAX)])
            .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidOptions(_)));

        let mut opts = options(Algorithm::Blf);
        opts.max_scan_steps = MAX_SCAN_STEPS;
        assert!(Optimizer::new(board, opts).optimize(&specs).is_ok());
    }

    #[test]
    fn test_timeout_aborts() {
        let mut opts = options(Algorithm::Hybrid);
        opts.timeout_ms = Some(0);
        let err = Optimizer::new(BoardConfig::new(2440, 1220), opts)
            .optimize(&cabinet())
            .unwrap_err();
        assert_eq!(err, OptimizeError::Timeout(0));
    }

    #[test]
    fn test_genetic_reproducible_with_seed() {
        let board = BoardConfig::new(2440, 1220);
        let specs = cabinet();
        let optimizer = Optimizer::new(board, quick_genetic(Algorithm::Genetic));
        let a = optimizer.optimize(&specs).unwrap();
        let b = optimizer.optimize(&specs).unwrap();
        assert_eq!(a.algorithm, Algorithm::Genetic);
        assert_eq!(a.score, b.score);
        assert_eq!(a.board_count(), b.board_count());
    }
}
