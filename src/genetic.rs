//! Genetic search over piece orderings.
//!
//! A chromosome is a permutation of the expanded piece list. Its fitness is
//! the solution score of a Bottom-Left-Fill run that places the pieces in
//! exactly that order. The search runs a fixed number of generations with
//! elitism, tournament selection, order crossover and swap mutation.

use rand::prelude::*;

use crate::blf::BottomLeftFill;
use crate::error::{OptimizeError, Result};
use crate::strategy::{PlacementStrategy, RunContext, Solution};
use crate::types::{Algorithm, GeneticParams, Piece};

#[derive(Debug, Clone)]
struct Individual {
    order: Vec<usize>,
    fitness: f64,
    /// `None` when decoding failed; such individuals have zero fitness.
    solution: Option<Solution>,
}

#[derive(Debug, Clone, Default)]
pub struct Genetic {
    pub params: GeneticParams,
    /// Fixed seed for reproducible runs; fresh entropy when `None`.
    pub seed: Option<u64>,
}

impl Genetic {
    pub fn new(params: GeneticParams, seed: Option<u64>) -> Self {
        Self { params, seed }
    }

    pub fn evolve<R: Rng>(
        &self,
        pieces: &[Piece],
        ctx: &RunContext<'_>,
        rng: &mut R,
    ) -> Result<Solution> {
        if pieces.is_empty() {
            return Ok(Solution::empty(Algorithm::Genetic).with_score(0.0));
        }

        let size = self.params.population.max(1);
        let elite = self.params.elite_count().min(size);
        let mutation_rate = self.params.mutation_rate.clamp(0.0, 1.0);
        let mut last_error: Option<OptimizeError> = None;

        let mut population = Vec::with_capacity(size);
        for _ in 0..size {
            let mut order: Vec<usize> = (0..pieces.len()).collect();
            order.shuffle(rng);
            population.push(Self::evaluate(order, pieces, ctx, &mut last_error)?);
        }

        for generation in 0..self.params.generations {
            ctx.cancel.check()?;
            sort_by_fitness(&mut population);

            if ctx.summaries() && generation % 10 == 0 {
                tracing::info!(
                    generation,
                    best = format_args!("{:.2}", population[0].fitness),
                    "genetic search progress"
                );
            }

            let mut next: Vec<Individual> = population[..elite].to_vec();
            while next.len() < size {
                let a = tournament(&population, self.params.tournament_size, rng);
                let b = tournament(&population, self.params.tournament_size, rng);
                let mut child = order_crossover(&a.order, &b.order, rng);
                if rng.gen_bool(mutation_rate) {
                    swap_mutate(&mut child, rng);
                }
                next.push(Self::evaluate(child, pieces, ctx, &mut last_error)?);
            }
            population = next;
        }

        sort_by_fitness(&mut population);
        let best = population.swap_remove(0);
        match best.solution {
            Some(mut solution) => {
                solution.algorithm = Algorithm::Genetic;
                Ok(solution.with_score(best.fitness))
            }
            None => Err(last_error.unwrap_or_else(|| {
                OptimizeError::AllStrategiesFailed("no ordering could be decoded".to_string())
            })),
        }
    }

    fn evaluate(
        order: Vec<usize>,
        pieces: &[Piece],
        ctx: &RunContext<'_>,
        last_error: &mut Option<OptimizeError>,
    ) -> Result<Individual> {
        let ordered: Vec<Piece> = order.iter().map(|&i| pieces[i].clone()).collect();
        match BottomLeftFill::pack_in_order(ordered, ctx) {
            Ok(solution) => Ok(Individual {
                fitness: solution.score(),
                order,
                solution: Some(solution),
            }),
            Err(e) if e.is_abort() => Err(e),
            Err(e) => {
                *last_error = Some(e);
                Ok(Individual {
                    order,
                    fitness: 0.0,
                    solution: None,
                })
            }
        }
    }
}

impl PlacementStrategy for Genetic {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Genetic
    }

    fn pack(&self, pieces: &[Piece], ctx: &RunContext<'_>) -> Result<Solution> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.evolve(pieces, ctx, &mut rng)
    }
}

// Stable, so equally fit individuals keep their relative order.
fn sort_by_fitness(population: &mut [Individual]) {
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}

/// Fittest of `size` individuals drawn uniformly with replacement.
fn tournament<'p, R: Rng>(population: &'p [Individual], size: usize, rng: &mut R) -> &'p Individual {
    let mut best = &population[rng.gen_range(0..population.len())];
    for _ in 1..size.max(1) {
        let contender = &population[rng.gen_range(0..population.len())];
        if contender.fitness > best.fitness {
            best = contender;
        }
    }
    best
}

/// Order crossover (OX1): keeps a random slice of `a` in place and fills the
/// remaining genes in the order they appear in `b`, starting after the slice.
pub fn order_crossover<R: Rng>(a: &[usize], b: &[usize], rng: &mut R) -> Vec<usize> {
    let n = a.len();
    if n < 2 {
        return a.to_vec();
    }

    let (mut p1, mut p2) = (rng.gen_range(0..n), rng.gen_range(0..n));
    if p1 > p2 {
        std::mem::swap(&mut p1, &mut p2);
    }

    let mut child = vec![usize::MAX; n];
    let mut used = vec![false; n];
    for i in p1..=p2 {
        child[i] = a[i];
        used[a[i]] = true;
    }

    let mut j = (p2 + 1) % n;
    for i in 0..n {
        let idx = (p2 + 1 + i) % n;
        if child[idx] != usize::MAX {
            continue;
        }
        while used[b[j]] {
            j = (j + 1) % n;
        }
        child[idx] = b[j];
        used[b[j]] = true;
        j = (j + 1) % n;
    }
    child
}

pub fn swap_mutate<R: Rng>(order: &mut [usize], rng: &mut R) {
    if order.len() < 2 {
        return;
    }
    let i = rng.gen_range(0..order.len());
    let j = rng.gen_range(0..order.len());
    order.swap(i, j);
}
