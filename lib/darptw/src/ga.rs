//! The pieces a generational driver needs: seeding a population, selection, breeding and
//! a plain fixed-length run.
use std::cmp::Ordering;

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::*;

use crate::config::Search;
use crate::generator::ConstructionFailed;
use crate::genome::Genome;

/// One construction per individual, each with its own generator seeded from `rng`.
#[instrument(level="debug", skip(search, rng), fields(size=search.ga.population))]
pub fn initial_population<G: Genome>(search: &Search, rng: &mut impl Rng) -> Result<Vec<G>, ConstructionFailed> {
    let seeds: Vec<u64> = (0..search.ga.population).map(|_| rng.gen()).collect();
    seeds.into_par_iter()
      .map(|seed| G::random(search, &mut StdRng::seed_from_u64(seed)))
      .collect()
}

pub fn best<G: Genome>(population: &[G]) -> Option<&G> {
    population.iter().min_by(|a, b| a.fitness().partial_cmp(&b.fitness()).unwrap_or(Ordering::Equal))
}

/// Fittest of `size` individuals drawn with replacement.
pub fn tournament<'a, G: Genome>(population: &'a [G], size: usize, rng: &mut impl Rng) -> &'a G {
    assert!(!population.is_empty());
    let mut winner = &population[rng.gen_range(0, population.len())];
    for _ in 1..size {
        let challenger = &population[rng.gen_range(0, population.len())];
        if challenger.fitness() < winner.fitness() {
            winner = challenger;
        }
    }
    winner
}

/// Elitism of one, then children of tournament-selected pairs, bred in parallel.
pub fn next_generation<G: Genome>(search: &Search, population: &[G], rng: &mut impl Rng) -> Vec<G> {
    let size = population.len();
    let elite = match best(population) {
        Some(g) => g.clone(),
        None => return Vec::new(),
    };
    let pairs = size / 2;
    let jobs: Vec<(&G, &G, u64)> = (0..pairs)
      .map(|_| {
          let a = tournament(population, search.ga.tournament_size, rng);
          let b = tournament(population, search.ga.tournament_size, rng);
          (a, b, rng.gen())
      })
      .collect();

    let children: Vec<(G, G)> = jobs.into_par_iter()
      .map(|(a, b, seed)| {
          let mut rng = StdRng::seed_from_u64(seed);
          let (mut x, mut y) = if rng.gen_bool(search.ga.crossover_rate) {
              G::crossover(search, a, b, &mut rng)
          } else {
              (a.clone(), b.clone())
          };
          x.mutate(search, &mut rng);
          y.mutate(search, &mut rng);
          (x, y)
      })
      .collect();

    let mut next = Vec::with_capacity(size);
    next.push(elite);
    for (x, y) in children {
        next.push(x);
        next.push(y);
    }
    next.truncate(size);
    next
}

#[derive(Debug, Clone)]
pub struct RunSummary<G> {
    pub best: G,
    /// Best fitness of the initial population and after each generation.
    pub history: Vec<f64>,
}

#[instrument(level="info", skip(search, rng), fields(instance=%search.instance.id))]
pub fn run<G: Genome>(search: &Search, rng: &mut impl Rng) -> Result<RunSummary<G>, ConstructionFailed> {
    let mut population: Vec<G> = initial_population(search, rng)?;
    let mut history = Vec::with_capacity(search.ga.generations + 1);
    let mut incumbent = match best(&population) {
        Some(g) => g.clone(),
        None => return Err(ConstructionFailed { attempts: 0 }),
    };
    history.push(incumbent.fitness());
    info!(fitness = incumbent.fitness(), "initial population");

    for gen in 0..search.ga.generations {
        population = next_generation(search, &population, rng);
        if let Some(g) = best(&population) {
            if g.fitness() < incumbent.fitness() {
                incumbent = g.clone();
                debug!(gen, fitness = incumbent.fitness(), "new incumbent");
            }
        }
        history.push(incumbent.fitness());
    }
    info!(fitness = incumbent.fitness(), vehicles = incumbent.evaluation().vehicles, "search finished");
    Ok(RunSummary { best: incumbent, history })
}
