//! Plain configuration values consumed by the search.  Nothing here is reflective: the
//! binary maps command-line options onto these structs and everything else takes them by
//! reference through [`Search`].
use crate::model::Instance;

/// Factors of the weighted objective.  All must be non-negative; lower fitness is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub travel: f64,
    pub slack: f64,
    pub vehicles: f64,
    pub excess_ride: f64,
    pub wait: f64,
    pub ride: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            travel: 1.0,
            slack: 0.1,
            vehicles: 50.0,
            excess_ride: 5.0,
            wait: 0.5,
            ride: 0.2,
        }
    }
}

impl Weights {
    pub fn check(&self) {
        for (name, w) in &[
            ("travel", self.travel),
            ("slack", self.slack),
            ("vehicles", self.vehicles),
            ("excess_ride", self.excess_ride),
            ("wait", self.wait),
            ("ride", self.ride),
        ] {
            assert!(*w >= 0.0 && w.is_finite(), "objective weight `{}` must be non-negative, got {}", name, w);
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Encoding {
    GeneList,
    RouteArray,
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "gene-list" => Ok(Self::GeneList),
            "route-array" => Ok(Self::RouteArray),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}

pub const ENCODING_STRINGS: [&str; 2] = ["gene-list", "route-array"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaParams {
    pub population: usize,
    pub generations: usize,
    pub crossover_rate: f64,
    /// Per-client probability for cluster mutation, per-route probability for route mutation.
    pub mutation_rate: f64,
    pub tournament_size: usize,
    /// Attempts per child before falling back to a copy of the parent.
    pub crossover_retries: usize,
    pub encoding: Encoding,
}

impl Default for GaParams {
    fn default() -> Self {
        GaParams {
            population: 50,
            generations: 200,
            crossover_rate: 0.8,
            mutation_rate: 0.05,
            tournament_size: 3,
            crossover_retries: 5,
            encoding: Encoding::RouteArray,
        }
    }
}

/// Caps on the randomised construction loops.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Budget {
    /// Whole-solution restarts before giving up.
    pub max_attempts: usize,
    /// Insertion attempts a single backtracking route construction may spend.
    pub max_backtracks: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Budget { max_attempts: 1000, max_backtracks: 5000 }
    }
}

/// Everything an operator needs besides the genomes and the random source.
#[derive(Debug, Clone, Copy)]
pub struct Search<'a> {
    pub instance: &'a Instance,
    pub weights: Weights,
    pub ga: GaParams,
    pub budget: Budget,
}

impl<'a> Search<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        Search {
            instance,
            weights: Weights::default(),
            ga: GaParams::default(),
            budget: Budget::default(),
        }
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        weights.check();
        self.weights = weights;
        self
    }

    pub fn with_ga(mut self, ga: GaParams) -> Self {
        assert!((0.0..=1.0).contains(&ga.crossover_rate), "crossover rate out of range");
        assert!((0.0..=1.0).contains(&ga.mutation_rate), "mutation rate out of range");
        assert!(ga.tournament_size > 0, "tournament size must be positive");
        self.ga = ga;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_encoding() {
        assert_eq!("gene-list".parse::<Encoding>(), Ok(Encoding::GeneList));
        assert_eq!("route-array".parse::<Encoding>(), Ok(Encoding::RouteArray));
        assert!("tree".parse::<Encoding>().is_err());
    }

    #[test]
    #[should_panic]
    fn negative_weight() {
        Weights { wait: -1.0, ..Weights::default() }.check();
    }
}
