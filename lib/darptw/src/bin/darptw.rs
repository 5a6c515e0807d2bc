use rayon::ThreadPoolBuilder;
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
use anyhow::{Context, Result};
use tracing::*;

use darptw::*;
use darptw::config::{Encoding, ENCODING_STRINGS};
use darptw::data::load_instance;
use darptw::ga::{self, RunSummary};
use darptw::genome::{GeneListGenome, Genome, RouteArrayGenome};

mod output;
use output::*;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct ClArgs {
    /// Cordeau-format instance file
    #[structopt(parse(from_os_str))]
    instance: PathBuf,
    #[structopt(long, parse(try_from_str), possible_values=&ENCODING_STRINGS, default_value="route-array")]
    encoding: Encoding,
    #[structopt(long, default_value="0")]
    seed: u64,
    #[structopt(long, short="c", default_value="1", validator=in_range(1..))]
    cpus: usize,
    #[structopt(long, default_value="50", validator=in_range(2..))]
    population: usize,
    #[structopt(long, default_value="200")]
    generations: usize,
    #[structopt(long, default_value="0.8", validator=in_range(0.0..=1.0))]
    crossover_rate: f64,
    #[structopt(long, default_value="0.05", validator=in_range(0.0..=1.0))]
    mutation_rate: f64,
    #[structopt(long, default_value="3", validator=in_range(1..))]
    tournament: usize,
    #[structopt(long, default_value="5")]
    crossover_retries: usize,
    #[structopt(long, default_value="1000", validator=in_range(1..))]
    max_attempts: usize,
    #[structopt(long, default_value="5000")]
    max_backtracks: usize,
    #[structopt(flatten)]
    weights: WeightOptions,
    #[structopt(flatten)]
    output: OutputOptions,
}

#[derive(Debug, StructOpt)]
struct WeightOptions {
    #[structopt(long="w-travel", default_value="1.0", validator=in_range(0.0..))]
    travel: f64,
    #[structopt(long="w-slack", default_value="0.1", validator=in_range(0.0..))]
    slack: f64,
    #[structopt(long="w-vehicles", default_value="50.0", validator=in_range(0.0..))]
    vehicles: f64,
    #[structopt(long="w-excess-ride", default_value="5.0", validator=in_range(0.0..))]
    excess_ride: f64,
    #[structopt(long="w-wait", default_value="0.5", validator=in_range(0.0..))]
    wait: f64,
    #[structopt(long="w-ride", default_value="0.2", validator=in_range(0.0..))]
    ride: f64,
}

impl From<&WeightOptions> for Weights {
    fn from(w: &WeightOptions) -> Self {
        Weights {
            travel: w.travel,
            slack: w.slack,
            vehicles: w.vehicles,
            excess_ride: w.excess_ride,
            wait: w.wait,
            ride: w.ride,
        }
    }
}

fn solve<G: Genome>(search: &Search, rng: &mut StdRng, output: &OutputOptions) -> Result<()> {
    let summary: RunSummary<G> = ga::run(search, rng)?;
    emit(output, &Report { instance: search.instance, summary })
}

fn main() -> anyhow::Result<()> {
    let args : ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.clone())?;
    debug!(?args);
    ThreadPoolBuilder::new().num_threads(args.cpus).build_global().context("failed to construct thread pool")?;

    let instance = load_instance(&args.instance)?;
    let search = Search::new(&instance)
        .with_weights(Weights::from(&args.weights))
        .with_ga(GaParams {
            population: args.population,
            generations: args.generations,
            crossover_rate: args.crossover_rate,
            mutation_rate: args.mutation_rate,
            tournament_size: args.tournament,
            crossover_retries: args.crossover_retries,
            encoding: args.encoding,
        })
        .with_budget(Budget { max_attempts: args.max_attempts, max_backtracks: args.max_backtracks });

    let mut rng = StdRng::seed_from_u64(args.seed);
    match search.ga.encoding {
        Encoding::GeneList => solve::<GeneListGenome>(&search, &mut rng, &args.output),
        Encoding::RouteArray => solve::<RouteArrayGenome>(&search, &mut rng, &args.output),
    }
}
