use std::path::Path;
use fnv::{FnvHashMap, FnvHashSet};

#[macro_use]
mod uid;
pub use uid::IntUid;

pub mod config;
pub mod data;
pub mod model;
pub mod precedence;
pub mod mask;
pub mod route;
pub mod eval;
pub mod fleet;
pub mod generator;
pub mod genome;
pub mod ga;

pub use config::{Budget, GaParams, Search, Weights};
pub use eval::Evaluation;
pub use fleet::Fleet;
pub use generator::{generate_solution, ConstructionFailed};
pub use mask::ClientMask;
pub use model::{ClientId, Instance, InstanceBuilder, InstanceParams, LocId, ReqId, Time, Window};
pub use route::Route;

pub type Map<K, V> = FnvHashMap<K, V>;
pub type Set<T> = FnvHashSet<T>;


mod logging_setup {
    use super::*;
    use tracing_subscriber::{EnvFilter, fmt, registry, prelude::*};
    use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
    use std::fs::OpenOptions;

    fn build_and_set_global_subscriber<P>(logfile: Option<P>, is_test : bool) -> anyhow::Result<Option<WorkerGuard>> where
        P : AsRef<Path>
    {
        let stderr_log = fmt::layer().with_writer(std::io::stderr);
        let env_filter = EnvFilter::from_default_env();
        let r = registry().with(stderr_log).with(env_filter);

        let flush_guard = match logfile {
            Some(p) => {
                let logfile = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(p)?;
                let (writer, _guard) = non_blocking::NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(logfile);
                let json = fmt::layer()
                    .json()
                    .with_span_list(true)
                    .with_current_span(false)
                    .with_writer(writer);

                let r = r.with(json);
                if is_test { r.try_init().ok(); }
                else { r.try_init()?; }
                Some(_guard)
            },
            None => {
                if is_test { r.try_init().ok(); }
                else { r.try_init()?; }
                None
            }
        };
        return Ok(flush_guard)
    }

    /// Install the global subscriber: stderr output filtered by `RUST_LOG`, plus an
    /// optional newline-delimited JSON log file.  Keep the returned guard alive until exit
    /// so the file writer is flushed.
    pub fn init_logging(logfile: Option<impl AsRef<Path>>) -> anyhow::Result<Option<WorkerGuard>> {
        return build_and_set_global_subscriber(logfile, false);
    }

    #[cfg(test)]
    pub(crate) fn init_test_logging(logfile: Option<impl AsRef<Path>>) -> Option<WorkerGuard> {
        return build_and_set_global_subscriber(logfile, true).ok().flatten();
    }
}
pub use logging_setup::*;


#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    pub fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Depot at the origin, one vehicle of capacity 3, 24h horizon, a client picked up
    /// at the depot's location and dropped off 5 minutes away, all windows wide open.
    pub fn single_client() -> Instance {
        let mut b = InstanceBuilder::new(InstanceParams {
            vehicles: 1,
            capacity: 3,
            horizon: 1440.0,
            max_ride_time: 1440.0,
        }, (0.0, 0.0));
        b.add_client((0.0, 0.0), (3.0, 4.0), 1, 0.0, None, None);
        b.build()
    }

    /// A small but non-trivial instance: clients spread on a grid with staggered
    /// windows so that some pairs are incompatible and others share vehicles freely.
    pub fn grid(clients: usize, vehicles: usize) -> Instance {
        let mut b = InstanceBuilder::new(InstanceParams {
            vehicles,
            capacity: 3,
            horizon: 600.0,
            max_ride_time: 60.0,
        }, (0.0, 0.0));
        for i in 0..clients {
            let x = (i % 5) as f64 * 4.0 - 8.0;
            let y = (i / 5) as f64 * 3.0 - 6.0;
            let start = 30.0 * (i % 7) as f64 + 10.0 * (i / 7) as f64;
            if i % 2 == 0 {
                let w = Window::minutes(start, start + 40.0);
                b.add_client((x, y), (-y, x), 1, 2.0, Some(w), None);
            } else {
                let w = Window::minutes(start + 40.0, start + 70.0);
                b.add_client((x, y), (y, -x), 1, 2.0, None, Some(w));
            }
        }
        b.build()
    }

    /// `groups` time slots 70 minutes apart.  Each slot holds two clients travelling
    /// between opposite corners with tight windows, so that neither can be picked up
    /// after the other (one incompatible pair per slot), plus a relaxed errand client
    /// that fits with everybody.
    pub fn contested(groups: usize, vehicles: usize) -> Instance {
        let mut b = InstanceBuilder::new(InstanceParams {
            vehicles,
            capacity: 2,
            horizon: 70.0 * groups as f64 + 200.0,
            max_ride_time: 30.0,
        }, (0.0, 0.0));
        for g in 0..groups {
            let t = 70.0 * g as f64;
            let pickup = Window::minutes(t + 40.0, t + 45.0);
            let delivery = Window::minutes(t + 50.0, t + 60.0);
            b.add_client((0.0, 10.0), (10.0, 0.0), 1, 1.0, Some(pickup), Some(delivery));
            b.add_client((10.0, 0.0), (0.0, 10.0), 1, 1.0, Some(pickup), Some(delivery));
            b.add_client((2.0, 2.0), (4.0, -2.0), 1, 1.0, Some(Window::minutes(t, t + 120.0)), None);
        }
        b.build()
    }

    /// Every unordered incompatible pair of `inst`.
    pub fn incompatible_pairs(inst: &Instance) -> Vec<(ClientId, ClientId)> {
        inst.client_ids()
          .flat_map(|a| inst.client_ids().filter(move |&b| a < b).map(move |b| (a, b)))
          .filter(|&(a, b)| inst.incompatibility().are_incompatible(a, b))
          .collect()
    }
}
