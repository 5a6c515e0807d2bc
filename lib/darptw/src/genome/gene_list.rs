use rand::prelude::*;
use tracing::*;

use crate::config::Search;
use crate::eval::Evaluation;
use crate::fleet::Fleet;
use crate::model::ClientId;
use crate::route::generate_route_by_insertion;
use super::Genome;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Gene {
    pub client: ClientId,
    pub vehicle: usize,
}

/// A solution encoded as one `(client, vehicle)` gene per client, in client order.  The
/// fleet is derived from the genes and kept in sync with them.
#[derive(Debug, Clone)]
pub struct GeneListGenome {
    genes: Vec<Gene>,
    fleet: Fleet,
    eval: Evaluation,
}

fn genes_of(fleet: &Fleet, num_clients: usize) -> Vec<Gene> {
    (0..num_clients)
      .map(|c| {
          let client = ClientId::from(c);
          match fleet.vehicle_of(client) {
              Some(vehicle) => Gene { client, vehicle },
              None => panic!("client {} is not assigned", client),
          }
      })
      .collect()
}

impl GeneListGenome {
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Rebuild routes from scratch for a given assignment.  `None` if some vehicle's
    /// clients cannot be routed together within the backtracking budget.
    pub fn from_genes(search: &Search, genes: &[Gene], rng: &mut impl Rng) -> Option<Self> {
        let inst = search.instance;
        assert_eq!(genes.len(), inst.num_clients());
        let mut per_vehicle = vec![Vec::new(); inst.num_vehicles()];
        for g in genes {
            per_vehicle[g.vehicle].push(g.client);
        }
        let mut fleet = Fleet::new(inst);
        for (v, clients) in per_vehicle.iter().enumerate() {
            if clients.is_empty() {
                continue;
            }
            let compatible = clients.iter()
              .all(|&c| clients.iter().all(|&d| !inst.incompatibility().are_incompatible(c, d)));
            if !compatible {
                return None;
            }
            let route = generate_route_by_insertion(inst, clients, search.budget.max_backtracks, rng)?;
            fleet.place_route(inst, v, route);
        }
        Some(Self::from_fleet(search, fleet))
    }

    fn sync(&mut self, search: &Search) {
        self.genes = genes_of(&self.fleet, search.instance.num_clients());
        self.eval = self.fleet.evaluate(search.instance, &search.weights);
    }

    /// `child` takes `donor`'s vehicle for every client in a random contiguous run of
    /// genes.  Fails as a whole if any single move is infeasible.
    fn exchange(search: &Search, base: &Self, donor: &Self, rng: &mut impl Rng) -> Option<Self> {
        let inst = search.instance;
        let n = base.genes.len();
        if n == 0 {
            return None;
        }
        let start = rng.gen_range(0, n);
        let end = rng.gen_range(start + 1, n + 1);
        let mut child = base.clone();
        for g in &donor.genes[start..end] {
            if child.fleet.vehicle_of(g.client) == Some(g.vehicle) {
                continue;
            }
            if !child.fleet.move_client(inst, g.client, g.vehicle, rng) {
                trace!(client=%g.client, start, end, "gene exchange rejected");
                return None;
            }
        }
        child.sync(search);
        Some(child)
    }

    fn child(search: &Search, base: &Self, donor: &Self, rng: &mut impl Rng) -> Self {
        for _ in 0..search.ga.crossover_retries {
            if let Some(child) = Self::exchange(search, base, donor, rng) {
                return child;
            }
        }
        base.clone()
    }
}

impl Genome for GeneListGenome {
    fn from_fleet(search: &Search, mut fleet: Fleet) -> Self {
        let genes = genes_of(&fleet, search.instance.num_clients());
        let eval = fleet.evaluate(search.instance, &search.weights);
        GeneListGenome { genes, fleet, eval }
    }

    fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    fn evaluation(&self) -> &Evaluation {
        &self.eval
    }

    #[instrument(level="trace", skip(search, a, b, rng))]
    fn crossover(search: &Search, a: &Self, b: &Self, rng: &mut impl Rng) -> (Self, Self) {
        (Self::child(search, a, b, rng), Self::child(search, b, a, rng))
    }

    fn cluster_mutation(&mut self, search: &Search, rng: &mut impl Rng) -> bool {
        let changed = super::cluster_mutation(search, &mut self.fleet, rng);
        if changed {
            self.sync(search);
        }
        changed
    }

    fn route_mutation(&mut self, search: &Search, rng: &mut impl Rng) -> bool {
        let changed = super::route_mutation(search, &mut self.fleet, rng);
        if changed {
            self.eval = self.fleet.evaluate(search.instance, &search.weights);
        }
        changed
    }
}
