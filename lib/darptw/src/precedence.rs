//! Pairwise ordering constraints between requests, and the client incompatibility they imply.
use itertools::Itertools;
use tracing::*;

use crate::IntUid;
use crate::mask::ClientMask;
use crate::model::*;

/// `after[orig]` lists, sorted, every request that can never come after `orig` in a
/// feasible route.
#[derive(Debug, Clone)]
pub struct Precedence {
    after: Vec<Vec<ReqId>>,
}

fn never_after(orig: &Request, dest: &Request, geography: &Geography) -> bool {
    // a delivery can never precede its own pickup
    if orig.is_delivery() && dest.is_pickup() && orig.client == dest.client {
        return true;
    }
    if orig.window.et >= dest.window.lt {
        return true;
    }
    let earliest_arrival = orig.window.et + orig.service + geography.travel(orig.loc, dest.loc);
    return earliest_arrival >= dest.window.lt;
}

impl Precedence {
    #[instrument(level="debug", skip(requests, geography), fields(requests=requests.len()))]
    pub fn analyze(requests: &[Request], geography: &Geography) -> Self {
        let after: Vec<Vec<ReqId>> = requests.iter()
            .map(|orig| {
                requests.iter()
                    .filter(|dest| dest.id != orig.id && never_after(orig, dest, geography))
                    .map(|dest| dest.id)
                    .sorted()
                    .collect()
            })
            .collect();
        debug!(pairs = after.iter().map(Vec::len).sum::<usize>(), "precedence table built");
        Precedence { after }
    }

    /// Requests that must never follow `orig`.
    #[inline]
    pub fn list(&self, orig: ReqId) -> &[ReqId] {
        &self.after[orig.index()]
    }

    /// True when `dest` may never be scheduled anywhere after `orig`.
    #[inline]
    pub fn forbids(&self, orig: ReqId, dest: ReqId) -> bool {
        self.after[orig.index()].binary_search(&dest).is_ok()
    }

    /// Neither request constrains the order of the other.
    #[inline]
    pub fn unordered(&self, a: ReqId, b: ReqId) -> bool {
        !self.forbids(a, b) && !self.forbids(b, a)
    }

    pub fn len(&self) -> usize {
        self.after.len()
    }
}


/// Clients that can never share a vehicle: some request of one must precede some request
/// of the other and vice versa.
#[derive(Debug, Clone)]
pub struct Incompatibility {
    masks: Vec<ClientMask>,
}

impl Incompatibility {
    #[instrument(level="debug", skip(precedence, requests))]
    pub fn derive(precedence: &Precedence, requests: &[Request], num_clients: usize) -> Self {
        let mut masks = vec![ClientMask::new(num_clients); num_clients];
        for orig in requests {
            for &dest in precedence.list(orig.id) {
                if !precedence.forbids(dest, orig.id) {
                    continue;
                }
                let (a, b) = (orig.client, requests[dest.index()].client);
                if a == b {
                    warn!(client=%a, "client cannot be served by any vehicle");
                    continue;
                }
                masks[a.index()].insert(b);
                masks[b.index()].insert(a);
            }
        }
        let incompat = Incompatibility { masks };
        debug!(pairs = incompat.num_pairs(), "incompatibility derived");
        incompat
    }

    /// The incompatible clients of `c` as a mask, for filtering vehicles.
    #[inline]
    pub fn mask(&self, c: ClientId) -> &ClientMask {
        &self.masks[c.index()]
    }

    #[inline]
    pub fn are_incompatible(&self, a: ClientId, b: ClientId) -> bool {
        self.masks[a.index()].contains(b)
    }

    #[inline]
    pub fn has_any(&self, c: ClientId) -> bool {
        !self.masks[c.index()].is_empty()
    }

    pub fn num_pairs(&self) -> usize {
        self.masks.iter().map(|m| m.count()).sum::<usize>() / 2
    }
}
