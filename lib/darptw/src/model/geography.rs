use crate::Map;
use super::{LocId, Time, round_time};
use crate::IntUid;

/// Node coordinates and the travel-time matrix between them.
///
/// Locations are deduplicated by coordinate while the instance is being assembled; the
/// matrix is built once all locations are known and never changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct Geography {
    coords: Vec<(f64, f64)>,
    lookup: Map<(u64, u64), LocId>,
    matrix: Vec<Time>,
    built: bool,
}

impl Geography {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_location(&mut self, x: f64, y: f64) -> LocId {
        assert!(!self.built, "location added after the distance matrix was built");
        assert!(x.is_finite() && y.is_finite(), "non-finite coordinate ({}, {})", x, y);
        // -0.0 and 0.0 are the same place
        let key = ((x + 0.0).to_bits(), (y + 0.0).to_bits());
        let next = LocId::from(self.coords.len());
        let coords = &mut self.coords;
        *self.lookup.entry(key).or_insert_with(|| {
            coords.push((x, y));
            next
        })
    }

    pub fn build_matrix(&mut self) {
        assert!(!self.built, "distance matrix built twice");
        let n = self.coords.len();
        let mut matrix = vec![0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (self.coords[i], self.coords[j]);
                let d = round_time(((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt());
                matrix[i * n + j] = d;
                matrix[j * n + i] = d;
            }
        }
        self.matrix = matrix;
        self.built = true;
    }

    #[inline]
    pub fn travel(&self, from: LocId, to: LocId) -> Time {
        debug_assert!(self.built, "distance matrix not built");
        self.matrix[from.index() * self.coords.len() + to.index()]
    }

    pub fn coords(&self, loc: LocId) -> (f64, f64) {
        self.coords[loc.index()]
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }
}
