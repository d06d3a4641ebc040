//! Uniformly random labeled neighbor

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Detail, Estimate, FitResult, Neighborhood, NeighborsBasedMethod, Result};
use crate::areadata::AreaId;

/// Default seed
pub const DEFAULT_RANDOM_STATE: u64 = 0;

/// Takes the area of one labeled neighbor chosen uniformly at random.
///
/// Seeded, so a fresh instance with the same seed reproduces its picks.
#[derive(Debug, Clone)]
pub struct RandomNeighbor {
    random_state: u64,
    rng: StdRng,
}

impl Default for RandomNeighbor {
    fn default() -> Self {
        Self::new(DEFAULT_RANDOM_STATE)
    }
}

impl RandomNeighbor {
    pub fn new(random_state: u64) -> Self {
        Self {
            random_state,
            rng: StdRng::seed_from_u64(random_state),
        }
    }

    pub fn random_state(&self) -> u64 {
        self.random_state
    }
}

impl NeighborsBasedMethod for RandomNeighbor {
    fn name(&self) -> &'static str {
        "rn"
    }

    fn select(&mut self, hood: &Neighborhood<'_>, _fit: &FitResult) -> Result<Estimate> {
        let areas = hood.labeled_areas();
        if areas.is_empty() {
            return Ok(Estimate::new(AreaId::NONE, hood, 0, Detail::None));
        }
        let pick = areas[self.rng.random_range(0..areas.len())];
        Ok(Estimate::new(pick, hood, areas.len(), Detail::None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::tests::hood;

    #[test]
    fn test_picks_a_labeled_neighbor() {
        let fit = FitResult::new(&[], &[]).unwrap();
        let locations = [None, Some(AreaId(3)), Some(AreaId(4)), None];
        let mut rn = RandomNeighbor::default();
        for _ in 0..50 {
            let e = rn.select(&hood(&[1, 2, 3, 4], &locations), &fit).unwrap();
            assert!(e.area == AreaId(3) || e.area == AreaId(4));
            assert_eq!(e.labeled_degree, 2);
            assert_eq!(e.degree, 4);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let fit = FitResult::new(&[], &[]).unwrap();
        let locations: Vec<Option<AreaId>> = (1..=20).map(|i| Some(AreaId(i))).collect();
        let neighbors: Vec<u32> = (0..20).collect();
        let h = hood(&neighbors, &locations);

        let mut a = RandomNeighbor::new(42);
        let mut b = RandomNeighbor::new(42);
        let seq_a: Vec<AreaId> = (0..10).map(|_| a.select(&h, &fit).unwrap().area).collect();
        let seq_b: Vec<AreaId> = (0..10).map(|_| b.select(&h, &fit).unwrap().area).collect();
        assert_eq!(seq_a, seq_b);
        assert_eq!(a.random_state(), 42);
    }

    #[test]
    fn test_no_labeled_neighbors() {
        let fit = FitResult::new(&[], &[]).unwrap();
        let e = RandomNeighbor::default()
            .select(&hood(&[], &[]), &fit)
            .unwrap();
        assert_eq!(e.area, AreaId::NONE);
        assert_eq!(e.degree, 0);
    }
}
