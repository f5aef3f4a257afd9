// Seeded random instances.
// Value ranges follow the field data the model was first calibrated on.
// The agent cost tensors are drawn here, once, so that building the same
// instance twice always yields the same problem.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::dataset::{Dataset, Dimensions};
use super::error::DataError;
use super::source::DataSource;

#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    dimensions: Dimensions,
    seed: u64,
}

impl InstanceGenerator {
    pub fn new(dimensions: Dimensions, seed: u64) -> Self {
        Self { dimensions, seed }
    }

    pub fn generate(&self) -> Dataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let Dimensions {
            num_activities: h,
            num_agents: j,
            num_equipment: e,
            num_scenarios: s,
        } = self.dimensions;

        let activity_importance = (0..h).map(|_| rng.random_range(1..10u32)).collect();
        let min_duration = int_vec(&mut rng, h, 1, 5);
        let max_duration = int_vec(&mut rng, h, 5, 10);
        let fixed_cost = int_vec(&mut rng, h, 50, 100);
        let agent_quality = (0..h).map(|_| int_vec(&mut rng, j, 1, 10)).collect();
        let equipment_quality = (0..h).map(|_| int_vec(&mut rng, e, 1, 10)).collect();
        let collaboration_factor = (0..j)
            .map(|_| (0..j).map(|_| rng.random_range(0.0..1.0)).collect())
            .collect();
        let equipment_fixed_cost = int_cube(&mut rng, [h, e, s], 100, 200);
        let equipment_variable_cost_factor = int_cube(&mut rng, [h, e, s], 10, 20);
        let agent_overhead = int_cube(&mut rng, [j, h, s], 50, 100);
        let agent_time_cost = float_cube(&mut rng, [j, h, s], 5.0, 10.0);
        let agent_fixed_penalty = float_cube(&mut rng, [j, h, s], 0.1, 0.5);

        Dataset {
            dimensions: self.dimensions,
            activity_importance,
            min_duration,
            max_duration,
            fixed_cost,
            agent_quality,
            equipment_quality,
            collaboration_factor,
            equipment_fixed_cost,
            equipment_variable_cost_factor,
            agent_overhead,
            agent_time_cost,
            agent_fixed_penalty,
        }
    }
}

impl DataSource for InstanceGenerator {
    fn load(&self) -> Result<Dataset, DataError> {
        let dataset = self.generate();
        dataset.validate()?;
        tracing::debug!(seed = self.seed, "generated random instance");
        Ok(dataset)
    }
}

fn int_vec(rng: &mut StdRng, n: usize, lo: u32, hi: u32) -> Vec<f64> {
    (0..n).map(|_| rng.random_range(lo..hi) as f64).collect()
}

fn int_cube(rng: &mut StdRng, [a, b, c]: [usize; 3], lo: u32, hi: u32) -> Vec<Vec<Vec<f64>>> {
    (0..a)
        .map(|_| (0..b).map(|_| int_vec(rng, c, lo, hi)).collect())
        .collect()
}

fn float_cube(rng: &mut StdRng, [a, b, c]: [usize; 3], lo: f64, hi: f64) -> Vec<Vec<Vec<f64>>> {
    (0..a)
        .map(|_| {
            (0..b)
                .map(|_| (0..c).map(|_| rng.random_range(lo..hi)).collect())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_instance_is_valid() {
        let data = InstanceGenerator::new(Dimensions::new(10, 25, 15, 4), 7)
            .load()
            .unwrap();
        assert_eq!(data.agent_overhead.len(), 25);
        assert_eq!(data.equipment_fixed_cost[9][14].len(), 4);
    }

    #[test]
    fn test_same_seed_same_instance() {
        let dims = Dimensions::new(3, 4, 2, 2);
        assert_eq!(
            InstanceGenerator::new(dims, 11).generate(),
            InstanceGenerator::new(dims, 11).generate()
        );
        assert_ne!(
            InstanceGenerator::new(dims, 11).generate(),
            InstanceGenerator::new(dims, 12).generate()
        );
    }

    #[test]
    fn test_value_ranges() {
        let data = InstanceGenerator::new(Dimensions::new(6, 5, 4, 3), 3).generate();
        assert!(data.min_duration.iter().all(|&t| (1.0..5.0).contains(&t)));
        assert!(data.max_duration.iter().all(|&t| (5.0..10.0).contains(&t)));
        assert!(data
            .agent_fixed_penalty
            .iter()
            .flatten()
            .flatten()
            .all(|&d| (0.1..0.5).contains(&d)));
    }
}
