// Parameter tensors consumed by the problem builder.
// Every table is stored as nested vectors indexed the way the model reads
// them: activity `h`, agent `i`/`j`, equipment `e`, scenario `s`.

use serde::{Deserialize, Serialize};

use super::error::DataError;

/// Declared sizes of every index range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub num_activities: usize,
    pub num_agents: usize,
    pub num_equipment: usize,
    pub num_scenarios: usize,
}

impl Dimensions {
    pub fn new(
        num_activities: usize,
        num_agents: usize,
        num_equipment: usize,
        num_scenarios: usize,
    ) -> Self {
        Self {
            num_activities,
            num_agents,
            num_equipment,
            num_scenarios,
        }
    }
}

/// One complete problem instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub dimensions: Dimensions,
    /// `[h]`
    pub activity_importance: Vec<u32>,
    /// `[h]`
    pub min_duration: Vec<f64>,
    /// `[h]`
    pub max_duration: Vec<f64>,
    /// `[h]`
    pub fixed_cost: Vec<f64>,
    /// `[h][j]`
    pub agent_quality: Vec<Vec<f64>>,
    /// `[h][e]`
    pub equipment_quality: Vec<Vec<f64>>,
    /// `[i][j]`
    pub collaboration_factor: Vec<Vec<f64>>,
    /// `[h][e][s]`
    pub equipment_fixed_cost: Vec<Vec<Vec<f64>>>,
    /// `[h][e][s]`
    pub equipment_variable_cost_factor: Vec<Vec<Vec<f64>>>,
    /// `[j][h][s]`
    pub agent_overhead: Vec<Vec<Vec<f64>>>,
    /// `[j][h][s]`
    pub agent_time_cost: Vec<Vec<Vec<f64>>>,
    /// `[j][h][s]`
    pub agent_fixed_penalty: Vec<Vec<Vec<f64>>>,
}

impl Dataset {
    pub fn from_json_str(json: &str) -> Result<Self, DataError> {
        let dataset: Dataset = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn to_json_string(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Probability of each scenario; uniform and summing to one
    pub fn scenario_weights(&self) -> Vec<f64> {
        let n = self.dimensions.num_scenarios;
        vec![1.0 / n as f64; n]
    }

    /// Check every table against the declared dimensions, then value domains
    pub fn validate(&self) -> Result<(), DataError> {
        self.validate_shapes()?;
        self.validate_domains()
    }

    fn validate_shapes(&self) -> Result<(), DataError> {
        let Dimensions {
            num_activities: h,
            num_agents: j,
            num_equipment: e,
            num_scenarios: s,
        } = self.dimensions;

        check_len("activityImportance", self.activity_importance.len(), h)?;
        check_len("minDuration", self.min_duration.len(), h)?;
        check_len("maxDuration", self.max_duration.len(), h)?;
        check_len("fixedCost", self.fixed_cost.len(), h)?;
        check_matrix("agentQuality", &self.agent_quality, h, j)?;
        check_matrix("equipmentQuality", &self.equipment_quality, h, e)?;
        check_matrix("collaborationFactor", &self.collaboration_factor, j, j)?;
        check_cube("equipmentFixedCost", &self.equipment_fixed_cost, h, e, s)?;
        check_cube(
            "equipmentVariableCostFactor",
            &self.equipment_variable_cost_factor,
            h,
            e,
            s,
        )?;
        check_cube("agentOverhead", &self.agent_overhead, j, h, s)?;
        check_cube("agentTimeCost", &self.agent_time_cost, j, h, s)?;
        check_cube("agentFixedPenalty", &self.agent_fixed_penalty, j, h, s)?;
        Ok(())
    }

    fn validate_domains(&self) -> Result<(), DataError> {
        if self.dimensions.num_scenarios == 0 {
            return Err(DataError::Domain(
                "at least one scenario is required".to_string(),
            ));
        }

        for (h, (&lo, &hi)) in self.min_duration.iter().zip(&self.max_duration).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(DataError::Domain(format!(
                    "duration bounds of activity {} must be finite",
                    h
                )));
            }
            if lo > hi {
                return Err(DataError::Domain(format!(
                    "activity {}: minDuration ({}) > maxDuration ({})",
                    h, lo, hi
                )));
            }
            // The fixed-penalty term divides by the duration
            if lo <= 0.0 {
                return Err(DataError::Domain(format!(
                    "activity {}: minDuration must be positive, got {}",
                    h, lo
                )));
            }
        }

        if let Some(h) = self.activity_importance.iter().position(|&d| d == 0) {
            return Err(DataError::Domain(format!(
                "activity {}: importance must be a positive integer",
                h
            )));
        }

        for (i, row) in self.collaboration_factor.iter().enumerate() {
            if let Some(j) = row.iter().position(|w| !(0.0..=1.0).contains(w)) {
                return Err(DataError::Domain(format!(
                    "collaborationFactor[{}][{}] = {} is outside [0, 1]",
                    i, j, row[j]
                )));
            }
        }

        require_all("equipmentFixedCost", &self.equipment_fixed_cost, |v| v > 0.0, "positive")?;
        require_all(
            "equipmentVariableCostFactor",
            &self.equipment_variable_cost_factor,
            |v| v > 0.0,
            "positive",
        )?;
        require_all("agentOverhead", &self.agent_overhead, |v| v >= 0.0, "non-negative")?;
        require_all("agentTimeCost", &self.agent_time_cost, |v| v >= 0.0, "non-negative")?;
        require_all(
            "agentFixedPenalty",
            &self.agent_fixed_penalty,
            |v| v >= 0.0,
            "non-negative",
        )?;

        let finite_2d = |m: &Vec<Vec<f64>>| m.iter().flatten().all(|v| v.is_finite());
        if !self.fixed_cost.iter().all(|v| v.is_finite())
            || !finite_2d(&self.agent_quality)
            || !finite_2d(&self.equipment_quality)
        {
            return Err(DataError::Domain(
                "quality and fixed cost tables must be finite".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_len(tensor: &'static str, found: usize, expected: usize) -> Result<(), DataError> {
    if found != expected {
        return Err(DataError::shape(tensor, format!("[{}]", expected), format!("[{}]", found)));
    }
    Ok(())
}

fn check_matrix(
    tensor: &'static str,
    m: &[Vec<f64>],
    rows: usize,
    cols: usize,
) -> Result<(), DataError> {
    let expected = format!("[{}][{}]", rows, cols);
    if m.len() != rows {
        return Err(DataError::shape(tensor, expected, format!("{} rows", m.len())));
    }
    if let Some((r, row)) = m.iter().enumerate().find(|(_, row)| row.len() != cols) {
        return Err(DataError::shape(
            tensor,
            expected,
            format!("row {} with {} columns", r, row.len()),
        ));
    }
    Ok(())
}

fn check_cube(
    tensor: &'static str,
    c: &[Vec<Vec<f64>>],
    d0: usize,
    d1: usize,
    d2: usize,
) -> Result<(), DataError> {
    let expected = format!("[{}][{}][{}]", d0, d1, d2);
    if c.len() != d0 {
        return Err(DataError::shape(tensor, expected, format!("{} outer entries", c.len())));
    }
    for (a, plane) in c.iter().enumerate() {
        if plane.len() != d1 {
            return Err(DataError::shape(
                tensor,
                expected,
                format!("entry {} with {} rows", a, plane.len()),
            ));
        }
        if let Some((b, row)) = plane.iter().enumerate().find(|(_, row)| row.len() != d2) {
            return Err(DataError::shape(
                tensor,
                expected,
                format!("entry [{}][{}] with {} values", a, b, row.len()),
            ));
        }
    }
    Ok(())
}

fn require_all(
    tensor: &str,
    c: &[Vec<Vec<f64>>],
    ok: impl Fn(f64) -> bool,
    what: &str,
) -> Result<(), DataError> {
    for (a, plane) in c.iter().enumerate() {
        for (b, row) in plane.iter().enumerate() {
            for (k, &v) in row.iter().enumerate() {
                if !v.is_finite() || !ok(v) {
                    return Err(DataError::Domain(format!(
                        "{}[{}][{}][{}] = {} must be {}",
                        tensor, a, b, k, v, what
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Small hand-made instance with uniform costs
    pub fn uniform(h: usize, j: usize, e: usize, s: usize) -> Dataset {
        Dataset {
            dimensions: Dimensions::new(h, j, e, s),
            activity_importance: vec![1; h],
            min_duration: vec![1.0; h],
            max_duration: vec![4.0; h],
            fixed_cost: vec![10.0; h],
            agent_quality: vec![vec![3.0; j]; h],
            equipment_quality: vec![vec![2.0; e]; h],
            collaboration_factor: vec![vec![0.5; j]; j],
            equipment_fixed_cost: vec![vec![vec![100.0; s]; e]; h],
            equipment_variable_cost_factor: vec![vec![vec![10.0; s]; e]; h],
            agent_overhead: vec![vec![vec![1.0; s]; h]; j],
            agent_time_cost: vec![vec![vec![0.5; s]; h]; j],
            agent_fixed_penalty: vec![vec![vec![0.2; s]; h]; j],
        }
    }
}
