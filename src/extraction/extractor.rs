// Reading solver answers back into domain-shaped tables.

use std::collections::BTreeMap;

use crate::domain::{Solution, SolutionStatus};
use crate::formulation::{ComponentValues, DurationDomain, ScheduleProblem};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Solve failed with status {status}: {message}")]
    SolveFailed {
        status: SolutionStatus,
        message: String,
    },

    #[error("Solution has {found} values but the problem has {expected} variables")]
    MalformedSolution { expected: usize, found: usize },
}

/// Assignment tables of one solved instance
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub status: SolutionStatus,
    pub objective_value: f64,
    pub components: ComponentValues,
    /// `(activity, agent, scenario)`
    pub assign: BTreeMap<(usize, usize, usize), f64>,
    /// `(activity, equipment, scenario)`
    pub equip: BTreeMap<(usize, usize, usize), f64>,
    /// `(activity, scenario)`
    pub duration: BTreeMap<(usize, usize), f64>,
}

impl Schedule {
    /// Agent carrying the largest share of an activity in a scenario
    pub fn agent_for(&self, activity: usize, scenario: usize) -> Option<usize> {
        self.assign
            .range((activity, 0, 0)..(activity + 1, 0, 0))
            .filter(|&(&(_, _, s), _)| s == scenario)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .filter(|&(_, &v)| v > 0.0)
            .map(|(&(_, j, _), _)| j)
    }

    /// Equipment units in use (value above one half) for an activity in a scenario
    pub fn equipment_for(&self, activity: usize, scenario: usize) -> Vec<usize> {
        self.equip
            .range((activity, 0, 0)..(activity + 1, 0, 0))
            .filter(|&(&(_, _, s), &v)| s == scenario && v > 0.5)
            .map(|(&(_, e, _), _)| e)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultExtractor {
    precision: u32,
}

impl Default for ResultExtractor {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

/// Digits an `f64` fraction carries; more would overflow the rounding scale
pub const MAX_PRECISION: u32 = 15;

impl ResultExtractor {
    /// Round assignment fractions to `decimals` places, at most [`MAX_PRECISION`]
    pub fn with_precision(decimals: u32) -> Self {
        Self {
            precision: decimals.min(MAX_PRECISION),
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn extract(
        &self,
        problem: &ScheduleProblem,
        solution: &Solution,
    ) -> Result<Schedule, ExtractError> {
        let values = checked_values(problem, solution)?;
        let layout = &problem.layout;
        let d = layout.dimensions();

        let mut assign = BTreeMap::new();
        let mut equip = BTreeMap::new();
        let mut duration = BTreeMap::new();

        for h in 0..d.num_activities {
            for s in 0..d.num_scenarios {
                for j in 0..d.num_agents {
                    assign.insert((h, j, s), self.fraction(values[layout.assign(h, j, s)]));
                }
                for e in 0..d.num_equipment {
                    equip.insert((h, e, s), self.fraction(values[layout.equip(h, e, s)]));
                }
                let var = &problem.problem.variables[layout.duration(h, s)];
                let raw = values[layout.duration(h, s)];
                let t = match problem.duration_domain {
                    DurationDomain::Integer => raw.round(),
                    DurationDomain::Continuous => raw,
                };
                duration.insert(
                    (h, s),
                    t.clamp(var.lower_bound, var.upper_bound.unwrap_or(f64::INFINITY)),
                );
            }
        }

        tracing::info!(
            status = %solution.status,
            objective = solution.objective_value.unwrap_or_default(),
            "extracted schedule"
        );

        Ok(Schedule {
            status: solution.status,
            objective_value: solution
                .objective_value
                .unwrap_or_else(|| problem.problem.objective.evaluate(values)),
            components: problem.components.evaluate(values),
            assign,
            equip,
            duration,
        })
    }

    /// Collaboration indicators keyed by `(activity, agent i, agent j, scenario)`
    pub fn collaboration(
        &self,
        problem: &ScheduleProblem,
        solution: &Solution,
    ) -> Result<BTreeMap<(usize, usize, usize, usize), f64>, ExtractError> {
        let values = checked_values(problem, solution)?;
        let layout = &problem.layout;
        let d = layout.dimensions();

        let mut collab = BTreeMap::new();
        for h in 0..d.num_activities {
            for i in 0..d.num_agents {
                for j in 0..d.num_agents {
                    for s in 0..d.num_scenarios {
                        collab.insert(
                            (h, i, j, s),
                            self.fraction(values[layout.collab(h, i, j, s)]),
                        );
                    }
                }
            }
        }
        Ok(collab)
    }

    fn fraction(&self, raw: f64) -> f64 {
        let scale = 10f64.powi(self.precision as i32);
        ((raw * scale).round() / scale).clamp(0.0, 1.0)
    }
}

fn checked_values<'a>(
    problem: &ScheduleProblem,
    solution: &'a Solution,
) -> Result<&'a [f64], ExtractError> {
    if !solution.status.has_solution() {
        tracing::warn!(status = %solution.status, message = %solution.message, "no usable solution");
        return Err(ExtractError::SolveFailed {
            status: solution.status,
            message: solution.message.clone(),
        });
    }
    let expected = problem.layout.num_variables();
    if solution.variable_values.len() != expected {
        return Err(ExtractError::MalformedSolution {
            expected,
            found: solution.variable_values.len(),
        });
    }
    Ok(&solution.variable_values)
}
