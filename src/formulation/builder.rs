// Construction of the stochastic assignment MILP.
// The objective is stated in maximization form:
// maximize w_quality * quality + w_collaboration * collaboration - w_cost * cost
// where collaboration is linearized through the `collab` AND-variables and
// the `agentFixedPenalty / duration` cost term through `recip`, a variable
// held above tangent lines of `1 / duration`. Every non-negative cost
// coefficient pushes `recip` down onto that envelope, so the surrogate is
// exact at each breakpoint and a lower approximation between them.

use std::sync::Arc;

use crate::data::{Dataset, Dimensions};
use crate::domain::{
    Constraint, ObjectiveFunction, OptimizationProblem, OptimizationType, Variable,
};

use super::config::{AssignmentDomain, DurationDomain, FormulationConfig, VariableCostMode};
use super::error::FormulationError;
use super::layout::VariableLayout;

const FLOOR_TOLERANCE: f64 = 1e-9;

/// Per-variable coefficients of each objective component, before weighting
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveComponents {
    pub cost: Vec<f64>,
    pub cost_constant: f64,
    pub quality: Vec<f64>,
    pub collaboration: Vec<f64>,
}

/// Unweighted component values at a given point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComponentValues {
    pub cost: f64,
    pub quality: f64,
    pub collaboration: f64,
}

impl ObjectiveComponents {
    fn zeros(n: usize) -> Self {
        Self {
            cost: vec![0.0; n],
            cost_constant: 0.0,
            quality: vec![0.0; n],
            collaboration: vec![0.0; n],
        }
    }

    pub fn evaluate(&self, values: &[f64]) -> ComponentValues {
        let dot = |coeffs: &[f64]| coeffs.iter().zip(values).map(|(c, v)| c * v).sum::<f64>();
        ComponentValues {
            cost: self.cost_constant + dot(&self.cost),
            quality: dot(&self.quality),
            collaboration: dot(&self.collaboration),
        }
    }
}

/// An assignment problem ready to hand to a solver, with the bookkeeping
/// needed to read the answer back
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleProblem {
    /// Shared read-only with the solver once built
    pub problem: Arc<OptimizationProblem>,
    pub layout: VariableLayout,
    pub components: ObjectiveComponents,
    pub duration_domain: DurationDomain,
}

impl ScheduleProblem {
    pub fn dimensions(&self) -> Dimensions {
        self.layout.dimensions()
    }

    /// Constraints whose name starts with `family`, e.g. `"single_agent"`
    pub fn constraints_in<'a>(&'a self, family: &'a str) -> impl Iterator<Item = &'a Constraint> {
        self.problem
            .constraints
            .iter()
            .filter(move |c| c.name.split('[').next() == Some(family))
    }
}

/// Builds one [`ScheduleProblem`] per dataset. Deterministic: the same
/// dataset and configuration always produce an identical problem.
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    config: FormulationConfig,
}

impl ProblemBuilder {
    pub fn new(config: FormulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormulationConfig {
        &self.config
    }

    pub fn build(&self, data: &Dataset) -> Result<ScheduleProblem, FormulationError> {
        data.validate()?;
        self.config.validate()?;
        self.check_static_feasibility(data)?;

        let layout = VariableLayout::new(data.dimensions);
        let assembly = Assembly::new(data, &self.config, layout);
        let variables = assembly.variables();
        let components = assembly.objective_components();
        let constraints = assembly.constraints();

        let coefficients = self.weigh(&components);
        let objective = ObjectiveFunction::new(OptimizationType::Maximize, coefficients)
            .with_constant(-self.config.weights.cost * components.cost_constant);

        let d = data.dimensions;
        let problem = OptimizationProblem::new(objective)
            .with_name(format!(
                "stochastic-assignment-{}x{}x{}x{}",
                d.num_activities, d.num_agents, d.num_equipment, d.num_scenarios
            ))
            .with_variables(variables)
            .with_constraints(constraints);

        tracing::info!(
            problem = %problem.name,
            variables = problem.num_variables(),
            integer_variables = problem.num_integer_variables(),
            constraints = problem.constraints.len(),
            "built assignment problem"
        );

        Ok(ScheduleProblem {
            problem: Arc::new(problem),
            layout,
            components,
            duration_domain: self.config.duration_domain,
        })
    }

    fn weigh(&self, c: &ObjectiveComponents) -> Vec<f64> {
        let w = self.config.weights;
        c.quality
            .iter()
            .zip(&c.collaboration)
            .zip(&c.cost)
            .map(|((q, k), cost)| w.quality * q + w.collaboration * k - w.cost * cost)
            .collect()
    }

    /// Contradictions visible from the data alone, before any solver runs
    fn check_static_feasibility(&self, data: &Dataset) -> Result<(), FormulationError> {
        let config = &self.config;
        let d = data.dimensions;

        let max_duration = data.max_duration.iter().copied().fold(0.0, f64::max);
        if config.big_m < max_duration {
            return Err(FormulationError::InvalidConfig(format!(
                "bigM ({}) is below the largest maxDuration ({})",
                config.big_m, max_duration
            )));
        }

        if d.num_activities > 0 && (d.num_agents == 0 || d.num_equipment == 0) {
            return Err(FormulationError::InfeasibleSpec(
                "every activity needs one agent and at least one equipment unit".to_string(),
            ));
        }

        if config.duration_domain == DurationDomain::Integer {
            for (h, (lo, hi)) in data.min_duration.iter().zip(&data.max_duration).enumerate() {
                if lo.ceil() > hi.floor() {
                    return Err(FormulationError::InfeasibleSpec(format!(
                        "activity {} has no whole duration in [{}, {}]",
                        h, lo, hi
                    )));
                }
            }
        }

        let best_agent: Vec<f64> = data
            .agent_quality
            .iter()
            .enumerate()
            .map(|(h, row)| {
                let scale = agent_quality_scale(data, config, h);
                row.iter().map(|b| scale * b).fold(f64::NEG_INFINITY, f64::max)
            })
            .collect();
        let reachable = best_agent.iter().sum::<f64>();
        if reachable + FLOOR_TOLERANCE < config.min_quality_agent {
            return Err(FormulationError::InfeasibleSpec(format!(
                "minQualityAgent ({}) exceeds the best reachable agent quality ({})",
                config.min_quality_agent, reachable
            )));
        }

        let best_equipment: Vec<f64> = data
            .equipment_quality
            .iter()
            .map(|row| best_equipment_quality(row))
            .collect();
        let reachable = best_equipment.iter().sum::<f64>();
        if reachable + FLOOR_TOLERANCE < config.min_quality_equipment {
            return Err(FormulationError::InfeasibleSpec(format!(
                "minQualityEquipment ({}) exceeds the best reachable equipment quality ({})",
                config.min_quality_equipment, reachable
            )));
        }

        if let Some(floor) = config.min_activity_agent_quality {
            let best = |row: &Vec<f64>| row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if let Some(h) = data
                .agent_quality
                .iter()
                .position(|row| best(row) + FLOOR_TOLERANCE < floor)
            {
                return Err(FormulationError::InfeasibleSpec(format!(
                    "no agent reaches quality {} on activity {}",
                    floor, h
                )));
            }
        }
        if let Some(floor) = config.min_activity_equipment_quality {
            if let Some(h) = best_equipment.iter().position(|&q| q + FLOOR_TOLERANCE < floor) {
                return Err(FormulationError::InfeasibleSpec(format!(
                    "equipment cannot reach quality {} on activity {}",
                    floor, h
                )));
            }
        }

        let cheapest = self.minimum_budget_spend(data);
        if cheapest > config.budget_cap + FLOOR_TOLERANCE {
            return Err(FormulationError::InfeasibleSpec(format!(
                "budgetCap ({}) is below the cheapest possible spend ({})",
                config.budget_cap, cheapest
            )));
        }

        Ok(())
    }

    /// Lower bound of the budget-cap left-hand side: cheapest single
    /// equipment unit and shortest duration everywhere
    fn minimum_budget_spend(&self, data: &Dataset) -> f64 {
        let d = data.dimensions;
        let mut spend = 0.0;
        for h in 0..d.num_activities {
            for s in 0..d.num_scenarios {
                spend += (0..d.num_equipment)
                    .map(|e| data.equipment_fixed_cost[h][e][s])
                    .fold(f64::INFINITY, f64::min);
                for j in 0..d.num_agents {
                    spend += data.agent_overhead[j][h][s]
                        + data.agent_time_cost[j][h][s] * data.min_duration[h];
                }
            }
        }
        spend
    }
}

/// Activity importance multiplies agent quality when the config asks for it
fn agent_quality_scale(data: &Dataset, config: &FormulationConfig, h: usize) -> f64 {
    if config.importance_weighted_quality {
        data.activity_importance[h] as f64
    } else {
        1.0
    }
}

/// Best equipment quality an activity can collect: every unit with positive quality
fn best_equipment_quality(row: &[f64]) -> f64 {
    let positive: f64 = row.iter().filter(|&&r| r > 0.0).sum();
    if positive > 0.0 {
        positive
    } else {
        // At least one unit must be used
        row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Tangent points of `1 / duration` over `[lo, hi]`
fn reciprocal_breakpoints(lo: f64, hi: f64, n: usize, domain: DurationDomain) -> Vec<f64> {
    if hi - lo <= f64::EPSILON {
        return vec![lo];
    }
    let evenly = |lo: f64, hi: f64| -> Vec<f64> {
        if n == 1 {
            return vec![lo];
        }
        (0..n)
            .map(|k| lo + (hi - lo) * k as f64 / (n - 1) as f64)
            .collect()
    };

    match domain {
        DurationDomain::Continuous => evenly(lo, hi),
        DurationDomain::Integer => {
            let (first, last) = (lo.ceil(), hi.floor());
            let mut points: Vec<f64> = evenly(first, last).into_iter().map(f64::round).collect();
            if (last - first) as usize + 1 <= n {
                points = (first as i64..=last as i64).map(|t| t as f64).collect();
            }
            points.dedup();
            points
        }
    }
}

/// Sum duplicate columns so every row lists each variable once
fn combine(mut terms: Vec<(usize, f64)>) -> Vec<(usize, f64)> {
    terms.sort_by_key(|&(i, _)| i);
    let mut merged: Vec<(usize, f64)> = Vec::with_capacity(terms.len());
    for (i, c) in terms {
        match merged.last_mut() {
            Some((last, acc)) if *last == i => *acc += c,
            _ => merged.push((i, c)),
        }
    }
    merged
}

/// Working state for one build
struct Assembly<'a> {
    data: &'a Dataset,
    config: &'a FormulationConfig,
    layout: VariableLayout,
    weights: Vec<f64>,
}

impl<'a> Assembly<'a> {
    fn new(data: &'a Dataset, config: &'a FormulationConfig, layout: VariableLayout) -> Self {
        Self {
            data,
            config,
            layout,
            weights: data.scenario_weights(),
        }
    }

    fn dims(&self) -> Dimensions {
        self.data.dimensions
    }

    fn assignment_variable(&self, name: String) -> Variable {
        match self.config.assignment_domain {
            AssignmentDomain::Binary => Variable::binary(name),
            AssignmentDomain::Relaxed => Variable::continuous(name).with_bounds(0.0, Some(1.0)),
        }
    }

    /// Variables in layout order
    fn variables(&self) -> Vec<Variable> {
        let Dimensions {
            num_activities: nh,
            num_agents: nj,
            num_equipment: ne,
            num_scenarios: ns,
        } = self.dims();
        let data = self.data;
        let mut vars = Vec::with_capacity(self.layout.num_variables());

        for h in 0..nh {
            for j in 0..nj {
                for s in 0..ns {
                    vars.push(self.assignment_variable(format!("assign[{},{},{}]", h, j, s)));
                }
            }
        }
        for h in 0..nh {
            for e in 0..ne {
                for s in 0..ns {
                    vars.push(self.assignment_variable(format!("equip[{},{},{}]", h, e, s)));
                }
            }
        }
        for h in 0..nh {
            let bounds = (data.min_duration[h], Some(data.max_duration[h]));
            for s in 0..ns {
                let name = format!("duration[{},{}]", h, s);
                let var = match self.config.duration_domain {
                    DurationDomain::Continuous => Variable::continuous(name),
                    DurationDomain::Integer => Variable::integer(name),
                };
                vars.push(var.with_bounds(bounds.0, bounds.1));
            }
        }
        for h in 0..nh {
            for i in 0..nj {
                for j in 0..nj {
                    for s in 0..ns {
                        vars.push(Variable::binary(format!("collab[{},{},{},{}]", h, i, j, s)));
                    }
                }
            }
        }
        for h in 0..nh {
            for e in 0..ne {
                for s in 0..ns {
                    vars.push(
                        Variable::continuous(format!("util[{},{},{}]", h, e, s))
                            .with_bounds(0.0, Some(self.config.big_m)),
                    );
                }
            }
        }
        for h in 0..nh {
            let bounds = (1.0 / data.max_duration[h], Some(1.0 / data.min_duration[h]));
            for s in 0..ns {
                vars.push(
                    Variable::continuous(format!("recip[{},{}]", h, s))
                        .with_bounds(bounds.0, bounds.1),
                );
            }
        }

        debug_assert_eq!(vars.len(), self.layout.num_variables());
        vars
    }

    fn objective_components(&self) -> ObjectiveComponents {
        let Dimensions {
            num_activities: nh,
            num_agents: nj,
            num_equipment: ne,
            num_scenarios: ns,
        } = self.dims();
        let (data, layout) = (self.data, &self.layout);
        let mut c = ObjectiveComponents::zeros(layout.num_variables());

        c.cost_constant = data.fixed_cost.iter().sum();

        for s in 0..ns {
            let p = self.weights[s];
            for h in 0..nh {
                for e in 0..ne {
                    c.cost[layout.equip(h, e, s)] += p * data.equipment_fixed_cost[h][e][s];
                    let beta = p * data.equipment_variable_cost_factor[h][e][s];
                    match self.config.variable_cost {
                        VariableCostMode::Gated => c.cost[layout.util(h, e, s)] += beta,
                        VariableCostMode::Ungated => c.cost[layout.duration(h, s)] += beta,
                    }
                }
                for j in 0..nj {
                    c.cost_constant += p * data.agent_overhead[j][h][s];
                    c.cost[layout.duration(h, s)] += p * data.agent_time_cost[j][h][s];
                    c.cost[layout.recip(h, s)] += p * data.agent_fixed_penalty[j][h][s];
                    c.quality[layout.assign(h, j, s)] += p * data.agent_quality[h][j];
                    for i in 0..nj {
                        c.collaboration[layout.collab(h, i, j, s)] +=
                            p * data.collaboration_factor[i][j];
                    }
                }
            }
        }
        c
    }

    fn constraints(&self) -> Vec<Constraint> {
        let mut rows = Vec::new();
        let families: [(&str, fn(&Self, &mut Vec<Constraint>)); 9] = [
            ("single_agent", Self::single_agent),
            ("equipment_coverage", Self::equipment_coverage),
            ("collab", Self::collaboration_linearization),
            ("util", Self::utilization_gating),
            ("quality_floor", Self::quality_floors),
            ("activity_quality_floor", Self::activity_quality_floors),
            ("collaboration_exclusion", Self::collaboration_exclusion),
            ("budget_cap", Self::budget_cap),
            ("reciprocal_tangent", Self::reciprocal_tangents),
        ];
        for (family, add) in families {
            let before = rows.len();
            add(self, &mut rows);
            tracing::debug!(family, rows = rows.len() - before, "generated constraints");
        }
        rows
    }

    fn single_agent(&self, rows: &mut Vec<Constraint>) {
        let d = self.dims();
        for h in 0..d.num_activities {
            for s in 0..d.num_scenarios {
                let terms = (0..d.num_agents)
                    .map(|j| (self.layout.assign(h, j, s), 1.0))
                    .collect();
                rows.push(Constraint::eq(terms, 1.0).with_name(format!("single_agent[{},{}]", h, s)));
            }
        }
    }

    fn equipment_coverage(&self, rows: &mut Vec<Constraint>) {
        let d = self.dims();
        for h in 0..d.num_activities {
            for s in 0..d.num_scenarios {
                let terms = (0..d.num_equipment)
                    .map(|e| (self.layout.equip(h, e, s), 1.0))
                    .collect();
                rows.push(
                    Constraint::geq(terms, 1.0)
                        .with_name(format!("equipment_coverage[{},{}]", h, s)),
                );
            }
        }
    }

    /// `collab = assign_i AND assign_j` as three inequalities
    fn collaboration_linearization(&self, rows: &mut Vec<Constraint>) {
        let d = self.dims();
        let l = &self.layout;
        for h in 0..d.num_activities {
            for i in 0..d.num_agents {
                for j in 0..d.num_agents {
                    for s in 0..d.num_scenarios {
                        let z = l.collab(h, i, j, s);
                        let (xi, xj) = (l.assign(h, i, s), l.assign(h, j, s));
                        let idx = format!("{},{},{},{}", h, i, j, s);
                        rows.push(
                            Constraint::leq(combine(vec![(z, 1.0), (xi, -1.0)]), 0.0)
                                .with_name(format!("collab_upper_1[{}]", idx)),
                        );
                        rows.push(
                            Constraint::leq(combine(vec![(z, 1.0), (xj, -1.0)]), 0.0)
                                .with_name(format!("collab_upper_2[{}]", idx)),
                        );
                        rows.push(
                            Constraint::geq(combine(vec![(z, 1.0), (xi, -1.0), (xj, -1.0)]), -1.0)
                                .with_name(format!("collab_lower[{}]", idx)),
                        );
                    }
                }
            }
        }
    }

    /// `util = duration` when the equipment is used, zero otherwise
    fn utilization_gating(&self, rows: &mut Vec<Constraint>) {
        let d = self.dims();
        let l = &self.layout;
        for h in 0..d.num_activities {
            let t_max = self.data.max_duration[h];
            for e in 0..d.num_equipment {
                for s in 0..d.num_scenarios {
                    let (u, y, t) = (l.util(h, e, s), l.equip(h, e, s), l.duration(h, s));
                    rows.push(
                        Constraint::leq(vec![(u, 1.0), (y, -t_max)], 0.0)
                            .with_name(format!("util_upper[{},{},{}]", h, e, s)),
                    );
                    rows.push(
                        Constraint::geq(vec![(u, 1.0), (t, -1.0), (y, -t_max)], -t_max)
                            .with_name(format!("util_lower[{},{},{}]", h, e, s)),
                    );
                }
            }
        }
    }

    fn quality_floors(&self, rows: &mut Vec<Constraint>) {
        let d = self.dims();
        let data = self.data;
        for s in 0..d.num_scenarios {
            let mut agent_terms = Vec::with_capacity(d.num_activities * d.num_agents);
            let mut equip_terms = Vec::with_capacity(d.num_activities * d.num_equipment);
            for h in 0..d.num_activities {
                let scale = agent_quality_scale(data, self.config, h);
                for j in 0..d.num_agents {
                    agent_terms.push((self.layout.assign(h, j, s), scale * data.agent_quality[h][j]));
                }
                for e in 0..d.num_equipment {
                    equip_terms.push((self.layout.equip(h, e, s), data.equipment_quality[h][e]));
                }
            }
            rows.push(
                Constraint::geq(agent_terms, self.config.min_quality_agent)
                    .with_name(format!("quality_floor[{}]", s)),
            );
            rows.push(
                Constraint::geq(equip_terms, self.config.min_quality_equipment)
                    .with_name(format!("equip_quality_floor[{}]", s)),
            );
        }
    }

    fn activity_quality_floors(&self, rows: &mut Vec<Constraint>) {
        let d = self.dims();
        let data = self.data;
        for h in 0..d.num_activities {
            for s in 0..d.num_scenarios {
                if let Some(floor) = self.config.min_activity_agent_quality {
                    let terms = (0..d.num_agents)
                        .map(|j| (self.layout.assign(h, j, s), data.agent_quality[h][j]))
                        .collect();
                    rows.push(
                        Constraint::geq(terms, floor)
                            .with_name(format!("activity_quality_floor[{},{}]", h, s)),
                    );
                }
                if let Some(floor) = self.config.min_activity_equipment_quality {
                    let terms = (0..d.num_equipment)
                        .map(|e| (self.layout.equip(h, e, s), data.equipment_quality[h][e]))
                        .collect();
                    rows.push(
                        Constraint::geq(terms, floor)
                            .with_name(format!("activity_equip_quality_floor[{},{}]", h, s)),
                    );
                }
            }
        }
    }

    /// Only pairs below the threshold get a row
    fn collaboration_exclusion(&self, rows: &mut Vec<Constraint>) {
        let d = self.dims();
        let threshold = self.config.collaboration_threshold;
        let excluded = |i: usize, j: usize| i != j && self.data.collaboration_factor[i][j] < threshold;

        for h in 0..d.num_activities {
            for i in 0..d.num_agents {
                for j in (0..d.num_agents).filter(|&j| excluded(i, j)) {
                    for s in 0..d.num_scenarios {
                        let terms = vec![
                            (self.layout.assign(h, i, s), 1.0),
                            (self.layout.assign(h, j, s), 1.0),
                        ];
                        rows.push(
                            Constraint::leq(terms, 1.0).with_name(format!(
                                "collaboration_exclusion[{},{},{},{}]",
                                h, i, j, s
                            )),
                        );
                    }
                }
            }
        }
    }

    fn budget_cap(&self, rows: &mut Vec<Constraint>) {
        let d = self.dims();
        let data = self.data;
        if d.num_activities == 0 {
            return;
        }
        let mut terms = Vec::new();
        let mut overhead = 0.0;
        for h in 0..d.num_activities {
            for s in 0..d.num_scenarios {
                for e in 0..d.num_equipment {
                    terms.push((self.layout.equip(h, e, s), data.equipment_fixed_cost[h][e][s]));
                }
                let mut time_cost = 0.0;
                for j in 0..d.num_agents {
                    overhead += data.agent_overhead[j][h][s];
                    time_cost += data.agent_time_cost[j][h][s];
                }
                terms.push((self.layout.duration(h, s), time_cost));
            }
        }
        rows.push(Constraint::leq(terms, self.config.budget_cap - overhead).with_name("budget_cap"));
    }

    /// `recip ≥ 2/t - duration/t²` for each breakpoint `t`
    fn reciprocal_tangents(&self, rows: &mut Vec<Constraint>) {
        let d = self.dims();
        for h in 0..d.num_activities {
            let points = reciprocal_breakpoints(
                self.data.min_duration[h],
                self.data.max_duration[h],
                self.config.reciprocal_breakpoints,
                self.config.duration_domain,
            );
            for s in 0..d.num_scenarios {
                for (k, &t) in points.iter().enumerate() {
                    let terms = vec![
                        (self.layout.recip(h, s), 1.0),
                        (self.layout.duration(h, s), 1.0 / (t * t)),
                    ];
                    rows.push(
                        Constraint::geq(terms, 2.0 / t)
                            .with_name(format!("reciprocal_tangent[{},{},{}]", h, s, k)),
                    );
                }
            }
        }
    }
}
