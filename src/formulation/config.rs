// Tunable constants of the formulation

use super::error::FormulationError;

/// Weights of the three objective components; must sum to one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveWeights {
    pub cost: f64,
    pub quality: f64,
    pub collaboration: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            cost: 0.1,
            quality: 0.6,
            collaboration: 0.3,
        }
    }
}

/// Domain of the agent and equipment assignment variables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentDomain {
    /// {0, 1} indicators
    Binary,
    /// Fractions in [0, 1]
    Relaxed,
}

/// Domain of the duration variables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationDomain {
    Continuous,
    /// Whole time units; extracted durations are rounded
    Integer,
}

/// How the equipment variable cost is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableCostMode {
    /// `Beta * util`: only for equipment actually used
    Gated,
    /// `Beta * duration` for every equipment unit
    Ungated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormulationConfig {
    pub weights: ObjectiveWeights,
    /// Per-scenario floor on aggregate agent quality
    pub min_quality_agent: f64,
    /// Per-scenario floor on aggregate equipment quality
    pub min_quality_equipment: f64,
    /// Ceiling on equipment fixed cost plus agent cost across all scenarios
    pub budget_cap: f64,
    /// Agent pairs whose collaboration factor is below this may not share an activity
    pub collaboration_threshold: f64,
    /// Finite upper bound for the gated-utilization variables
    pub big_m: f64,
    pub assignment_domain: AssignmentDomain,
    pub duration_domain: DurationDomain,
    pub variable_cost: VariableCostMode,
    /// Multiply agent quality by activity importance in the aggregate floor
    pub importance_weighted_quality: bool,
    pub min_activity_agent_quality: Option<f64>,
    pub min_activity_equipment_quality: Option<f64>,
    /// Tangent points used to approximate `1 / duration`
    pub reciprocal_breakpoints: usize,
}

impl Default for FormulationConfig {
    fn default() -> Self {
        Self {
            weights: ObjectiveWeights::default(),
            min_quality_agent: 50.0,
            min_quality_equipment: 100.0,
            budget_cap: 100_000.0,
            collaboration_threshold: 0.3,
            big_m: 1000.0,
            assignment_domain: AssignmentDomain::Binary,
            duration_domain: DurationDomain::Continuous,
            variable_cost: VariableCostMode::Gated,
            importance_weighted_quality: false,
            min_activity_agent_quality: None,
            min_activity_equipment_quality: None,
            reciprocal_breakpoints: 8,
        }
    }
}

impl FormulationConfig {
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_quality_floors(mut self, agent: f64, equipment: f64) -> Self {
        self.min_quality_agent = agent;
        self.min_quality_equipment = equipment;
        self
    }

    pub fn with_activity_quality_floors(
        mut self,
        agent: Option<f64>,
        equipment: Option<f64>,
    ) -> Self {
        self.min_activity_agent_quality = agent;
        self.min_activity_equipment_quality = equipment;
        self
    }

    pub fn with_budget_cap(mut self, budget_cap: f64) -> Self {
        self.budget_cap = budget_cap;
        self
    }

    pub fn with_collaboration_threshold(mut self, threshold: f64) -> Self {
        self.collaboration_threshold = threshold;
        self
    }

    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    pub fn with_assignment_domain(mut self, domain: AssignmentDomain) -> Self {
        self.assignment_domain = domain;
        self
    }

    pub fn with_duration_domain(mut self, domain: DurationDomain) -> Self {
        self.duration_domain = domain;
        self
    }

    pub fn with_variable_cost(mut self, mode: VariableCostMode) -> Self {
        self.variable_cost = mode;
        self
    }

    pub fn with_importance_weighted_quality(mut self, enabled: bool) -> Self {
        self.importance_weighted_quality = enabled;
        self
    }

    pub fn with_reciprocal_breakpoints(mut self, n: usize) -> Self {
        self.reciprocal_breakpoints = n;
        self
    }

    /// Reject settings that make the formulation meaningless regardless of data
    pub fn validate(&self) -> Result<(), FormulationError> {
        let w = self.weights;
        if [w.cost, w.quality, w.collaboration]
            .iter()
            .any(|x| !x.is_finite() || *x < 0.0)
        {
            return Err(FormulationError::InvalidConfig(
                "objective weights must be finite and non-negative".to_string(),
            ));
        }
        let total = w.cost + w.quality + w.collaboration;
        if (total - 1.0).abs() > 1e-9 {
            return Err(FormulationError::InvalidConfig(format!(
                "objective weights must sum to 1, got {}",
                total
            )));
        }

        let scalars = [
            ("minQualityAgent", self.min_quality_agent),
            ("minQualityEquipment", self.min_quality_equipment),
            ("budgetCap", self.budget_cap),
            ("collaborationThreshold", self.collaboration_threshold),
            ("bigM", self.big_m),
        ];
        if let Some((name, value)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(FormulationError::InvalidConfig(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }
        if self.big_m <= 0.0 {
            return Err(FormulationError::InvalidConfig(
                "bigM must be positive".to_string(),
            ));
        }
        if self.reciprocal_breakpoints == 0 {
            return Err(FormulationError::InvalidConfig(
                "at least one reciprocal breakpoint is required".to_string(),
            ));
        }
        Ok(())
    }
}
