#![cfg(feature = "highs")]

use std::sync::Arc;
use std::time::Duration;

use stochassign::{
    AssignmentPlanner, Dataset, Dimensions, DurationDomain, ExtractError, FormulationConfig,
    FormulationError, HighsSolver, InstanceGenerator, ObjectiveWeights, PlanningError,
    ProblemBuilder, ResultExtractor, SolutionStatus, SolverService,
};

const TOL: f64 = 1e-6;

fn instance(h: usize, j: usize, e: usize, s: usize) -> Dataset {
    Dataset {
        dimensions: Dimensions::new(h, j, e, s),
        activity_importance: vec![1; h],
        min_duration: vec![1.0; h],
        max_duration: vec![4.0; h],
        fixed_cost: vec![10.0; h],
        agent_quality: vec![vec![3.0; j]; h],
        equipment_quality: vec![vec![2.0; e]; h],
        collaboration_factor: vec![vec![1.0; j]; j],
        equipment_fixed_cost: vec![vec![vec![100.0; s]; e]; h],
        equipment_variable_cost_factor: vec![vec![vec![10.0; s]; e]; h],
        agent_overhead: vec![vec![vec![1.0; s]; h]; j],
        agent_time_cost: vec![vec![vec![0.5; s]; h]; j],
        agent_fixed_penalty: vec![vec![vec![0.2; s]; h]; j],
    }
}

fn permissive() -> FormulationConfig {
    FormulationConfig::default().with_quality_floors(0.0, 0.0)
}

fn planner(config: FormulationConfig) -> AssignmentPlanner {
    AssignmentPlanner::new(Arc::new(HighsSolver::new()), config)
        .with_time_limit(Duration::from_secs(60))
}

#[test]
fn quality_floor_forces_the_only_feasible_assignment() {
    let mut data = instance(2, 2, 1, 1);
    data.agent_quality = vec![vec![5.0, 1.0], vec![1.0, 5.0]];
    // Collaboration alone would put agent 0 on both activities
    data.collaboration_factor = vec![vec![1.0, 0.5], vec![0.5, 0.0]];
    let config = permissive()
        .with_quality_floors(8.0, 0.0)
        .with_weights(ObjectiveWeights {
            cost: 0.0,
            quality: 0.0,
            collaboration: 1.0,
        });

    let outcome = planner(config).plan(&data).unwrap();
    let schedule = &outcome.schedule;
    assert_eq!(schedule.status, SolutionStatus::Optimal);
    assert_eq!(schedule.agent_for(0, 0), Some(0));
    assert_eq!(schedule.agent_for(1, 0), Some(1));
    assert_eq!(schedule.assign[&(0, 0, 0)], 1.0);
    assert_eq!(schedule.assign[&(1, 0, 0)], 0.0);
}

#[test]
fn fixed_window_pins_duration_in_every_scenario() {
    let mut data = instance(2, 2, 2, 3);
    data.min_duration[0] = 3.0;
    data.max_duration[0] = 3.0;
    for e in 0..2 {
        data.equipment_variable_cost_factor[0][e] = vec![1.0, 50.0, 500.0];
        data.equipment_fixed_cost[0][e] = vec![150.0, 120.0, 199.0];
    }

    let schedule = planner(permissive()).plan(&data).unwrap().schedule;
    for s in 0..3 {
        assert_eq!(schedule.duration[&(0, s)], 3.0);
    }
}

#[test]
fn generated_instance_satisfies_model_invariants() {
    let data = InstanceGenerator::new(Dimensions::new(3, 4, 3, 2), 5).generate();
    let config = permissive();
    let outcome = planner(config).plan(&data).unwrap();
    let (problem, solution, schedule) = (&outcome.problem, &outcome.solution, &outcome.schedule);
    let d = data.dimensions;

    assert!(solution.is_feasible());
    assert!(solution.quality.max_constraint_violation <= 1e-5);

    for h in 0..d.num_activities {
        for s in 0..d.num_scenarios {
            let row: f64 = (0..d.num_agents).map(|j| schedule.assign[&(h, j, s)]).sum();
            assert!((row - 1.0).abs() <= TOL, "assign[{},*,{}] sums to {}", h, s, row);

            let t = schedule.duration[&(h, s)];
            assert!(t >= data.min_duration[h] && t <= data.max_duration[h]);

            let used: f64 = (0..d.num_equipment).map(|e| schedule.equip[&(h, e, s)]).sum();
            assert!(used >= 1.0 - TOL);
        }
    }

    let collab = ResultExtractor::default()
        .collaboration(problem, solution)
        .unwrap();
    for (&(h, i, j, s), &z) in &collab {
        let expected = schedule.assign[&(h, i, s)].min(schedule.assign[&(h, j, s)]);
        assert!((z - expected).abs() <= TOL, "collab[{},{},{},{}]", h, i, j, s);
    }
}

#[test]
fn unreachable_quality_is_rejected_before_solving() {
    let mut data = instance(2, 2, 1, 1);
    data.agent_quality = vec![vec![5.0, 1.0], vec![1.0, 5.0]];
    let config = permissive().with_quality_floors(10.5, 0.0);

    match planner(config).plan(&data) {
        Err(PlanningError::Formulation(FormulationError::InfeasibleSpec(msg))) => {
            assert!(msg.contains("minQualityAgent"));
        }
        other => panic!("expected InfeasibleSpec, got {:?}", other.map(|o| o.schedule)),
    }
}

#[test]
fn budget_conflict_surfaces_as_solve_failed() {
    // The only unit with enough quality costs more than the budget allows
    let mut data = instance(1, 1, 2, 1);
    data.equipment_quality = vec![vec![0.0, 5.0]];
    data.equipment_fixed_cost = vec![vec![vec![1.0], vec![100.0]]];
    data.agent_overhead = vec![vec![vec![0.0]]];
    data.agent_time_cost = vec![vec![vec![0.0]]];
    let config = permissive().with_quality_floors(0.0, 5.0).with_budget_cap(50.0);

    match planner(config).plan(&data) {
        Err(PlanningError::Extract(ExtractError::SolveFailed { status, .. })) => {
            assert_eq!(status, SolutionStatus::Infeasible);
        }
        other => panic!("expected SolveFailed, got {:?}", other.map(|o| o.schedule)),
    }
}

#[test]
fn time_limit_surfaces_as_solve_failed() {
    let data = InstanceGenerator::new(Dimensions::new(10, 15, 6, 4), 3).generate();
    let planner = AssignmentPlanner::new(
        Arc::new(HighsSolver::new()),
        permissive().with_budget_cap(1e7),
    )
    .with_time_limit(Duration::from_micros(1));

    match planner.plan(&data) {
        Err(PlanningError::Extract(ExtractError::SolveFailed { status, .. })) => {
            assert_eq!(status, SolutionStatus::TimedOut);
        }
        other => panic!("expected SolveFailed, got {:?}", other.map(|o| o.schedule)),
    }
}

#[test]
fn gated_variable_cost_leaves_expensive_equipment_idle() {
    let mut data = instance(1, 1, 2, 1);
    data.equipment_fixed_cost = vec![vec![vec![100.0], vec![180.0]]];
    let outcome = planner(permissive()).plan(&data).unwrap();
    let l = outcome.problem.layout;

    assert_eq!(outcome.schedule.equip[&(0, 0, 0)], 1.0);
    assert_eq!(outcome.schedule.equip[&(0, 1, 0)], 0.0);
    assert!(outcome.solution.variable_values[l.util(0, 1, 0)].abs() <= TOL);
}

#[test]
fn reciprocal_surrogate_trades_time_against_penalty() {
    let mut data = instance(1, 1, 1, 1);
    data.agent_time_cost = vec![vec![vec![1.0]]];
    data.agent_fixed_penalty = vec![vec![vec![6.25]]];
    data.equipment_variable_cost_factor = vec![vec![vec![0.001]]];

    // t + 6.25 / t over whole durations is smallest at 3
    let config = permissive().with_duration_domain(DurationDomain::Integer);
    let schedule = planner(config).plan(&data).unwrap().schedule;
    assert_eq!(schedule.duration[&(0, 0)], 3.0);

    // Continuous optimum is 2.5; the envelope kink next to it is close by
    let schedule = planner(permissive()).plan(&data).unwrap().schedule;
    assert!((schedule.duration[&(0, 0)] - 2.5).abs() < 0.3);
}

#[test]
fn rebuilding_gives_identical_problem() {
    let data = InstanceGenerator::new(Dimensions::new(2, 3, 2, 2), 9).generate();
    let builder = ProblemBuilder::new(permissive());
    let (a, b) = (builder.build(&data).unwrap(), builder.build(&data).unwrap());
    assert_eq!(a.problem.num_variables(), b.problem.num_variables());
    assert_eq!(a.problem.constraints.len(), b.problem.constraints.len());
    assert_eq!(a, b);
}

#[test]
fn solver_rejects_nothing_the_builder_emits() {
    let data = InstanceGenerator::new(Dimensions::new(3, 3, 2, 2), 1).generate();
    let built = ProblemBuilder::new(permissive()).build(&data).unwrap();
    assert!(HighsSolver::new().validate(&built.problem).is_ok());
}

#[tokio::test]
async fn batch_planning_keeps_input_order() {
    let good = instance(2, 2, 1, 1);
    let mut bad = instance(2, 2, 1, 1);
    bad.min_duration[0] = 9.0;

    let results = planner(permissive())
        .plan_all(&[good.clone(), bad, good])
        .await;
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(PlanningError::Formulation(FormulationError::Data(_)))
    ));
    assert!(results[2].is_ok());
}

#[tokio::test]
async fn async_plan_matches_blocking_plan() {
    let data = InstanceGenerator::new(Dimensions::new(2, 3, 2, 1), 21).generate();
    let planner = planner(permissive());
    let blocking = planner.plan(&data).unwrap();
    let asynchronous = planner.plan_async(&data).await.unwrap();
    assert!((blocking.schedule.objective_value - asynchronous.schedule.objective_value).abs() < 1e-6);
}
