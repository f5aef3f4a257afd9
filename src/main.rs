use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use stochassign::{
    AssignmentPlanner, DataSource, Dimensions, FormulationConfig, InstanceGenerator,
    JsonFileSource, PlanOutcome, ResultExtractor, SolverBackend, SolverFactory,
};

#[derive(Parser, Debug)]
#[command(
    name = "stochassign",
    version,
    about = "Assign activities to agents and equipment across cost scenarios"
)]
struct Cli {
    /// JSON dataset; a seeded random instance is generated when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, default_value_t = 4)]
    activities: usize,
    #[arg(long, default_value_t = 6)]
    agents: usize,
    #[arg(long, default_value_t = 3)]
    equipment: usize,
    #[arg(long, default_value_t = 2)]
    scenarios: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Seconds before the solver gives up
    #[arg(long, default_value_t = 60.0)]
    time_limit: f64,
    /// auto, highs or cbc
    #[arg(long, default_value = "auto")]
    backend: SolverBackend,
    /// Decimal places kept in assignment tables
    #[arg(long, default_value_t = 2)]
    precision: u32,
    #[arg(long, default_value_t = 20.0)]
    min_quality_agent: f64,
    #[arg(long, default_value_t = 20.0)]
    min_quality_equipment: f64,
    #[arg(long, default_value_t = 100_000.0)]
    budget_cap: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data = match &cli.input {
        Some(path) => JsonFileSource::new(path).load()?,
        None => InstanceGenerator::new(
            Dimensions::new(cli.activities, cli.agents, cli.equipment, cli.scenarios),
            cli.seed,
        )
        .load()?,
    };

    let config = FormulationConfig::default()
        .with_quality_floors(cli.min_quality_agent, cli.min_quality_equipment)
        .with_budget_cap(cli.budget_cap);

    let solver = SolverFactory::create_from_backend(cli.backend)?;
    println!("📊 Solving with {}", solver.name());

    let planner = AssignmentPlanner::new(solver, config)
        .with_time_limit(Duration::from_secs_f64(cli.time_limit))
        .with_extractor(ResultExtractor::with_precision(cli.precision));

    let outcome = planner.plan_async(&data).await?;
    print_outcome(&outcome);

    Ok(())
}

fn print_outcome(outcome: &PlanOutcome) {
    let schedule = &outcome.schedule;
    let d = outcome.problem.dimensions();

    println!("✓ Status: {}", schedule.status);
    println!("  Objective: {:.4}", schedule.objective_value);
    println!(
        "  Cost: {:.2}  Quality: {:.2}  Collaboration: {:.2}",
        schedule.components.cost, schedule.components.quality, schedule.components.collaboration
    );
    println!(
        "  {} variables, {} constraints, {:.1} ms",
        outcome.solution.statistics.num_variables,
        outcome.solution.statistics.num_constraints,
        outcome.solution.statistics.solve_time_ms
    );

    for s in 0..d.num_scenarios {
        println!("\nScenario {}", s + 1);
        println!("  {:>8}  {:>6}  {:>9}  equipment", "activity", "agent", "duration");
        for h in 0..d.num_activities {
            let agent = schedule
                .agent_for(h, s)
                .map_or_else(|| "-".to_string(), |j| j.to_string());
            let equipment: Vec<String> = schedule
                .equipment_for(h, s)
                .iter()
                .map(|e| e.to_string())
                .collect();
            println!(
                "  {:>8}  {:>6}  {:>9.2}  {}",
                h,
                agent,
                schedule.duration[&(h, s)],
                equipment.join(",")
            );
        }
    }
}
