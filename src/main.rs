use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use ska_rust_workflow::domain::instrument::generator::{create_plan, load_plan_spec};
use ska_rust_workflow::domain::plan::alternate::alternate_plan_compositions;
use ska_rust_workflow::domain::plan::observation_plan::ObservationPlan;
use ska_rust_workflow::domain::plan::scheduling_policy::SchedulingPolicy;
use ska_rust_workflow::{generate_from_config_file, logger};

/// Generates observation plans and cost-annotated workflows for telescope data processing simulations
#[derive(Parser, Debug)]
#[command(name = "ska_rust_workflow", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan the observations, write their workflows and the simulator configuration
    Generate {
        /// Generator configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Replace a final configuration that already exists
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },

    /// Schedule an observation plan specification and print the result
    Plan {
        /// Observation plan specification file
        #[arg(short, long)]
        spec: PathBuf,

        /// greedy, first-fit or serial
        #[arg(short, long, default_value = "greedy")]
        policy: String,

        /// Arrays available at once; defaults to the whole telescope
        #[arg(long)]
        max_usage: Option<u32>,

        /// Shuffle the input order of the first-fit and serial policies
        #[arg(long)]
        seed: Option<u64>,

        /// Also print the alternate compositions of the plan
        #[arg(long, default_value_t = false)]
        alternates: bool,
    },
}

fn main() -> Result<()> {
    logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate { config, overwrite } => {
            let path = generate_from_config_file(&config, overwrite).with_context(|| format!("Generation from '{}' failed", config.display()))?;
            println!("{} {}", "Final configuration:".green().bold(), path.display());
        }
        Command::Plan { spec, policy, max_usage, seed, alternates } => {
            let policy: SchedulingPolicy = policy.parse()?;
            let plan_spec = load_plan_spec(&spec).with_context(|| format!("Could not read plan specification '{}'", spec.display()))?;
            let plan = create_plan(&plan_spec, policy, max_usage, seed).context("Scheduling failed")?;

            print_plan(&format!("{} plan", policy), &plan);

            if alternates {
                let plans = alternate_plan_compositions(&plan, policy.is_concurrent())?;
                for (i, alternate) in plans.iter().enumerate().skip(1) {
                    print_plan(&format!("Alternate {}", i), alternate);
                }
            }
        }
    }

    Ok(())
}

fn print_plan(title: &str, plan: &ObservationPlan) {
    println!("\n{}", title.bold().underline());
    println!("  {:<20} {:>10} {:>10} {:>8}", "observation".dimmed(), "start".dimmed(), "end".dimmed(), "demand".dimmed());
    for observation in plan.sorted_by_start() {
        println!("  {:<20} {:>10} {:>10} {:>8}", observation.name.to_string().cyan(), observation.start, observation.end(), observation.demand);
    }

    let capacity = if plan.respects_capacity() { "within capacity".green() } else { "over capacity".red() };
    println!("  makespan {} s, peak usage {}/{} ({})", plan.makespan(), plan.peak_usage(), plan.max_telescope_usage, capacity);
}
