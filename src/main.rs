mod report;
mod scenario;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use otterc_config::InliningConfig;
use otterc_inline::{GreedyInliningPolicy, InliningContext, InliningPolicy, evaluate_candidates};
use otterc_metrics::InliningMetrics;
use otterc_utils::init_logging;

use crate::report::{CandidateDecision, Evaluation};
use crate::scenario::{Scenario, UnitGraph};

#[derive(Parser)]
#[command(
    name = "otter-inline",
    version,
    about = "Evaluate OtterLang's greedy inlining policy against candidate call sites"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the budget gate and every candidate of a scenario through the policy
    Evaluate(EvaluateArgs),
    /// Print the resolved inlining configuration
    Config {
        /// TOML file with inlining thresholds
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fail on malformed OTTER_INLINE_* variables instead of ignoring them
        #[arg(long)]
        strict_env: bool,
    },
}

#[derive(Args)]
struct EvaluateArgs {
    /// JSON scenario with candidates, bonus hints and intrinsics
    #[arg(long)]
    candidates: PathBuf,

    /// TOML file with inlining thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail on malformed OTTER_INLINE_* variables instead of ignoring them
    #[arg(long)]
    strict_env: bool,

    /// Current caller graph size, overrides the scenario's value
    #[arg(long)]
    graph_nodes: Option<usize>,

    /// Callees' own call sites have already been analyzed
    #[arg(long)]
    fully_processed: bool,

    /// Emit JSON instead of a text report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Evaluate(args) => run_evaluate(&args),
        Command::Config { config, strict_env } => {
            let config = resolve_config(config.as_deref(), strict_env)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn resolve_config(path: Option<&Path>, strict_env: bool) -> Result<InliningConfig> {
    let Some(path) = path else {
        return if strict_env {
            InliningConfig::try_from_env().context("invalid inlining override")
        } else {
            Ok(InliningConfig::from_env())
        };
    };

    let config = InliningConfig::from_file(path)
        .with_context(|| format!("failed to load inlining config {}", path.display()))?;
    if strict_env {
        config
            .try_merge_with_env()
            .context("invalid inlining override")
    } else {
        Ok(config.merge_with_env())
    }
}

fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref(), args.strict_env)?;
    let scenario = Scenario::load(&args.candidates)?;
    let evaluation = evaluate_scenario(&config, &scenario, args.graph_nodes, args.fully_processed);

    if args.json {
        println!("{}", report::render_json(&evaluation)?);
    } else {
        print!("{evaluation}");
    }
    Ok(())
}

fn evaluate_scenario(
    config: &InliningConfig,
    scenario: &Scenario,
    graph_nodes: Option<usize>,
    fully_processed: bool,
) -> Evaluation {
    let policy = GreedyInliningPolicy::new(
        Arc::new(scenario.scorer()),
        Arc::new(scenario.intrinsics()),
    );
    let metrics = InliningMetrics::new();
    let cx = InliningContext::new(config, &metrics);
    let graph = UnitGraph {
        nodes: graph_nodes.or(scenario.graph_nodes).unwrap_or(0),
    };

    let continued = policy.continue_inlining(&cx, &graph);
    let decisions = if continued {
        tracing::debug!(candidates = scenario.candidates.len(), "evaluating candidates");
        evaluate_candidates(&policy, &cx, &scenario.candidates, fully_processed)
            .into_iter()
            .zip(&scenario.candidates)
            .map(|(decision, candidate)| CandidateDecision::new(candidate, decision))
            .collect()
    } else {
        Vec::new()
    };

    Evaluation {
        graph_nodes: graph.nodes,
        continued,
        decisions,
        stats: metrics.stats(),
    }
}
