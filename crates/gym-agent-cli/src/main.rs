//! Gym Agent CLI: plan workouts with a pipeline of LLM agents.
//!
//! Reuses the core domain logic (gym-agent-core): equipment lookup, workout
//! history, and the YAML-driven agent pipeline.

use clap::{Parser, Subcommand};

use gym_agent_cli::commands;
use gym_agent_cli::commands::run::RunOptions;

/// Gym Agent CLI: workout planning with LLM agents
#[derive(Parser)]
#[command(name = "gym-agent", version, about = "Gym Agent CLI: workout planning with LLM agents")]
pub struct Cli {
    /// Home directory holding memory/, logs/ and data/
    #[arg(long, env = "GYM_AGENT_HOME", default_value = ".")]
    home: String,

    /// Do not write a decision trace file to logs/
    #[arg(long)]
    no_trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a workout by running the agent pipeline
    Run {
        /// Opening message (skips the greeting)
        /// Example: gym-agent run -p "chest, hypertrophy, gym, beginner"
        #[arg(short = 'p', long = "prompt")]
        prompt: Option<String>,
        /// Pipeline YAML file (default: built-in FullWorkoutPipeline)
        #[arg(long)]
        pipeline: Option<String>,
        /// Directory of agent YAML overrides
        #[arg(long)]
        agents_dir: Option<String>,
        /// Show detailed step output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Look up equipment for a muscle group (prints JSON)
    Equipment {
        /// Muscle group, e.g. "chest"
        muscle: String,
    },

    /// Inspect the saved workout history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Validate and inspect pipeline definitions
    Pipeline {
        #[command(subcommand)]
        action: PipelineAction,
    },

    /// List available agent definitions
    Agents {
        /// Directory of agent YAML overrides
        #[arg(long)]
        agents_dir: Option<String>,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List saved workouts
    List {
        /// Only the last N workouts
        #[arg(long)]
        last: Option<usize>,
    },
    /// Show the exercises the planner will avoid
    Avoid,
}

#[derive(Subcommand)]
enum PipelineAction {
    /// Validate a pipeline YAML file without executing it
    Validate {
        /// Path to the pipeline YAML file
        file: String,
    },
    /// Show the stages of a pipeline (built-in when no file is given)
    Show {
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gym_agent_core=info,gym_agent_cli=info".into()),
        )
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            prompt,
            pipeline,
            agents_dir,
            verbose,
        }) => match commands::init_state(&cli.home, !cli.no_trace) {
            Ok(state) => {
                let options = RunOptions {
                    message: prompt,
                    pipeline_file: pipeline,
                    agents_dir,
                    verbose,
                };
                commands::run::run(&state, &options).await
            }
            Err(e) => Err(e),
        },

        Some(Commands::Equipment { muscle }) => commands::init_state(&cli.home, !cli.no_trace)
            .and_then(|state| commands::equipment::lookup(&state, &muscle)),

        Some(Commands::History { action }) => {
            commands::init_state(&cli.home, !cli.no_trace).and_then(|state| match action {
                HistoryAction::List { last } => commands::history::list(&state, last),
                HistoryAction::Avoid => commands::history::avoid(&state),
            })
        }

        Some(Commands::Pipeline { action }) => match action {
            PipelineAction::Validate { file } => commands::pipeline::validate(&file),
            PipelineAction::Show { file } => commands::pipeline::show(file.as_deref()),
        },

        Some(Commands::Agents { agents_dir }) => commands::agents::list(agents_dir.as_deref()),

        None => {
            // No subcommand: show help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
