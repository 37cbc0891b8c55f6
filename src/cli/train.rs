//! Train command implementation.

use super::output::{format_training_text, JsonTrainingReport};
use super::{CliError, FitnessMeasure, OutputFormat};
use indicatif::{ProgressBar, ProgressStyle};
use lgp::{
    Configuration, ConfigurationLoader, DatasetLoader, Environment, EvolutionModel, FitnessFunction,
    JsonConfigurationLoader, JsonDatasetLoader, MasterSlave, SteadyState, Trainer, TrainerBuilder,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Arguments of the `train` command.
#[derive(clap::Args, Debug)]
pub(crate) struct TrainArgs {
    /// Configuration file (JSON, default: built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset file (JSON with `samples` and `targets`)
    #[arg(short, long, required = true)]
    dataset: PathBuf,

    /// Number of independent runs (overrides the configuration)
    #[arg(short, long)]
    runs: Option<usize>,

    /// Base seed, run r uses seed + r (overrides the configuration)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Execute runs in parallel
    #[arg(long)]
    parallel: bool,

    /// Evaluate fitness on a worker pool within each run
    #[arg(long)]
    master_slave: bool,

    /// Fitness function
    #[arg(long, default_value = "mse")]
    fitness: FitnessMeasure,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Show progress bar
    #[arg(short, long)]
    progress: bool,
}

fn load_configuration(args: &TrainArgs) -> Result<Configuration, CliError> {
    let mut config = match &args.config {
        Some(path) => JsonConfigurationLoader::new(path).load()?,
        None => Configuration::default(),
    };
    if let Some(runs) = args.runs {
        config.number_of_runs = runs;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

/// Execute the train command.
///
/// # Errors
///
/// Returns an error if loading, validation or any run fails.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn execute(args: TrainArgs) -> Result<(), CliError> {
    let mut config = load_configuration(&args)?;
    let dataset = JsonDatasetLoader::new(&args.dataset).load()?;
    if config.num_features == 0 {
        config.num_features = dataset.num_features();
    }

    let fitness = FitnessFunction::from_name(args.fitness.name())?;
    let runs = config.number_of_runs;
    let model: Arc<dyn EvolutionModel> = if args.master_slave {
        Arc::new(
            MasterSlave::from_configuration(&config)
                .map_err(|e| CliError::new(format!("Failed to build evaluation pool: {e}")))?,
        )
    } else {
        Arc::new(SteadyState::new())
    };
    let environment = Environment::standard(config, fitness)?;

    let pb = if args.progress {
        let pb = ProgressBar::new(runs as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs ({msg})")
                .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut builder = TrainerBuilder::new().environment(environment).shared_model(model);
    if let Some(pb) = &pb {
        let pb = pb.clone();
        builder = builder.observer(move |result| {
            pb.set_message(format!("run {} best {:.6}", result.run, result.best_fitness()));
            pb.inc(1);
        });
    }

    let start = Instant::now();
    let result = if args.parallel {
        builder.build_distributed()?.train(&dataset)?
    } else {
        builder.build_sequential()?.train(&dataset)?
    };
    let duration = start.elapsed();

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    match args.format {
        OutputFormat::Text => {
            println!();
            print!("{}", format_training_text(&result));
            println!();
            println!("Duration: {:.2}s", duration.as_secs_f64());
        }
        OutputFormat::Json => {
            let report = JsonTrainingReport::from_result(&result, duration);
            let json = serde_json::to_string_pretty(&report)?;
            println!("{json}");
        }
    }

    Ok(())
}
