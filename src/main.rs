//! Penalty Prediction CLI
//!
//! Trains a small neural network on a penalty kick dataset and answers
//! "what if" questions about new kicks.

use clap::{Parser, Subcommand};
use penalty::{Config, PenaltyError, Result};

#[derive(Parser)]
#[command(name = "penalty")]
#[command(about = "Penalty kick goal prediction using a neural network", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Dataset path (overrides the config file)
    #[arg(short, long)]
    dataset: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model and report held-out accuracy
    Train {
        /// Override number of epochs
        #[arg(long)]
        epochs: Option<usize>,
    },
    /// Train, then predict a single kick
    Predict {
        /// Ball speed in km/h
        #[arg(long, default_value = "95")]
        speed: String,
        /// Shot angle in degrees
        #[arg(long, default_value = "30")]
        angle: String,
        /// Distance to the keeper in metres
        #[arg(long, default_value = "0.9")]
        distance: String,
        /// Dominant foot (Derecho or Izquierdo)
        #[arg(long, default_value = "Derecho")]
        foot: String,
        /// Match pressure (Baja, Media or Alta)
        #[arg(long, default_value = "Baja")]
        pressure: String,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Train, then answer predictions from a prompt until end of input
    Interactive,
    /// Initialize a new project with default config
    Init,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let mut config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };
    if let Some(dataset) = cli.dataset {
        config.data.dataset_path = dataset;
    }

    // Run command
    let result = match cli.command {
        Commands::Train { epochs } => commands::train(&config, epochs),
        Commands::Predict {
            speed,
            angle,
            distance,
            foot,
            pressure,
            format,
        } => {
            let input = penalty::KickInput {
                speed_kmh: speed,
                angle_deg: angle,
                keeper_distance_m: distance,
                dominant_foot: foot,
                match_pressure: pressure,
            };
            commands::predict(&config, input, format)
        }
        Commands::Interactive => commands::interactive(&config),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let PenaltyError::DatasetNotFound(_) = e {
            eprintln!("Place the CSV at that path or pass --dataset <PATH>.");
        }
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use std::io::{BufRead, Write};

    use burn::backend::{Autodiff, NdArray};
    use penalty::predict::{format_prediction, join_prediction, TrainedPipeline};
    use penalty::training::{fit_pipeline, TrainingReport};
    use penalty::KickInput;

    type InferenceBackend = NdArray<f32>;
    type TrainingBackend = Autodiff<InferenceBackend>;

    fn fit(config: &Config) -> Result<(TrainedPipeline<InferenceBackend>, TrainingReport)> {
        let kicks = penalty::data::load(&config.data.dataset_path)?;
        let device = Default::default();

        log::info!("Training neural network...");
        let fitted = fit_pipeline::<TrainingBackend>(&kicks, config, &device)?;
        log::info!("Training complete");
        Ok(fitted)
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Put the penalty dataset at {}", config.data.dataset_path);
        println!("  2. Run 'penalty train' to check the model");
        println!("  3. Run 'penalty interactive' to explore predictions");

        Ok(())
    }

    pub fn train(config: &Config, epochs: Option<usize>) -> Result<()> {
        let mut config = config.clone();
        if let Some(e) = epochs {
            config.training.epochs = e;
        }

        let (pipeline, report) = fit(&config)?;

        println!("Training Summary");
        println!("───────────────────────────────");
        println!("  Rows:        {} train, {} test", report.train_rows, report.test_rows);
        println!("  Epochs:      {}", report.history.len());
        if let Some(last) = report.history.last() {
            println!(
                "  Final loss:  {:.4} (train acc {:.1}%)",
                last.loss,
                last.accuracy * 100.0
            );
        }
        if let Some(test) = &report.test_metrics {
            println!("  Test:        {}", test);
        }
        println!(
            "  Reference:   Presion_Partido = {}",
            pipeline.schema().pressure_reference()
        );
        println!("  Columns:");
        for (i, column) in pipeline.schema().columns().iter().enumerate() {
            println!(
                "    {:>2}. {:<22} mean={:>8.3} std={:>8.3}",
                i + 1,
                column,
                pipeline.scaler().mean[i],
                pipeline.scaler().std[i]
            );
        }
        if !pipeline.scaler().degenerate_columns.is_empty() {
            println!(
                "  Constant columns (unit std): {:?}",
                pipeline.scaler().degenerate_columns
            );
        }

        Ok(())
    }

    pub fn predict(config: &Config, input: KickInput, format: OutputFormat) -> Result<()> {
        // Reject bad numbers before spending time on training
        let record = input.parse()?;
        let (pipeline, _) = fit(config)?;
        let prediction = pipeline.predict(&record)?;

        match format {
            OutputFormat::Table => {
                print!("{}", format_prediction(&record, &prediction));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "record": record,
                    "probability": prediction.probability,
                    "percentage": prediction.percentage(),
                    "outcome": prediction.outcome(),
                });
                let text = serde_json::to_string_pretty(&json)
                    .map_err(|e| PenaltyError::Config(format!("JSON output failed: {}", e)))?;
                println!("{}", text);
            }
            OutputFormat::Csv => {
                println!("speed_kmh,angle_deg,keeper_distance_m,dominant_foot,match_pressure,probability,outcome");
                println!(
                    "{},{},{},{},{},{:.4},{}",
                    record.speed_kmh,
                    record.angle_deg,
                    record.keeper_distance_m,
                    record.dominant_foot,
                    record.match_pressure,
                    prediction.probability,
                    prediction.outcome()
                );
            }
        }

        Ok(())
    }

    pub fn interactive(config: &Config) -> Result<()> {
        let (pipeline, _) = fit(config)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        println!("Enter kick details (empty line keeps the value in brackets, Ctrl-D quits).");

        let mut defaults = KickInput {
            speed_kmh: "95".to_string(),
            angle_deg: "30".to_string(),
            keeper_distance_m: "0.9".to_string(),
            dominant_foot: "Derecho".to_string(),
            match_pressure: "Baja".to_string(),
        };

        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();

        while let Some(input) = read_input(&mut lines, &defaults)? {
            let record = match input.parse() {
                Ok(record) => record,
                Err(e @ PenaltyError::InvalidInput { .. }) => {
                    println!("{}. Please enter numeric values for speed, angle and distance.", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            // The prediction runs off this thread; the prompt waits for it
            let pending = runtime.block_on(async {
                join_prediction(pipeline.spawn_predict(input.clone())).await
            });
            match pending {
                Ok(prediction) => {
                    print!("{}", format_prediction(&record, &prediction));
                    defaults = input;
                }
                Err(e @ PenaltyError::SchemaMismatch { .. }) => println!("{}", e),
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Prompt for every field; `None` once input is exhausted
    fn read_input(
        lines: &mut impl Iterator<Item = std::io::Result<String>>,
        defaults: &KickInput,
    ) -> Result<Option<KickInput>> {
        let fields = [
            ("Speed (km/h)", &defaults.speed_kmh),
            ("Angle (degrees)", &defaults.angle_deg),
            ("Keeper distance (m)", &defaults.keeper_distance_m),
            ("Dominant foot (Derecho/Izquierdo)", &defaults.dominant_foot),
            ("Match pressure (Baja/Media/Alta)", &defaults.match_pressure),
        ];

        let mut values = Vec::with_capacity(fields.len());
        for (label, default) in fields {
            print!("{} [{}]: ", label, default);
            std::io::stdout().flush()?;

            let Some(line) = lines.next() else {
                println!();
                return Ok(None);
            };
            let line = line?;
            let value = line.trim();
            values.push(if value.is_empty() {
                default.clone()
            } else {
                value.to_string()
            });
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        Ok(Some(KickInput {
            speed_kmh: next(),
            angle_deg: next(),
            keeper_distance_m: next(),
            dominant_foot: next(),
            match_pressure: next(),
        }))
    }
}
