//! Crop Yield Prediction CLI
//!
//! Predicts crop yield from field conditions using trained nearest-neighbor
//! artifacts.

use clap::{Parser, Subcommand};
use crop_yield::{Config, Result};

#[derive(Parser)]
#[command(name = "crop-yield")]
#[command(about = "Crop yield prediction from trained nearest-neighbor artifacts", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Artifact directory (overrides the config file)
    #[arg(long)]
    model_dir: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict yield for one set of field conditions
    Predict {
        #[arg(long)]
        region: String,
        #[arg(long)]
        soil_type: String,
        #[arg(long)]
        crop: String,
        /// Rainfall in mm
        #[arg(long, allow_hyphen_values = true)]
        rainfall: String,
        /// Temperature in °C
        #[arg(long, allow_hyphen_values = true)]
        temperature: String,
        /// "Yes" or "No"
        #[arg(long)]
        fertilizer: String,
        /// "Yes" or "No"
        #[arg(long)]
        irrigation: String,
        #[arg(long)]
        weather: String,
        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,
    },
    /// Predict yield for every record in a JSON file
    PredictBatch {
        /// JSON array of input records
        file: String,
        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,
    },
    /// List the trained categories
    Vocab {
        /// Only list this field (region, soil_type, crop, weather)
        field: Option<String>,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Copy, Debug)]
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
    if let Some(dir) = cli.model_dir {
        config.artifacts.dir = dir;
    }

    let result = match cli.command {
        Commands::Predict {
            region,
            soil_type,
            crop,
            rainfall,
            temperature,
            fertilizer,
            irrigation,
            weather,
            format,
        } => {
            let input = crop_yield::RawInput {
                region,
                soil_type,
                crop,
                rainfall_mm: rainfall,
                temperature_celsius: temperature,
                fertilizer_used: fertilizer,
                irrigation_used: irrigation,
                weather_condition: weather,
            };
            commands::output_format(&config, format)
                .and_then(|format| commands::predict(&config, input, format))
        }
        Commands::PredictBatch { file, format } => commands::output_format(&config, format)
            .and_then(|format| commands::predict_batch(&config, &file, format)),
        Commands::Vocab { field } => commands::vocab(&config, field),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use crop_yield::data::LoadedArtifacts;
    use crop_yield::features::ScalerColumn;
    use crop_yield::predict::inference::format_prediction;
    use crop_yield::predict::PredictionPipeline;
    use crop_yield::{CategoricalField, RawInput, YieldError};

    pub fn output_format(config: &Config, flag: Option<OutputFormat>) -> Result<OutputFormat> {
        match flag {
            Some(f) => Ok(f),
            None => config.output.format.parse().map_err(YieldError::Config),
        }
    }

    fn load_artifacts(config: &Config) -> Result<LoadedArtifacts> {
        LoadedArtifacts::load(&config.artifacts.dir)
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.artifacts.dir)?;
        println!("Created {}/ directory", config.artifacts.dir);

        println!("\nNext steps:");
        println!(
            "  1. Place le_*.json, minmax_scaler.json and knn.json in {}/",
            config.artifacts.dir
        );
        println!("  2. Run 'crop-yield model info' to check the artifacts");
        println!("  3. Run 'crop-yield vocab' to see the accepted categories");
        println!("  4. Run 'crop-yield predict --region ... --crop ...' to make predictions");

        Ok(())
    }

    pub fn predict(config: &Config, input: RawInput, format: OutputFormat) -> Result<()> {
        let artifacts = load_artifacts(config)?;
        let pipeline = PredictionPipeline::new(&artifacts);
        let prediction = pipeline.run(&input)?;

        match format {
            OutputFormat::Table => {
                print!("{}", format_prediction(&input, &prediction));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "input": input,
                    "yield": prediction.yield_value,
                    "raw_yield": prediction.raw_yield,
                    "normalized_yield": prediction.normalized_yield,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Csv => {
                println!("region,soil_type,crop,rainfall_mm,temperature_celsius,fertilizer_used,irrigation_used,weather_condition,yield");
                println!("{},{:.2}", csv_fields(&input), prediction.yield_value);
            }
        }

        Ok(())
    }

    pub fn predict_batch(config: &Config, file: &str, format: OutputFormat) -> Result<()> {
        let content = std::fs::read_to_string(file)?;
        let inputs: Vec<RawInput> = serde_json::from_str(&content)?;
        log::info!("Read {} records from {}", inputs.len(), file);

        let artifacts = load_artifacts(config)?;
        let pipeline = PredictionPipeline::new(&artifacts);
        let results = pipeline.run_batch(&inputs);

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            log::warn!("{} of {} records failed", failed, results.len());
        }

        match format {
            OutputFormat::Table => {
                for (i, (input, result)) in inputs.iter().zip(&results).enumerate() {
                    match result {
                        Ok(p) => println!(
                            "{:>4}  {:<12} {:<10} {:<10} {:>10.2}",
                            i, input.crop, input.region, input.soil_type, p.yield_value
                        ),
                        Err(e) => println!("{:>4}  error: {}", i, e),
                    }
                }
            }
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = results
                    .iter()
                    .enumerate()
                    .map(|(i, r)| match r {
                        Ok(p) => serde_json::json!({ "index": i, "yield": p.yield_value }),
                        Err(e) => serde_json::json!({ "index": i, "error": e.to_string() }),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Csv => {
                println!("region,soil_type,crop,rainfall_mm,temperature_celsius,fertilizer_used,irrigation_used,weather_condition,yield,error");
                for (input, result) in inputs.iter().zip(&results) {
                    match result {
                        Ok(p) => println!("{},{:.2},", csv_fields(input), p.yield_value),
                        Err(e) => println!("{},,{}", csv_fields(input), csv_quote(&e.to_string())),
                    }
                }
            }
        }

        Ok(())
    }

    pub(crate) fn csv_fields(input: &RawInput) -> String {
        [
            input.region.as_str(),
            input.soil_type.as_str(),
            input.crop.as_str(),
            input.rainfall_mm.trim(),
            input.temperature_celsius.trim(),
            input.fertilizer_used.as_str(),
            input.irrigation_used.as_str(),
            input.weather_condition.as_str(),
        ]
        .map(csv_quote)
        .join(",")
    }

    /// Quote a CSV field, doubling embedded quotes
    pub(crate) fn csv_quote(field: &str) -> String {
        format!("\"{}\"", field.replace('"', "\"\""))
    }

    pub fn vocab(config: &Config, field: Option<String>) -> Result<()> {
        let fields = match field {
            Some(name) => vec![CategoricalField::from_name(&name).ok_or_else(|| {
                YieldError::Config(format!(
                    "Unknown field: {}. Available: region, soil_type, crop, weather",
                    name
                ))
            })?],
            None => CategoricalField::ALL.to_vec(),
        };

        let artifacts = load_artifacts(config)?;
        for field in fields {
            println!("{}", field);
            let classes = artifacts.encoder.vocabulary(field).len();
            for code in 0..classes {
                if let Some(class) = artifacts.encoder.decode(field, code) {
                    println!("  {:>3}  {}", code, class);
                }
            }
        }

        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let artifacts = load_artifacts(config)?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:           {}", config.artifacts.dir);
        println!("  Neighbors (k):  {}", artifacts.model.k());
        println!("  Training rows:  {}", artifacts.model.n_samples());
        for column in ScalerColumn::ALL {
            let range = artifacts.scaler.range(column);
            println!("  {:<20} [{}, {}]", format!("{}:", column), range.min, range.max);
        }
        for field in CategoricalField::ALL {
            println!(
                "  {:<20} {} categories",
                format!("{}:", field),
                artifacts.encoder.vocabulary(field).len()
            );
        }

        Ok(())
    }
}
