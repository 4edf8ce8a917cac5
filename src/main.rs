use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use credit_default::config::{load_train_config, Scoring, TrainConfig};
use credit_default::inference::{predict_file, write_predictions};
use credit_default::training::run_training;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default().filter_or("CREDIT_DEFAULT_LOG", "error,credit_default=info"),
        )
        .init();

    let matches = Command::new("credit-default")
        .version(clap::crate_version!())
        .about("Credit-card default classifier: clean, grid-search, persist, evaluate")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Clean the data, run the grid search and write the model and metrics")
                .arg(
                    Arg::new("config")
                        .help("Path to a JSON training configuration. Defaults are used when omitted.")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .long("train-data")
                        .help("Training table (CSV or zipped CSV). Overrides the config file.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("test_data")
                        .long("test-data")
                        .help("Test table (CSV or zipped CSV). Overrides the config file.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("model_file")
                        .long("model-file")
                        .help("Where the fitted model is written. Overrides the config file.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("metrics_file")
                        .long("metrics-file")
                        .help("Where the metric records are written. Overrides the config file.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("cv_folds")
                        .long("cv-folds")
                        .help("Number of stratified cross-validation folds.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("n_jobs")
                        .long("n-jobs")
                        .help("Worker threads for cross-validation. 0 uses all cores.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("scoring")
                        .long("scoring")
                        .help("Metric used to rank candidates.")
                        .value_parser(["balanced_accuracy", "precision", "recall", "f1"]),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Score a table with a previously trained model")
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .help("Path to the trained model file (*.bin.gz)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help("Table to score (CSV or zipped CSV)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Path to write predictions as CSV. Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn train_config_from_arguments(matches: &ArgMatches) -> Result<TrainConfig> {
    let mut config = if let Some(config_path) = matches.get_one::<PathBuf>("config") {
        log::info!("Using config: {:?}", config_path);
        load_train_config(config_path)?
    } else {
        let config = TrainConfig::default();
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        log::info!("No config provided; using defaults:\n{}", default_json);
        config
    };

    if let Some(path) = matches.get_one::<PathBuf>("train_data") {
        config.train_data = path.clone();
    }
    if let Some(path) = matches.get_one::<PathBuf>("test_data") {
        config.test_data = path.clone();
    }
    if let Some(path) = matches.get_one::<PathBuf>("model_file") {
        config.model_file = path.clone();
    }
    if let Some(path) = matches.get_one::<PathBuf>("metrics_file") {
        config.metrics_file = path.clone();
    }
    if let Some(&folds) = matches.get_one::<usize>("cv_folds") {
        config.cv_folds = folds;
    }
    if let Some(&n_jobs) = matches.get_one::<usize>("n_jobs") {
        config.n_jobs = Some(n_jobs);
    }
    if let Some(scoring) = matches.get_one::<String>("scoring") {
        config.scoring = Scoring::from_str(scoring).map_err(anyhow::Error::msg)?;
    }
    Ok(config)
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config = train_config_from_arguments(matches)?;

    match run_training(&config) {
        Ok(summary) => {
            log::info!(
                "Training finished on {} train / {} test rows; best score {:.4}",
                summary.train_rows,
                summary.test_rows,
                summary.best_score
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let (Some(model_path), Some(data_path)) = (
        matches.get_one::<PathBuf>("model"),
        matches.get_one::<PathBuf>("data"),
    ) else {
        unreachable!("model and data are required arguments")
    };
    let output_path = matches.get_one::<PathBuf>("output");

    let predictions = match predict_file(model_path, data_path) {
        Ok(predictions) => predictions,
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    };
    write_predictions(&predictions, output_path.map(|p| p.as_path()))?;
    log::info!("Scored {} rows", predictions.len());
    Ok(())
}
