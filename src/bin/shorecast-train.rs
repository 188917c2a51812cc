//! Developer utility to train (or load) the tsunami risk model and report metrics.

use std::path::PathBuf;

use shorecast::config;
use shorecast::dataset::{loader, schema};
use shorecast::ml::forest::TrainOptions;
use shorecast::pipeline::train_or_load;
use shorecast::store::ArtifactStore;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    if let Err(err) = shorecast::logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let options = parse_args(std::env::args().skip(1).collect())?;
    let config = config::load_or_default().map_err(|err| err.to_string())?;

    let data_path = options.data.or(config.dataset_path);
    let table = loader::load(None, data_path.as_deref()).map_err(|err| err.to_string())?;
    let spec = schema::resolve(&table).map_err(|err| err.to_string())?;

    let store = resolve_store(options.store.or(config.artifact_dir))?;
    if options.retrain {
        store.clear().map_err(|err| err.to_string())?;
    }

    let mut train = TrainOptions::default();
    if let Some(trees) = options.trees {
        train.trees = trees;
    }
    if let Some(seed) = options.seed {
        train.seed = seed;
    }

    let (_pipeline, meta) =
        train_or_load(&table, &spec, &store, &train).map_err(|err| err.to_string())?;

    println!("target: {}", meta.target);
    println!(
        "features: {} numeric, {} categorical",
        meta.numeric_columns.len(),
        meta.categorical_columns.len()
    );
    println!("rows: {} train / {} test", meta.train_rows, meta.test_rows);
    println!("accuracy: {:.1}%", meta.accuracy * 100.0);
    match meta.auc {
        Some(auc) => println!("auc: {auc:.3}"),
        None => println!("auc: n/a (single-class holdout)"),
    }
    for name in &meta.top_numeric {
        let (low, high) = meta.feature_ranges[name];
        let default = meta.numeric_defaults.get(name).copied().unwrap_or(low);
        println!("  {name:<20} [{low:.2}, {high:.2}]  default {default:.2}");
    }
    println!("artifacts: {}", store.dir().display());
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    data: Option<PathBuf>,
    store: Option<PathBuf>,
    trees: Option<usize>,
    seed: Option<u64>,
    retrain: bool,
}

fn resolve_store(dir: Option<PathBuf>) -> Result<ArtifactStore, String> {
    match dir {
        Some(dir) => Ok(ArtifactStore::new(dir)),
        None => ArtifactStore::default_location().map_err(|err| err.to_string()),
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut data: Option<PathBuf> = None;
    let mut store: Option<PathBuf> = None;
    let mut trees: Option<usize> = None;
    let mut seed: Option<u64> = None;
    let mut retrain = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--data" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--data requires a value".to_string())?;
                data = Some(PathBuf::from(value));
            }
            "--store" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--store requires a value".to_string())?;
                store = Some(PathBuf::from(value));
            }
            "--trees" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--trees requires a value".to_string())?;
                trees = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --trees value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--seed requires a value".to_string())?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--retrain" => {
                retrain = true;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions {
        data,
        store,
        trees,
        seed,
        retrain,
    })
}

fn help_text() -> String {
    [
        "shorecast-train",
        "",
        "Trains the tsunami risk forest, or loads the stored artifact if one exists.",
        "",
        "Usage:",
        "  shorecast-train [--data catalog.csv] [options]",
        "",
        "Options:",
        "  --data <file>   CSV catalog path (default: config dataset_path, else synthetic).",
        "  --store <dir>   Artifact directory (default: config artifact_dir, else app dir).",
        "  --trees <n>     Number of trees (default: 300).",
        "  --seed <u64>    Training seed (default: 42).",
        "  --retrain       Delete any stored artifact first and train fresh.",
    ]
    .join("\n")
}
