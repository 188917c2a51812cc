//! Developer utility to score one scenario against the stored model and print
//! the tiered safety guidance.

use std::path::PathBuf;

use shorecast::config;
use shorecast::risk::{PredictionRequest, RiskTier, predict_probability, tier};
use shorecast::store::ArtifactStore;

const IMMEDIATE_ACTIONS: &[&str] = &[
    "keep away from the coast, rivers, and underpasses",
    "move to high ground or a designated shelter, on foot if possible",
    "monitor official broadcasts and alerts",
    "expect follow-up waves after the first one",
];

const SHORT_TERM_ACTIONS: &[&str] = &[
    "confirm contact and meeting points with family or team",
    "secure an emergency kit and drinking water",
    "stay off the coast; later waves can be larger",
    "shut off power, gas, and water before moving on",
];

const RECOVERY_ACTIONS: &[&str] = &[
    "stay away from the shore until authorities clear returns",
    "have flooded buildings and utilities inspected before use",
    "do not drink or eat anything touched by floodwater",
    "follow official recovery and relief guidance",
];

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

    let store = match options.store.or(config.artifact_dir) {
        Some(dir) => ArtifactStore::new(dir),
        None => ArtifactStore::default_location().map_err(|err| err.to_string())?,
    };
    let (pipeline, meta) = store.load().map_err(|err| {
        format!("{err}\nRun shorecast-train first to create a model artifact.")
    })?;

    let mut request = PredictionRequest::default();
    for (name, value) in options.numeric {
        request.numeric.insert(name, value);
    }
    for (name, value) in options.categorical {
        request.categorical.insert(name, value);
    }

    let threshold = options.threshold.unwrap_or(config.threshold);
    let probability = predict_probability(&pipeline, &request).map_err(|err| err.to_string())?;
    let risk = tier(probability, threshold);

    println!(
        "predicted probability: {:.1}% (threshold {:.0}%)",
        probability * 100.0,
        threshold * 100.0
    );
    println!("risk tier: {}", risk.label());
    println!("{}", lead_line(risk));
    println!();
    println!("{}", summary_text(probability, threshold, risk));
    if options.verbose {
        println!("model: accuracy {:.1}%, target '{}'", meta.accuracy * 100.0, meta.target);
    }
    Ok(())
}

fn lead_line(risk: RiskTier) -> &'static str {
    match risk {
        RiskTier::High => "High likelihood — review evacuation steps immediately.",
        RiskTier::Medium => "Caution — check alerts and walk your evacuation route.",
        RiskTier::Low => "Low — coastal areas should still know their evacuation routes.",
    }
}

/// Fixed-template plain-text block suitable for saving or printing.
fn summary_text(probability: f32, threshold: f32, risk: RiskTier) -> String {
    let mut out = String::new();
    out.push_str("[tsunami response summary]\n");
    out.push_str(&format!(
        "- predicted probability: {:.1}% (threshold {:.0}%)\n",
        probability * 100.0,
        threshold * 100.0
    ));
    out.push_str(&format!("- risk tier: {}\n", risk.label()));
    out.push_str(&format!("- immediate: {}\n", IMMEDIATE_ACTIONS.join("; ")));
    out.push_str(&format!("- short term: {}\n", SHORT_TERM_ACTIONS.join("; ")));
    out.push_str(&format!("- recovery: {}\n", RECOVERY_ACTIONS.join("; ")));
    out
}

#[derive(Debug, Clone)]
struct CliOptions {
    store: Option<PathBuf>,
    threshold: Option<f32>,
    numeric: Vec<(String, f32)>,
    categorical: Vec<(String, String)>,
    verbose: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut store: Option<PathBuf> = None;
    let mut threshold: Option<f32> = None;
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();
    let mut verbose = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--store" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--store requires a value".to_string())?;
                store = Some(PathBuf::from(value));
            }
            "--threshold" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--threshold requires a value".to_string())?;
                let parsed = value
                    .parse::<f32>()
                    .map_err(|_| format!("Invalid --threshold value: {value}"))?;
                if !(0.0..=1.0).contains(&parsed) {
                    return Err(format!("--threshold must be in [0, 1], got {value}"));
                }
                threshold = Some(parsed);
            }
            "--set" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--set requires name=value".to_string())?;
                let (name, raw) = value
                    .split_once('=')
                    .ok_or_else(|| format!("Invalid --set '{value}'; expected name=value"))?;
                let parsed = raw
                    .parse::<f32>()
                    .map_err(|_| format!("Invalid numeric value in --set '{value}'"))?;
                numeric.push((name.to_string(), parsed));
            }
            "--category" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--category requires name=value".to_string())?;
                let (name, raw) = value
                    .split_once('=')
                    .ok_or_else(|| format!("Invalid --category '{value}'; expected name=value"))?;
                categorical.push((name.to_string(), raw.to_string()));
            }
            "--verbose" => {
                verbose = true;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions {
        store,
        threshold,
        numeric,
        categorical,
        verbose,
    })
}

fn help_text() -> String {
    [
        "shorecast-predict",
        "",
        "Scores one earthquake scenario against the stored model and prints the",
        "risk tier with safety guidance. Unset features fall back to the values",
        "imputed during training.",
        "",
        "Usage:",
        "  shorecast-predict [--set magnitude=7.2] [--set depth=15] [options]",
        "",
        "Options:",
        "  --set <name=value>       Numeric feature override (repeatable).",
        "  --category <name=value>  Categorical feature override (repeatable).",
        "  --threshold <f32>        Decision threshold in [0, 1] (default: config).",
        "  --store <dir>            Artifact directory (default: config, else app dir).",
        "  --verbose                Also print model metadata.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_probability_threshold_and_tier() {
        let text = summary_text(0.72, 0.5, RiskTier::High);
        assert!(text.contains("72.0%"));
        assert!(text.contains("threshold 50%"));
        assert!(text.contains("risk tier: high"));
        assert!(text.contains("- immediate:"));
        assert!(text.contains("- recovery:"));
    }

    #[test]
    fn set_arguments_parse_into_overrides() {
        let options = parse_args(vec![
            "--set".into(),
            "magnitude=7.2".into(),
            "--threshold".into(),
            "0.4".into(),
        ])
        .unwrap();
        assert_eq!(options.numeric, vec![("magnitude".to_string(), 7.2)]);
        assert_eq!(options.threshold, Some(0.4));
    }

    #[test]
    fn malformed_set_is_rejected() {
        assert!(parse_args(vec!["--set".into(), "magnitude".into()]).is_err());
        assert!(parse_args(vec!["--threshold".into(), "1.5".into()]).is_err());
    }
}
