//! Command line entry point: map the predicates of one game description
//! onto another and print the correspondences.
//!
//! Usage: `rulemap <source.kif> <target.kif> [--json]`
//!
//! Settings are read from an optional `rulemap.toml` next to the working
//! directory and from `RULEMAP_`-prefixed environment variables; see
//! [`rulemap::mapper::MapperSettings`] for the available knobs.

use std::env;
use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rulemap::error::{Result, RulemapError};
use rulemap::kif;
use rulemap::mapper::{Mapper, MapperSettings};

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut json = false;
    let mut files = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            _ => files.push(arg),
        }
    }
    let [source_path, target_path] = files.as_slice() else {
        return Err(RulemapError::Config(
            "usage: rulemap <source.kif> <target.kif> [--json]".into(),
        ));
    };

    let settings = load_settings()?;
    let source = kif::parse_ruleset(&fs::read_to_string(source_path)?)?;
    let target = kif::parse_ruleset(&fs::read_to_string(target_path)?)?;
    info!(
        source = %source_path,
        target = %target_path,
        source_rules = source.rules().len(),
        target_rules = target.rules().len(),
        "mapping rulesets"
    );

    let mapper = Mapper::new(&source, &target, settings);
    let outcome = mapper.map();
    let report = outcome.report(&source, &target);

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| RulemapError::Execution(e.to_string()))?;
        println!("{rendered}");
    } else {
        println!(
            "status: {:?}  score: {:.3}  rules: {}/{}  steps: {}",
            report.status, report.score, report.matched_rules, report.total_rules, report.steps
        );
        for correspondence in &report.correspondences {
            println!("{} -> {}", correspondence.source, correspondence.target);
        }
    }
    Ok(())
}

fn load_settings() -> Result<MapperSettings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("rulemap").required(false))
        .add_source(config::Environment::with_prefix("RULEMAP").try_parsing(true))
        .build()?;
    Ok(settings.try_deserialize()?)
}
