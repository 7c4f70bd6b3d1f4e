use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use stratus_bench::report;
use stratus_bench::runner::BenchmarkRunner;
use stratus_bench::scenes;
use stratus_core::config::{load_config_from_str, StratusConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut baseline_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut scene_filter: Option<String> = None;
    let mut regression_threshold = 10.0f64;
    let mut frame_count = 600u32;
    let mut threads: Option<u32> = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "--help" | "-h") {
            print_usage();
            process::exit(0);
        }
        i += 1;
        let Some(value) = args.get(i) else {
            eprintln!("Missing value for {flag}");
            process::exit(1);
        };
        match flag {
            "--baseline" => baseline_path = Some(PathBuf::from(value)),
            "--output" => output_path = Some(PathBuf::from(value)),
            "--config" => config_path = Some(PathBuf::from(value)),
            "--scene" => scene_filter = Some(value.clone()),
            "--regression-threshold" => regression_threshold = parse_or_exit(flag, value),
            "--frames" => frame_count = parse_or_exit(flag, value),
            "--threads" => threads = Some(parse_or_exit(flag, value)),
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let base = match config_path {
        Some(ref path) => load_config(path),
        None => StratusConfig::default(),
    };

    let scene_configs =
        scenes::select_scenes(scenes::standard_scenes(&base), scene_filter.as_deref());
    if scene_configs.is_empty() {
        log::error!("No scene matches {:?}", scene_filter);
        process::exit(1);
    }

    let mut runner = BenchmarkRunner::new(frame_count);
    if let Some(t) = threads {
        runner = runner.with_threads(t);
    }

    let mut results = Vec::new();
    for config in &scene_configs {
        match runner.run_scene(config) {
            Ok(result) => results.push(result),
            Err(e) => {
                log::error!("Scene '{}' failed: {e}", config.name);
                process::exit(1);
            }
        }
    }

    println!("\n## Benchmark Results\n");
    println!("{}", report::format_markdown(&results));

    if let Some(ref path) = output_path {
        let baseline = report::Baseline {
            timestamp: timestamp(),
            results: results.clone(),
        };
        if let Err(e) = report::save_baseline(path, &baseline) {
            log::error!("Failed to save baseline to {}: {e}", path.display());
            process::exit(1);
        }
        log::info!("Saved baseline to {}", path.display());
    }

    if let Some(ref path) = baseline_path {
        if let Some(baseline) = report::load_baseline(path) {
            let regressions = report::compare(&results, &baseline, regression_threshold);
            println!(
                "{}",
                report::format_comparison(&regressions, regression_threshold)
            );
            if !regressions.is_empty() {
                eprintln!(
                    "ERROR: {} regressions detected, exiting with code 1",
                    regressions.len()
                );
                process::exit(1);
            }
        } else {
            log::warn!("Baseline file not found: {}", path.display());
        }
    }

    log::info!("Benchmark complete.");
}

fn print_usage() {
    eprintln!("Usage: bench-runner [OPTIONS]");
    eprintln!("  --config <path>                RON config the scenes are derived from");
    eprintln!("  --scene <name>                 Run one scene (sparse, default, dense, full-respawn)");
    eprintln!("  --frames <n>                   Frames per scene (default: 600)");
    eprintln!("  --threads <n>                  Worker threads (default: from config)");
    eprintln!("  --baseline <path>              Load baseline JSON for comparison");
    eprintln!("  --output <path>                Save current results as JSON baseline");
    eprintln!("  --regression-threshold <pct>   Regression threshold percentage (default: 10)");
}

fn parse_or_exit<T: std::str::FromStr>(flag: &str, value: &str) -> T {
    match value.parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("Invalid {flag} value: {value}");
            process::exit(1);
        }
    }
}

fn load_config(path: &Path) -> StratusConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            process::exit(1);
        }
    };
    match load_config_from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("bench-{secs}")
}
