use crate::cli::MeasureArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use structal::engine::config::{MetricConfig, MetricConfigBuilder};
use structal::engine::metric::MetricKind;
use structal::engine::progress::ProgressReporter;
use structal::workflows::measure;
use tracing::info;

pub fn run(args: MeasureArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    info!(
        "Resolved metric configuration: {} (squared: {})",
        config.metric, config.squared
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!(
        "Measuring {} frame(s) against {:?}",
        args.frames.len(),
        &args.reference
    );
    let results = measure::run(&config, &args.reference, &args.frames, &reporter)?;

    for result in &results {
        println!("{}\t{:.6}", result.path.display(), result.output.value);

        if args.derivatives {
            for (i, d) in result.output.derivatives.iter().enumerate() {
                println!("  atom {:>5}  {:>12.6} {:>12.6} {:>12.6}", i, d.x, d.y, d.z);
            }
        }
        if args.virial {
            let v = &result.output.virial;
            for row in 0..3 {
                println!(
                    "  virial    {:>12.6} {:>12.6} {:>12.6}",
                    v[(row, 0)],
                    v[(row, 1)],
                    v[(row, 2)]
                );
            }
        }
    }

    Ok(())
}

/// Layers CLI flags over the TOML file (or the defaults when no file is given).
fn resolve_config(args: &MeasureArgs) -> Result<MetricConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading metric configuration from {:?}", path);
            MetricConfig::load(path)?
        }
        None => MetricConfig::default(),
    };

    let mut builder = MetricConfigBuilder::from_config(base);
    if let Some(metric) = &args.metric {
        builder = builder.metric(metric.parse::<MetricKind>()?);
    }
    if args.squared {
        builder = builder.squared(true);
    }
    if let Some(lower) = args.lower_cutoff {
        builder = builder.lower_cutoff(lower);
    }
    if let Some(upper) = args.upper_cutoff {
        builder = builder.upper_cutoff(upper);
    }
    if let Some(scale) = args.length_scale {
        builder = builder.length_scale(scale);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn measure_args(argv: &[&str]) -> MeasureArgs {
        let cli = Cli::parse_from(argv);
        match cli.command {
            Commands::Measure(args) => args,
            _ => panic!("expected measure subcommand"),
        }
    }

    #[test]
    fn flag_overrides_replace_the_defaults() {
        let args = measure_args(&[
            "structal",
            "measure",
            "-r",
            "ref.pdb",
            "--metric",
            "drmsd",
            "--lower-cutoff",
            "0.1",
            "--upper-cutoff",
            "0.8",
            "frame.pdb",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.metric, MetricKind::Drmsd);
        assert_eq!(config.lower_cutoff, 0.1);
        assert_eq!(config.upper_cutoff, 0.8);
        assert_eq!(config.length_scale, 1.0);
    }

    #[test]
    fn inverted_cutoff_overrides_are_rejected() {
        let args = measure_args(&[
            "structal",
            "measure",
            "-r",
            "ref.pdb",
            "--lower-cutoff",
            "2.0",
            "--upper-cutoff",
            "1.0",
            "frame.pdb",
        ]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn file_values_survive_unrelated_flag_overrides() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "metric = \"optimal\"\nlength-scale = 0.1").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = measure_args(&[
            "structal", "measure", "-r", "ref.pdb", "--config", &path, "--squared", "frame.pdb",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.metric, MetricKind::Optimal);
        assert_eq!(config.length_scale, 0.1);
        assert!(config.squared);
    }

    #[test]
    fn unknown_metric_override_is_rejected() {
        let args = measure_args(&[
            "structal", "measure", "-r", "ref.pdb", "--metric", "KABSCH", "frame.pdb",
        ]);
        assert!(resolve_config(&args).is_err());
    }
}
