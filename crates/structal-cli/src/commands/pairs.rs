use crate::cli::PairsArgs;
use crate::error::{CliError, Result};
use structal::core::models::pairs::{DistanceWindow, build_pairs};
use structal::engine::metric::MetricKind;
use structal::workflows::measure::load_reference;
use tracing::info;

pub fn run(args: PairsArgs) -> Result<()> {
    let kind = args.metric.parse::<MetricKind>()?;
    let mode = kind.pair_mode().ok_or_else(|| {
        CliError::Argument(format!(
            "'{kind}' is not a distance metric; expected DRMSD, INTRA-DRMSD, or INTER-DRMSD"
        ))
    })?;
    let window = DistanceWindow::new(args.lower_cutoff, args.upper_cutoff)?;

    info!("Loading reference structure from {:?}", &args.reference);
    let frame = load_reference(&args.reference, args.length_scale)?;
    let pairs = build_pairs(&frame, mode, window)?;

    println!(
        "# {} pairs ({kind}, window ({}, {}])",
        pairs.len(),
        args.lower_cutoff,
        args.upper_cutoff
    );
    for pair in pairs.pairs() {
        println!("{}\t{}\t{:.6}", pair.i, pair.j, pair.reference_distance);
    }

    Ok(())
}
