use std::env;

use anyhow::{bail, Context};
use mestochain::config::ChainConfig;
use mestochain::CombinedResponse;

const BINS_TO_LOG: usize = 8;

fn main() -> anyhow::Result<()> {
    log4rs::init_file("./log.yml", Default::default()).context("failed to initialise logging from ./log.yml")?;
    log::info!("Measurement chain");

    let Some(path) = env::args().nth(1) else {
        bail!("usage: mestochain <chain.json>");
    };

    let config = ChainConfig::load(&path)?;
    let chain = config.build().with_context(|| format!("failed to build chain from {}", path))?;
    log::info!("{}", chain);

    match chain.combined_response() {
        CombinedResponse::Identity(gain) => {
            log::info!("empty chain, combined response is the identity ({})", gain);
        }
        CombinedResponse::Response(signal) => {
            let frequencies = signal.frequencies();
            for channel in signal.freq() {
                for (f, bin) in frequencies.iter().zip(channel).take(BINS_TO_LOG) {
                    log::info!("{:>10.1} Hz | {:>8.3} dB", f, 20.0 * bin.norm().log10());
                }
            }
        }
    }
    Ok(())
}
