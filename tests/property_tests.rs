//! Property-based tests for the cascade.

use mestochain::{CombinedResponse, MeasurementChain};

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn gain_chain(gains: &[f64]) -> MeasurementChain {
        let mut chain = MeasurementChain::new(44100.0).unwrap();
        for (i, gain) in gains.iter().enumerate() {
            chain.add_device(format!("dev{}", i), None, *gain, None).unwrap();
        }
        chain
    }

    fn single_sample(chain: &MeasurementChain) -> f64 {
        match chain.combined_response() {
            CombinedResponse::Response(signal) => signal.time()[0][0],
            CombinedResponse::Identity(gain) => *gain,
        }
    }

    proptest! {
        #[test]
        fn gain_order_does_not_matter(
            gains in prop::collection::vec(0.01f64..100.0, 1..8)
                .prop_flat_map(|g| (Just(g.clone()), Just(g).prop_shuffle()))
        ) {
            let (original, shuffled) = gains;
            let a = single_sample(&gain_chain(&original));
            let b = single_sample(&gain_chain(&shuffled));
            prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0));
        }

        #[test]
        fn gain_chain_is_product(gains in prop::collection::vec(-10.0f64..10.0, 1..8)) {
            let chain = gain_chain(&gains);
            let signal = chain.combined_response().as_signal().unwrap();
            prop_assert_eq!(signal.n_samples(), 1);
            let product: f64 = gains.iter().product();
            prop_assert!((signal.time()[0][0] - product).abs() <= 1e-9 * product.abs().max(1.0));
        }

        #[test]
        fn add_then_remove_round_trips(
            gains in prop::collection::vec(0.1f64..10.0, 0..6),
            extra in 0.1f64..10.0,
        ) {
            let mut chain = gain_chain(&gains);
            let names: Vec<String> = chain.list_device_names().iter().map(|s| s.to_string()).collect();
            let combined = chain.combined_response().clone();

            chain.add_device("extra", None, extra, None).unwrap();
            chain.remove_device("extra").unwrap();

            let after: Vec<String> = chain.list_device_names().iter().map(|s| s.to_string()).collect();
            prop_assert_eq!(after, names);
            prop_assert_eq!(chain.combined_response(), &combined);
        }

        #[test]
        fn filters_grow_by_full_convolution_length(
            lens in prop::collection::vec(1usize..80, 1..4),
        ) {
            let mut chain = MeasurementChain::new(48000.0).unwrap();
            for (i, len) in lens.iter().enumerate() {
                let response = mestochain::Signal::mono(vec![0.5; *len], 48000.0).unwrap();
                chain.add_device(format!("f{}", i), Some(response), 1.0, None).unwrap();
            }
            let expected = lens.iter().sum::<usize>() - lens.len() + 1;
            prop_assert_eq!(chain.combined_response().as_signal().unwrap().n_samples(), expected);
        }
    }
}
