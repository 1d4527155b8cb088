//! Property-based tests for the measurement filter.
//!
//! Corrected counts never go negative, always sum to the raw shot total, and
//! an identity calibration returns the raw counts unchanged.

use proptest::prelude::*;
use qec_hal::Counts;
use qec_mitigation::{CalibrationMatrix, MeasurementFilter, SolveMethod, state_label};

/// Raw counts over a `k`-bit register with at least one shot.
fn raw_counts(num_qubits: usize) -> impl Strategy<Value = Counts> {
    prop::collection::vec(0u64..500, 1usize << num_qubits)
        .prop_filter("at least one shot", |v| v.iter().sum::<u64>() > 0)
        .prop_map(move |values| {
            values
                .into_iter()
                .enumerate()
                .filter(|(_, count)| *count > 0)
                .map(|(state, count)| (state_label(state, num_qubits), count))
                .collect()
        })
}

fn width_and_counts() -> impl Strategy<Value = (usize, Counts)> {
    (1usize..=3).prop_flat_map(|k| (Just(k), raw_counts(k)))
}

proptest! {
    #[test]
    fn identity_round_trip((k, raw) in width_and_counts()) {
        let filter = MeasurementFilter::new(CalibrationMatrix::identity(k).unwrap());
        let mitigated = filter.apply(&raw).unwrap();

        prop_assert_eq!(mitigated.len(), raw.len());
        for (bitstring, &count) in raw.iter() {
            prop_assert!((mitigated.get(bitstring) - count as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn clipped_and_renormalized(
        (k, raw) in width_and_counts(),
        p in 0.0f64..0.45,
        exact in any::<bool>(),
    ) {
        let method = if exact { SolveMethod::Exact } else { SolveMethod::LeastSquares };
        let matrix = CalibrationMatrix::from_readout_error(k, p).unwrap();
        let filter = MeasurementFilter::new(matrix)
            .with_method(method);
        let mitigated = filter.apply(&raw).unwrap();

        let total = raw.total_shots() as f64;
        let sum: f64 = mitigated.iter().map(|(_, v)| *v).sum();
        prop_assert!(mitigated.iter().all(|(_, &v)| v >= 0.0));
        prop_assert!((sum - total).abs() < 1e-6 * total.max(1.0));
        prop_assert!((mitigated.total() - total).abs() < 1e-12);
        prop_assert!(mitigated.iter().all(|(bitstring, _)| bitstring.len() == k));
    }

    #[test]
    fn readout_model_is_column_stochastic(k in 1usize..=4, p in 0.0f64..0.5) {
        let matrix = CalibrationMatrix::from_readout_error(k, p).unwrap();
        for column in matrix.as_array().columns() {
            prop_assert!((column.sum() - 1.0).abs() < 1e-9);
        }
    }
}
