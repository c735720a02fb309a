use lp_signal::TimeSeries;
use lp_signal::peaks::find_peaks;
use lp_signal::spline::CubicSpline;
use proptest::prelude::*;

fn series_strategy() -> impl Strategy<Value = TimeSeries> {
    (
        -100.0_f64..100.0,
        prop::collection::vec((0.0_f64..2.0, -50.0_f64..50.0), 1..60),
    )
        .prop_map(|(start, steps)| {
            let mut t = start;
            let mut times = Vec::with_capacity(steps.len());
            let mut values = Vec::with_capacity(steps.len());
            for (dt, v) in steps {
                t += dt;
                times.push(t);
                values.push(v);
            }
            TimeSeries::new(times, values).unwrap()
        })
}

proptest! {
    #[test]
    fn rezero_is_idempotent(s in series_strategy()) {
        let once = s.rezeroed();
        prop_assert_eq!(once.first_time(), Some(0.0));
        prop_assert_eq!(once.rezeroed(), once.clone());
        prop_assert_eq!(once.values(), s.values());
    }

    #[test]
    fn peaks_are_interior_local_maxima(values in prop::collection::vec(-10i32..10, 0..80)) {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        for i in find_peaks(&values) {
            prop_assert!(i > 0 && i + 1 < values.len());
            prop_assert!(values[i] >= values[i - 1] && values[i] >= values[i + 1]);
        }
    }

    #[test]
    fn spline_passes_through_knots(
        steps in prop::collection::vec((0.5_f64..2.0, -20.0_f64..20.0), 2..30),
    ) {
        let mut x = 0.0;
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (dx, y) in steps {
            x += dx;
            xs.push(x);
            ys.push(y);
        }
        let s = CubicSpline::not_a_knot(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            prop_assert!((s.eval(*x) - y).abs() < 1e-6 * (1.0 + y.abs()));
        }
    }
}
