//! Seeded synthetic bars for `demo`.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use harmonix_core::bars::BarSeries;
use harmonix_core::domain::{Bar, Timeframe};

const START_PRICE: f64 = 1.1;

/// Random walk with a drift that flips every few bars, so swings form.
///
/// Same `seed`, same series.
pub fn random_walk(n: usize, seed: u64, timeframe: Timeframe) -> BarSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default();
    let step = timeframe.duration();

    let mut series = BarSeries::new(timeframe);
    let mut price = START_PRICE;
    let mut drift = 0.0;
    let mut leg = 0usize;

    for i in 0..n {
        if leg == 0 {
            leg = rng.gen_range(4..16);
            drift = rng.gen_range(-0.0015..0.0015);
        }
        leg -= 1;

        let open = price;
        let close = (open + drift + rng.gen_range(-0.0012..0.0012)).max(0.01);
        let high = open.max(close) + rng.gen_range(0.0..0.0008);
        let low = (open.min(close) - rng.gen_range(0.0..0.0008)).max(0.005);
        price = close;

        let bar = Bar {
            open_time: start + step * i as i32,
            open,
            high,
            low,
            close,
            volume: rng.gen_range(100.0..1_000.0),
        };
        // Generated bars are sane and strictly increasing in time.
        if series.push(bar).is_err() {
            break;
        }
    }
    series
}
