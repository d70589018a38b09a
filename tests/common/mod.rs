//! Shared helpers for integration tests

use credit_scoring::schema::FeatureRecord;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt::Write as _;
use std::path::Path;

/// Write a synthetic applicant CSV with a clear risk signal: delinquent rows
/// carry high utilization, repeated late payments, and low (sometimes
/// missing) income. `positive_rate` controls the label balance.
pub fn write_synthetic_csv(path: &Path, n_rows: usize, positive_rate: f64, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut csv = String::from(
        "id,utilization,age,late30,debtRatio,income,openLines,late90,realEstate,late60,dependents,label\n",
    );

    for id in 0..n_rows {
        let positive = (id as f64 / n_rows as f64) < positive_rate;

        let (utilization, age, late30, debt_ratio, income, open_lines, late90, real_estate, late60, dependents) =
            if positive {
                (
                    rng.gen_range(0.7..1.2),
                    rng.gen_range(21..45),
                    rng.gen_range(1..4),
                    rng.gen_range(0.7..2.0),
                    // A slice of delinquent applicants has no reported income
                    if rng.gen_bool(0.25) {
                        None
                    } else {
                        Some(rng.gen_range(800.0..2500.0))
                    },
                    rng.gen_range(6..15),
                    rng.gen_range(2..6),
                    rng.gen_range(0..2),
                    rng.gen_range(1..4),
                    rng.gen_range(1.0..4.0),
                )
            } else {
                (
                    rng.gen_range(0.05..0.4),
                    rng.gen_range(30..65),
                    rng.gen_range(0..2),
                    rng.gen_range(0.1..0.6),
                    Some(rng.gen_range(3500.0..8000.0)),
                    rng.gen_range(3..8),
                    0,
                    rng.gen_range(0..3),
                    0,
                    rng.gen_range(0.0..2.0),
                )
            };

        let income_cell = income.map_or(String::new(), |v: f64| format!("{v:.2}"));
        writeln!(
            csv,
            "{id},{utilization:.4},{age},{late30},{debt_ratio:.4},{income_cell},{open_lines},{late90},{real_estate},{late60},{dependents:.1},{}",
            u8::from(positive)
        )
        .unwrap();
    }

    std::fs::write(path, csv).unwrap();
}

/// The reference low-risk applicant profile
pub fn low_risk_record() -> FeatureRecord {
    FeatureRecord {
        utilization: 0.2,
        age: 40.0,
        late30: 0.0,
        debt_ratio: 0.5,
        income: Some(5000.0),
        open_lines: 5.0,
        late90: 0.0,
        real_estate: 1.0,
        late60: 0.0,
        dependents: Some(0.0),
    }
}
