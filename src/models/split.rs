use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a shuffled train/held-out partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n` with `seed` and holds out `ceil(n * test_fraction)` rows.
///
/// When `n >= 2` both sides keep at least one row. The same `(n, fraction,
/// seed)` always produces the same partition.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> TrainTestSplit {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test_len = (n as f64 * test_fraction).ceil() as usize;
    if n >= 2 {
        test_len = test_len.clamp(1, n - 1);
    } else {
        test_len = test_len.min(n);
    }

    let train = indices.split_off(test_len);
    TrainTestSplit {
        train,
        test: indices,
    }
}
