//! Seeded train/test partitioning
//!
//! The test partition holds `ceil(n * test_fraction)` rows. With
//! stratification each class contributes in proportion to its frequency,
//! remainders going to the classes with the largest fractional share.

use credit_core::SplitConfig;
use rand::seq::SliceRandom;

use crate::dataset::{Dataset, N_CLASSES};
use crate::deterministic::LcgRng;
use crate::errors::TrainerError;

/// Row indices of each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition dataset rows into train and test indices
pub fn train_test_split(dataset: &Dataset, config: &SplitConfig) -> Result<TrainTestSplit, TrainerError> {
    let n = dataset.len();
    let n_test = (n as f64 * config.test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TrainerError::Training(format!(
            "test_fraction {} leaves an empty partition for {} samples",
            config.test_fraction, n
        )));
    }

    let mut rng = LcgRng::new(config.seed);

    let (mut train, mut test) = if config.stratify {
        stratified(dataset, n_test, &mut rng)?
    } else {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_test);
        (train, indices)
    };

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(TrainTestSplit { train, test })
}

fn stratified(
    dataset: &Dataset,
    n_test: usize,
    rng: &mut LcgRng,
) -> Result<(Vec<usize>, Vec<usize>), TrainerError> {
    let n = dataset.len();
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); N_CLASSES];
    for (i, &t) in dataset.targets.iter().enumerate() {
        by_class[t].push(i);
    }

    if let Some((class, members)) = by_class
        .iter()
        .enumerate()
        .find(|(_, members)| members.len() < 2)
    {
        return Err(TrainerError::Training(format!(
            "class {} has {} member(s); stratified split needs at least 2 per class",
            class,
            members.len()
        )));
    }

    // Every class keeps at least one training row
    if n_test > n - N_CLASSES {
        return Err(TrainerError::Training(format!(
            "{n_test} test rows out of {n} leave a class without training data"
        )));
    }

    // Largest-remainder allocation of test slots
    let shares: Vec<f64> = by_class
        .iter()
        .map(|members| members.len() as f64 * n_test as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let mut order: Vec<usize> = (0..N_CLASSES).collect();
    order.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    let mut remaining = n_test - alloc.iter().sum::<usize>();
    for &class in order.iter().cycle() {
        if remaining == 0 {
            break;
        }
        if alloc[class] < by_class[class].len() - 1 {
            alloc[class] += 1;
            remaining -= 1;
        }
    }

    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (mut members, k) in by_class.into_iter().zip(alloc) {
        members.shuffle(rng);
        let rest = members.split_off(k);
        test.extend(members);
        train.extend(rest);
    }

    Ok((train, test))
}
