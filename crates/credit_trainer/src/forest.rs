//! Random-forest trainer
//!
//! Each tree gets its own generator seeded from `(seed, tree index)`, so the
//! forest is identical whether trees are built on one thread or many.

use credit_core::{ForestModel, ForestParams, Tree};
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::{Dataset, N_CLASSES};
use crate::deterministic::{derive_seed, LcgRng};
use crate::errors::TrainerError;

/// Random-forest trainer
pub struct ForestTrainer {
    params: ForestParams,
}

impl ForestTrainer {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Fit a forest on the given dataset
    pub fn train(&self, dataset: &Dataset) -> Result<ForestModel, TrainerError> {
        if dataset.is_empty() {
            return Err(TrainerError::Training("cannot fit on an empty dataset".into()));
        }

        let feature_count = dataset.feature_count();
        let tree_config = TreeConfig {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: self.params.max_features.resolve(feature_count),
        };

        info!(
            "Fitting {} trees on {} samples ({} candidate features per split)",
            self.params.n_trees,
            dataset.len(),
            tree_config.max_features
        );

        let trees = if self.params.n_jobs == 0 {
            self.build_trees(dataset, &tree_config)
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.params.n_jobs)
                .build()
                .map_err(|e| TrainerError::Training(format!("thread pool: {e}")))?;
            pool.install(|| self.build_trees(dataset, &tree_config))
        };

        let model = ForestModel::new(
            N_CLASSES,
            dataset.feature_names.clone(),
            trees,
            self.params.clone(),
            dataset.len(),
        )?;

        info!(
            "Forest complete: {} trees, model hash {}",
            model.num_trees(),
            model.metadata.model_hash
        );
        Ok(model)
    }

    fn build_trees(&self, dataset: &Dataset, tree_config: &TreeConfig) -> Vec<Tree> {
        (0..self.params.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = LcgRng::new(derive_seed(self.params.seed, tree_idx as u64));
                let rows = self.draw_rows(dataset.len(), &mut rng);

                let builder = CartBuilder::new(&dataset.features, &dataset.targets, tree_config.clone());
                let tree = builder.build(rows, &mut rng);
                debug!(
                    "Tree {}/{}: {} nodes, depth {}",
                    tree_idx + 1,
                    self.params.n_trees,
                    tree.nodes.len(),
                    tree.depth()
                );
                tree
            })
            .collect()
    }

    /// Bootstrap sample (with replacement) or every row once
    fn draw_rows(&self, n: usize, rng: &mut LcgRng) -> Vec<usize> {
        if self.params.bootstrap {
            (0..n).map(|_| rng.gen_range(0..n)).collect()
        } else {
            (0..n).collect()
        }
    }
}
