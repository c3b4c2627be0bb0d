//! Random-forest classifier
//!
//! The persisted model is a flat JSON document:
//!
//! ```json
//! {
//!   "feature_count": 20,
//!   "feature_names": ["checking_account", "duration", "..."],
//!   "metadata": { "model_hash": "…", "params": { "n_trees": 100, "…": "…" } },
//!   "n_classes": 2,
//!   "trees": [
//!     { "nodes": [
//!         {"id":0,"left":1,"right":2,"feature_idx":1,"threshold":22.5,"leaf":null},
//!         {"id":1,"left":-1,"right":-1,"feature_idx":-1,"threshold":0.0,"leaf":[0.8,0.2]},
//!         {"id":2,"left":-1,"right":-1,"feature_idx":-1,"threshold":0.0,"leaf":[0.4,0.6]}
//!     ] }
//!   ]
//! }
//! ```
//!
//! Prediction averages the leaf distributions of all trees and picks the
//! most probable class.

pub mod model;
pub mod tree;

pub use model::{ForestModel, ModelError, ModelMetadata};
pub use tree::{Node, Tree};
