//! Output generation: flat article files and the cluster export.
//!
//! # Submodules
//!
//! - [`flat`]: Per-source and combined CSV files, and loading them back
//! - [`json`]: The cluster-id → articles JSON read by the display layer
//!
//! # Output Structure
//!
//! ```text
//! news_data/
//! ├── bbc.csv
//! ├── cnn.csv
//! ├── ...
//! ├── all_articles.csv
//! └── cluster_data.json
//! ```
//!
//! Every file is written to a temporary sibling and renamed into place.

pub mod flat;
pub mod json;
