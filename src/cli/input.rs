//! File path input handling

use log::warn;
use std::path::PathBuf;

/// Keeps only the paths that can be stat'ed, in their original order.
/// Anything else is logged and dropped.
pub fn filter_existing(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| match path.metadata() {
            Ok(_) => true,
            Err(err) => {
                warn!("Skipping {}: {err}", path.display());
                false
            }
        })
        .cloned()
        .collect()
}
