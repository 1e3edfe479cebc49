use anyhow::{bail, Context, Result};
use batchren_core::{parse_mapping, RenamePair};
use std::fs;

use crate::cli::BatchInput;

/// Collect `--pair` arguments followed by the mapping file entries
pub fn collect_pairs(input: &BatchInput) -> Result<Vec<RenamePair>> {
    let mut pairs: Vec<RenamePair> = input
        .pairs
        .chunks_exact(2)
        .map(|pair| RenamePair::new(&pair[0], pair[1].clone()))
        .collect();

    if let Some(path) = &input.mapping {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
        let mapped = parse_mapping(&content)
            .with_context(|| format!("Invalid mapping file: {}", path.display()))?;
        pairs.extend(mapped);
    }

    if pairs.is_empty() {
        bail!("No renames given. Use --pair FROM TO or --mapping FILE");
    }

    Ok(pairs)
}
