use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::models::{ClaimId, RawClaimText};

/// Read a claims file and split it into one raw text per claim
pub fn read_claims_file(path: &Path) -> Result<Vec<RawClaimText>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;

    let claims = split_claims(&content);
    if claims.is_empty() {
        bail!("No claims found in {:?}", path);
    }
    Ok(claims)
}

/// Split file content into claims
///
/// Claims are separated by lines made only of three or more `-` or `=`.
/// Blank segments are dropped; ids follow the position of the remaining
/// claims.
pub fn split_claims(content: &str) -> Vec<RawClaimText> {
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if is_separator(line) {
            segments.push(std::mem::take(&mut current));
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, text)| RawClaimText::new(ClaimId::from_position(i), text))
        .collect()
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && (line.chars().all(|c| c == '-') || line.chars().all(|c| c == '='))
}
