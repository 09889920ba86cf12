//! Decomposition of exponents into boundary-padded triphones.

use crate::error::{AnalysisError, Result};

/// Word-boundary marker padded onto both ends of an exponent.
pub const BOUNDARY: char = '#';

/// Width of the sliding window.
pub const TRIPHONE_WIDTH: usize = 3;

/// Split an exponent into its triphones, left to right, duplicates kept.
///
/// `"abc"` pads to `"#abc#"` and yields `["#ab", "abc", "bc#"]`. An exponent
/// of `L` characters always yields exactly `L` triphones. Windows are taken
/// over characters, so multi-byte segments count as one position.
pub fn decompose(exponent: &str) -> Result<Vec<String>> {
    validate_exponent(exponent)?;

    let padded: Vec<char> = std::iter::once(BOUNDARY)
        .chain(exponent.chars())
        .chain(std::iter::once(BOUNDARY))
        .collect();

    Ok(padded
        .windows(TRIPHONE_WIDTH)
        .map(|w| w.iter().collect())
        .collect())
}

/// Reject exponents that cannot be padded unambiguously.
pub fn validate_exponent(exponent: &str) -> Result<()> {
    if exponent.is_empty() {
        return Err(AnalysisError::MalformedExponent {
            exponent: String::new(),
            reason: "exponent is empty".to_string(),
        });
    }
    if exponent.contains(BOUNDARY) {
        return Err(AnalysisError::MalformedExponent {
            exponent: exponent.to_string(),
            reason: format!("contains reserved boundary marker '{BOUNDARY}'"),
        });
    }
    Ok(())
}
