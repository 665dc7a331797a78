use std::ops::RangeInclusive;

use crate::matrix::ArgError;

/// Inclusive span of switch numbers, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchRange {
    pub start: u32,
    pub end: u32,
}

impl SwitchRange {
    pub fn indices(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

/// Validate the raw `--range START,END` values.
pub fn validate_range(raw: &[String]) -> Result<SwitchRange, ArgError> {
    if raw.len() < 2 {
        return Err(ArgError::RangeIncomplete);
    }
    if raw.len() > 2 {
        return Err(ArgError::RangeMalformed);
    }

    let start = parse_bound(&raw[0])?;
    let end = parse_bound(&raw[1])?;
    if start > end {
        return Err(ArgError::RangeMalformed);
    }

    Ok(SwitchRange { start, end })
}

fn parse_bound(s: &str) -> Result<u32, ArgError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ArgError::RangeMalformed);
    }
    s.parse().map_err(|_| ArgError::RangeMalformed)
}
