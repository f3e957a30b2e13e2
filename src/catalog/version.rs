//! Dotted-numeric versions and wildcard constraints
//!
//! Each dot-separated segment compares by its leading integer, so `17.0.13`
//! sorts after `17.0.9`. A non-numeric tail such as `_9` or `+11` breaks ties
//! as a plain string.

use crate::error::{BuildpackError, Result};
use std::cmp::Ordering;

const WILDCARDS: &[&str] = &["*", "+", "x"];

/// A requested version: either an exact string or a prefix followed by a wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    Exact(String),
    /// Segments that must match literally before the wildcard
    Wildcard(Vec<String>),
}

impl VersionConstraint {
    /// Parses a user-facing constraint.
    ///
    /// A bare major such as `17` is treated as `17.*`; `11.+`, `11.x` and
    /// `11.*` are equivalent.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(BuildpackError::InvalidVersion(input.to_string()));
        }

        let segments: Vec<&str> = trimmed.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(BuildpackError::InvalidVersion(input.to_string()));
        }

        let (last, prefix) = segments
            .split_last()
            .ok_or_else(|| BuildpackError::InvalidVersion(input.to_string()))?;

        if WILDCARDS.contains(last) {
            if prefix.iter().any(|s| WILDCARDS.contains(s)) {
                return Err(BuildpackError::InvalidVersion(input.to_string()));
            }
            return Ok(VersionConstraint::Wildcard(
                prefix.iter().map(|s| s.to_string()).collect(),
            ));
        }

        if segments.iter().any(|s| WILDCARDS.contains(s)) {
            return Err(BuildpackError::InvalidVersion(input.to_string()));
        }

        if segments.len() == 1 && last.chars().all(|c| c.is_ascii_digit()) {
            return Ok(VersionConstraint::Wildcard(vec![last.to_string()]));
        }

        Ok(VersionConstraint::Exact(trimmed.to_string()))
    }

    pub fn matches(&self, version: &str) -> bool {
        match self {
            VersionConstraint::Exact(exact) => exact == version,
            VersionConstraint::Wildcard(prefix) => {
                let segments: Vec<&str> = version.split('.').collect();
                segments.len() >= prefix.len()
                    && prefix.iter().zip(&segments).all(|(want, have)| want == have)
            }
        }
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionConstraint::Exact(v) => write!(f, "{}", v),
            VersionConstraint::Wildcard(prefix) if prefix.is_empty() => write!(f, "*"),
            VersionConstraint::Wildcard(prefix) => write!(f, "{}.*", prefix.join(".")),
        }
    }
}

fn split_segment(segment: &str) -> (Option<u64>, &str) {
    let digits = segment
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(segment.len());
    let number = segment[..digits].parse::<u64>().ok();
    (number, &segment[digits..])
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    let (a_num, a_rest) = split_segment(a);
    let (b_num, b_rest) = split_segment(b);

    match (a_num, b_num) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a_rest.cmp(b_rest)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Compares two dotted versions segment by segment.
///
/// A version with extra trailing segments sorts after its prefix.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => match compare_segment(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return Ordering::Equal,
        }
    }
}

/// Picks the highest version in `candidates` that satisfies `constraint`
pub fn highest_matching<'a, I>(constraint: &VersionConstraint, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter(|v| constraint.matches(v))
        .max_by(|a, b| compare_versions(a, b))
}

/// Major version of a runtime version string, understanding the legacy `1.8.0` form
pub fn java_major(version: &str) -> Option<u32> {
    let mut segments = version.split('.');
    let first = split_segment(segments.next()?).0?;
    if first == 1 {
        let second = split_segment(segments.next()?).0?;
        return u32::try_from(second).ok();
    }
    u32::try_from(first).ok()
}
