//! Runtime version extraction and comparison.
//!
//! Versions here are loose strings (`1.8.0_392`, `17.0.2+8`, `3.11`), not
//! semver. Comparison normalizes classic `1.x` Java numbering and compares
//! digit runs element-wise.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

/// Architecture tokens that look like version numbers.
static CONFUSABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"aarch(32|64)|amd(32|64)|i[3-6]86|x86[-_](32|64)|x(64|86)")
        .expect("valid arch pattern")
});

static JAVA8_UPDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"8u(\d+)").expect("valid 8u pattern"));

static PREFIXED_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:java|jdk|hotspot)[-_]?(\d+(?:[-+_.]\d+)*)").expect("valid prefixed pattern")
});

static BARE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[-+_.]\d+)*").expect("valid version pattern"));

static PYTHON_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"python[-_]?(\d+(?:\.\d+)*)").expect("valid python pattern")
});

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid digits"));

/// Guess a Java version from an installation directory name.
///
/// Tries, in order: an `8u<n>` update marker, a version right after
/// `java`/`jdk`/`hotspot`, then the first version-looking run anywhere.
pub fn guess_java_version(dir_name: &str) -> Option<String> {
    let lowered = dir_name.to_lowercase();
    let name = CONFUSABLE.replace_all(&lowered, "");

    if let Some(caps) = JAVA8_UPDATE.captures(&name) {
        return Some(format!("1.8.0_{}", &caps[1]));
    }

    if let Some(caps) = PREFIXED_VERSION.captures(&name) {
        return Some(cleanup_version(&caps[1]));
    }

    BARE_VERSION
        .find(&name)
        .map(|m| cleanup_version(m.as_str()))
}

/// Guess a Python version from an installation directory name.
///
/// `python3.11` and `python-3.11.4` keep their dots; the Windows layout
/// `Python311` becomes `3.11`.
pub fn guess_python_version(dir_name: &str) -> Option<String> {
    let lowered = dir_name.to_lowercase();
    let name = CONFUSABLE.replace_all(&lowered, "");

    let caps = PYTHON_VERSION.captures(&name)?;
    let version = &caps[1];
    if !version.contains('.') && version.len() > 1 {
        let (major, minor) = version.split_at(1);
        return Some(format!("{}.{}", major, minor));
    }
    Some(version.to_string())
}

/// Prefix `1.` onto bare classic major versions (`8` -> `1.8`).
///
/// Applies when the version starts with a single digit 2-8 that is not
/// followed by another digit.
pub fn cleanup_version(version: &str) -> String {
    let mut chars = version.chars();
    let first = chars.next();
    let second = chars.next();
    match (first, second) {
        (Some('2'..='8'), None) => format!("1.{}", version),
        (Some('2'..='8'), Some(c)) if !c.is_ascii_digit() => format!("1.{}", version),
        _ => version.to_string(),
    }
}

fn digit_runs(version: &str) -> Vec<u64> {
    let normalized = version.strip_prefix("1.").unwrap_or(version);
    DIGITS
        .find_iter(normalized)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Compare two versions; a missing bound always compares as equal.
///
/// Digit runs are compared pairwise after stripping a leading `1.`; once
/// either side runs out the versions are considered equal.
pub fn compare_versions(version: &str, bound: Option<&str>) -> Ordering {
    let Some(bound) = bound else {
        return Ordering::Equal;
    };

    digit_runs(version)
        .iter()
        .zip(digit_runs(bound).iter())
        .map(|(a, b)| a.cmp(b))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Whether `version` falls outside `[min, max]`.
pub fn version_out_of_bounds(version: &str, min: Option<&str>, max: Option<&str>) -> bool {
    compare_versions(version, min) == Ordering::Less
        || compare_versions(version, max) == Ordering::Greater
}

/// Leading digit runs of a version after classic normalization.
pub fn version_components(version: &str) -> Vec<u64> {
    digit_runs(version)
}
