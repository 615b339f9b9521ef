use crate::error::{CollectorError, CollectorResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<base>.*)_v(?P<n>\d+)$").unwrap())
}

fn split_ext(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    }
}

/// Splits a filename into its logical identity and its version number.
///
/// `report.xlsx` is version 0 of `report.xlsx`; `report_v3.xlsx` is
/// version 3 of the same logical file.
pub fn split_version(filename: &str) -> (String, u32) {
    let (stem, ext) = split_ext(filename);
    match suffix_re().captures(stem) {
        Some(caps) => {
            let n = caps["n"].parse::<u32>().unwrap_or(0);
            (format!("{}{}", &caps["base"], ext), n)
        }
        None => (filename.to_string(), 0),
    }
}

/// Filename for version `n` of `base_filename` (`n = 0` is the base itself).
///
/// The convention is bit-exact: `<base><.ext>` for the first copy,
/// `<base>_v<N><.ext>` for the Nth re-submission, no zero-padding.
pub fn versioned_name(base_filename: &str, n: u32) -> String {
    if n == 0 {
        return base_filename.to_string();
    }
    let (stem, ext) = split_ext(base_filename);
    format!("{}_v{}{}", stem, n, ext)
}

/// Picks the single latest version out of filenames sharing one logical
/// identity.
///
/// Two files carrying the same version number should not exist under the
/// versioned writer's contract; that case is surfaced as
/// [`CollectorError::DuplicateVersion`] rather than resolved silently.
pub fn select_latest<'a, I>(filenames: I) -> CollectorResult<Option<&'a str>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<u32> = Vec::new();
    let mut best: Option<(&'a str, u32)> = None;
    for name in filenames {
        let (base, n) = split_version(name);
        if seen.contains(&n) {
            return Err(CollectorError::DuplicateVersion { base, version: n });
        }
        seen.push(n);
        match best {
            Some((_, best_n)) if best_n > n => {}
            _ => best = Some((name, n)),
        }
    }
    Ok(best.map(|(name, _)| name))
}

/// Groups a folder listing by logical identity, preserving the listing's
/// order for the groups (first-seen) and within each group.
pub fn group_by_identity(paths: &[PathBuf]) -> Vec<(String, Vec<PathBuf>)> {
    let mut groups: Vec<(String, Vec<PathBuf>)> = Vec::new();
    for path in paths {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let (identity, _) = split_version(filename);
        match groups.iter_mut().find(|(id, _)| *id == identity) {
            Some((_, members)) => members.push(path.clone()),
            None => groups.push((identity, vec![path.clone()])),
        }
    }
    groups
}

/// Filename component of a path, or empty string for pathological paths.
pub fn filename_of(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}
