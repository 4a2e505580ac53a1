//! Policy path parsing.
//!
//! Paths are absolute and `/`-delimited (`/org/team/svc`). `/` is the root and
//! one trailing slash is tolerated. Segments use ASCII alphanumerics, `-`, `_`
//! and `.`.

use cilium_net_common::error::{Error, Result};

pub const ROOT: &str = "/";

/// Split a path into its segments; the root yields none.
pub fn segments(path: &str) -> Result<Vec<&str>> {
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| Error::invalid_path(path, "must start with '/'"))?;
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() {
        return Ok(vec![]);
    }

    let mut out = Vec::new();
    for seg in rest.split('/') {
        check_segment(path, seg)?;
        out.push(seg);
    }
    Ok(out)
}

pub fn check_segment(path: &str, seg: &str) -> Result<()> {
    if seg.is_empty() {
        return Err(Error::invalid_path(path, "empty segment"));
    }
    if !seg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::invalid_path(path, "segment has invalid characters"));
    }
    Ok(())
}

/// Render segments back into a canonical path.
pub fn join(segs: &[&str]) -> String {
    if segs.is_empty() {
        return ROOT.to_string();
    }
    let mut out = String::new();
    for s in segs {
        out.push('/');
        out.push_str(s);
    }
    out
}
