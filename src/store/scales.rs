//! Text encoding of dimension-scale metadata.
//!
//! Links are stored as newline separated `dim=value` pairs inside string
//! attributes: `DIMENSION_LIST` and `DIMENSION_LABELS` on the owning dataset,
//! `REFERENCE_LIST` on the scale, plus `CLASS`/`NAME` on the scale.

pub(super) const DIMENSION_LIST: &str = "DIMENSION_LIST";
pub(super) const DIMENSION_LABELS: &str = "DIMENSION_LABELS";
pub(super) const REFERENCE_LIST: &str = "REFERENCE_LIST";
pub(super) const CLASS: &str = "CLASS";
pub(super) const NAME: &str = "NAME";
pub(super) const DIMENSION_SCALE: &str = "DIMENSION_SCALE";

pub(super) fn parse_pairs(text: &str) -> Vec<(usize, String)> {
    text.lines()
        .filter_map(|line| {
            let (dim, value) = line.split_once('=')?;
            Some((dim.trim().parse().ok()?, value.to_owned()))
        })
        .collect()
}

pub(super) fn format_pairs(pairs: &[(usize, String)]) -> String {
    pairs
        .iter()
        .map(|(dim, value)| format!("{dim}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces the entry for `dim`, keeping the list ordered by dimension.
pub(super) fn upsert_pair(pairs: &mut Vec<(usize, String)>, dim: usize, value: &str) {
    pairs.retain(|(existing, _)| *existing != dim);
    pairs.push((dim, value.to_owned()));
    pairs.sort_by_key(|(dim, _)| *dim);
}

/// `path` moved from `from` to `to` if it lies at or below `from`.
pub(super) fn rewrite_prefix(path: &str, from: &str, to: &str) -> Option<String> {
    if path == from {
        return Some(to.to_owned());
    }
    let rest = path.strip_prefix(from)?;
    rest.starts_with('/').then(|| format!("{to}{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_survive_format_and_parse() {
        let pairs = vec![(0, "/group C/R Values".to_owned()), (2, "a=b".to_owned())];
        assert_eq!(parse_pairs(&format_pairs(&pairs)), pairs);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        assert_eq!(parse_pairs("x=/a\n1=/b\nnonsense"), vec![(1, "/b".to_owned())]);
    }

    #[test]
    fn upsert_replaces_same_dimension() {
        let mut pairs = vec![(1, "/b".to_owned()), (0, "/a".to_owned())];
        upsert_pair(&mut pairs, 0, "/c");
        assert_eq!(pairs, vec![(0, "/c".to_owned()), (1, "/b".to_owned())]);
    }

    #[test]
    fn prefix_rewrite_only_touches_subtree() {
        assert_eq!(rewrite_prefix("/a", "/a", "/z").as_deref(), Some("/z"));
        assert_eq!(rewrite_prefix("/a/x", "/a", "/z").as_deref(), Some("/z/x"));
        assert_eq!(rewrite_prefix("/ab/x", "/a", "/z"), None);
        assert_eq!(rewrite_prefix("/b", "/a", "/z"), None);
    }
}
