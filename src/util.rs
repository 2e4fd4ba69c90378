use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

pub fn format_shape(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_owned(),
        [single] => format!("({single},)"),
        _ => format!(
            "({})",
            shape
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Items matching `query` fuzzily, best first. An empty query keeps everything in order.
pub fn fuzzy_rank<T>(
    items: impl IntoIterator<Item = T>,
    query: &str,
    text: impl Fn(&T) -> &str,
) -> Vec<T> {
    let query = query.trim();
    if query.is_empty() {
        return items.into_iter().collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = items
        .into_iter()
        .filter_map(|item| {
            let score = fuzzy_match_score(&matcher, text(&item), query)?;
            Some((score, item))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_read_like_tuples() {
        assert_eq!(format_shape(&[]), "()");
        assert_eq!(format_shape(&[25]), "(25,)");
        assert_eq!(format_shape(&[50, 50]), "(50, 50)");
    }

    #[test]
    fn fuzzy_rank_filters_and_orders() {
        let keys = ["temperature", "pressure", "time"];
        let ranked = fuzzy_rank(keys, "tmp", |key| *key);
        assert_eq!(ranked, vec!["temperature"]);
        assert_eq!(fuzzy_rank(keys, "", |key| *key), keys.to_vec());
    }
}
