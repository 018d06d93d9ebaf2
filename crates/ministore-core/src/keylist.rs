//! Pure helpers over lists of object key names.
//!
//! These functions implement the name-level operations the listing
//! algorithm is built from: prefix filtering and stripping, delimiter
//! grouping, directory extraction, and set-semantics appends. All of
//! them are total and stable — they preserve first-seen order and an
//! empty input always yields an empty output.

/// Return the names that start with `prefix` (exact byte prefix).
#[must_use]
pub fn filter_prefix(names: &[String], prefix: &str) -> Vec<String> {
    names
        .iter()
        .filter(|n| n.starts_with(prefix))
        .cloned()
        .collect()
}

/// Strip a leading `prefix` from every name that carries it.
///
/// Names without the prefix are passed through unchanged; pair with
/// [`filter_prefix`] when only prefixed names should survive.
#[must_use]
pub fn remove_prefix(names: &[String], prefix: &str) -> Vec<String> {
    names
        .iter()
        .map(|n| n.strip_prefix(prefix).unwrap_or(n).to_owned())
        .collect()
}

/// Return the names that do **not** contain `delimiter`.
#[must_use]
pub fn filter_delimited(names: &[String], delimiter: &str) -> Vec<String> {
    names
        .iter()
        .filter(|n| !n.contains(delimiter))
        .cloned()
        .collect()
}

/// Return the names that **do** contain `delimiter`.
#[must_use]
pub fn filter_not_delimited(names: &[String], delimiter: &str) -> Vec<String> {
    names
        .iter()
        .filter(|n| n.contains(delimiter))
        .cloned()
        .collect()
}

/// For each name, keep the substring up to and including the *first*
/// occurrence of `delimiter`.
///
/// Names without the delimiter are passed through unchanged.
#[must_use]
pub fn extract_dir(names: &[String], delimiter: &str) -> Vec<String> {
    names
        .iter()
        .map(|n| match n.find(delimiter) {
            Some(idx) => n[..idx + delimiter.len()].to_owned(),
            None => n.clone(),
        })
        .collect()
}

/// Append `name` to `names` unless it is already present.
#[must_use]
pub fn append_uniq(mut names: Vec<String>, name: &str) -> Vec<String> {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_owned());
    }
    names
}

/// Deduplicate a name list, preserving first-seen order.
#[must_use]
pub fn unique_list(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        out = append_uniq(out, name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_should_filter_by_prefix() {
        let input = names(&["a/1", "a/2", "b/1", "ab"]);
        assert_eq!(filter_prefix(&input, "a/"), names(&["a/1", "a/2"]));
        assert_eq!(filter_prefix(&input, "a"), names(&["a/1", "a/2", "ab"]));
    }

    #[test]
    fn test_should_strip_prefix() {
        let input = names(&["a/1", "a/2"]);
        assert_eq!(remove_prefix(&input, "a/"), names(&["1", "2"]));
    }

    #[test]
    fn test_should_pass_through_names_without_prefix() {
        let input = names(&["b", "a/1"]);
        assert_eq!(remove_prefix(&input, "a/"), names(&["b", "1"]));
    }

    #[test]
    fn test_should_split_on_delimiter_presence() {
        let input = names(&["a/1", "b", "c/d/e"]);
        assert_eq!(filter_delimited(&input, "/"), names(&["b"]));
        assert_eq!(filter_not_delimited(&input, "/"), names(&["a/1", "c/d/e"]));
    }

    #[test]
    fn test_should_extract_dir_to_first_delimiter() {
        let input = names(&["a/1", "c/d/e", "plain"]);
        assert_eq!(extract_dir(&input, "/"), names(&["a/", "c/", "plain"]));
    }

    #[test]
    fn test_should_extract_dir_with_multibyte_delimiter() {
        let input = names(&["x::y::z"]);
        assert_eq!(extract_dir(&input, "::"), names(&["x::"]));
    }

    #[test]
    fn test_should_append_unique_only() {
        let out = append_uniq(names(&["a"]), "b");
        let out = append_uniq(out, "a");
        assert_eq!(out, names(&["a", "b"]));
    }

    #[test]
    fn test_should_deduplicate_preserving_order() {
        let input = names(&["b", "a", "b", "c", "a"]);
        assert_eq!(unique_list(&input), names(&["b", "a", "c"]));
    }

    #[test]
    fn test_should_return_empty_for_empty_input() {
        let empty: Vec<String> = Vec::new();
        assert!(filter_prefix(&empty, "x").is_empty());
        assert!(remove_prefix(&empty, "x").is_empty());
        assert!(filter_delimited(&empty, "/").is_empty());
        assert!(filter_not_delimited(&empty, "/").is_empty());
        assert!(extract_dir(&empty, "/").is_empty());
        assert!(unique_list(&empty).is_empty());
    }
}
