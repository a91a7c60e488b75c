//! Compaction of shard file names into brace-expansion range tokens.
//!
//! Names are split into a prefix and a trailing digit run, bucketed by
//! prefix, and each bucket becomes one `prefix{000..max}.ext` token. The range
//! always starts at zero and is never checked for gaps: a bucket holding
//! `0000`, `0001`, `0003` still yields `{0000..0003}`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::ResolveError;
use crate::transport::strip_extension;
use crate::types::{DigitSuffix, ShardPrefix, ShardToken};

fn trailing_digits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9]+$").expect("static trailing digits pattern"))
}

/// Split `stem` into the text before its trailing ASCII digit run and the run itself.
///
/// A stem without trailing digits yields an empty suffix.
pub fn split_trailing_digits(stem: &str) -> (&str, &str) {
    match trailing_digits_pattern().find(stem) {
        Some(found) => (&stem[..found.start()], found.as_str()),
        None => (stem, ""),
    }
}

/// Shard names sharing one prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardGroup {
    /// Text preceding the trailing digit run (may include a directory path).
    pub prefix: ShardPrefix,
    /// Digit suffixes in the order they were observed.
    pub suffixes: Vec<DigitSuffix>,
    /// Whether a name equal to the bare prefix (no digits) was observed.
    pub bare: bool,
}

impl ShardGroup {
    fn new(prefix: ShardPrefix) -> Self {
        Self {
            prefix,
            suffixes: Vec::new(),
            bare: false,
        }
    }

    /// Padding width, taken from the first observed suffix.
    pub fn digit_width(&self) -> usize {
        self.suffixes.first().map(String::len).unwrap_or(0)
    }

    /// Largest numeric suffix, or `None` when the group has no digit suffixes.
    pub fn max_index(&self) -> Result<Option<u64>, ResolveError> {
        let mut max: Option<u64> = None;
        for suffix in &self.suffixes {
            let value: u64 = suffix.parse().map_err(|_| {
                ResolveError::ShardIndexOverflow(format!("{}{}", self.prefix, suffix))
            })?;
            max = Some(max.map_or(value, |current| current.max(value)));
        }
        Ok(max)
    }

    /// Render this group as descriptor tokens (unformatted).
    ///
    /// A bare name is emitted literally, ahead of the range token.
    pub fn tokens(&self, extension: &str) -> Result<Vec<ShardToken>, ResolveError> {
        let mut tokens = Vec::new();
        if self.bare {
            tokens.push(format!("{}.{}", self.prefix, extension));
        }
        if let Some(max) = self.max_index()? {
            let width = self.digit_width();
            tokens.push(format!(
                "{}{{{:0width$}..{:0width$}}}.{}",
                self.prefix, 0, max, extension
            ));
        }
        Ok(tokens)
    }
}

/// Bucket shard names by prefix, sorted by prefix.
///
/// Only names ending in `.<extension>` participate; anything else is ignored.
pub fn group_shard_names<I, S>(names: I, extension: &str) -> Vec<ShardGroup>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: BTreeMap<ShardPrefix, ShardGroup> = BTreeMap::new();
    for name in names {
        let Some(stem) = strip_extension(name.as_ref(), extension) else {
            continue;
        };
        let (prefix, suffix) = split_trailing_digits(stem);
        let group = groups
            .entry(prefix.to_string())
            .or_insert_with(|| ShardGroup::new(prefix.to_string()));
        if suffix.is_empty() {
            group.bare = true;
        } else {
            group.suffixes.push(suffix.to_string());
        }
    }
    groups.into_values().collect()
}

/// Group `names` and render every group's tokens in prefix order.
pub fn compact_shard_names<I, S>(names: I, extension: &str) -> Result<Vec<ShardToken>, ResolveError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = Vec::new();
    for group in group_shard_names(names, extension) {
        tokens.extend(group.tokens(extension)?);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_trailing_digits_finds_maximal_run() {
        assert_eq!(split_trailing_digits("shard_0042"), ("shard_", "0042"));
        assert_eq!(split_trailing_digits("v2_part7"), ("v2_part", "7"));
        assert_eq!(split_trailing_digits("00000003"), ("", "00000003"));
        assert_eq!(split_trailing_digits("no_digits"), ("no_digits", ""));
    }

    #[test]
    fn non_ascii_digits_are_not_shard_indices() {
        assert_eq!(split_trailing_digits("shard_\u{0661}"), ("shard_\u{0661}", ""));
        let tokens = compact_shard_names(["shard_\u{0661}.tar", "shard_0.tar"], "tar").unwrap();
        assert_eq!(tokens, vec!["shard_{0..0}.tar", "shard_\u{0661}.tar"]);
    }

    #[test]
    fn dense_run_compacts_to_single_range() {
        let names: Vec<String> = (0..100).map(|idx| format!("shard_{idx:04}.tar")).collect();
        let tokens = compact_shard_names(&names, "tar").unwrap();
        assert_eq!(tokens, vec!["shard_{0000..0099}.tar"]);
    }

    #[test]
    fn disjoint_prefixes_sort_lexicographically() {
        let names = ["zeta_01.tar", "alpha_00.tar", "zeta_00.tar", "alpha_03.tar"];
        let tokens = compact_shard_names(names, "tar").unwrap();
        assert_eq!(tokens, vec!["alpha_{00..03}.tar", "zeta_{00..01}.tar"]);
    }

    #[test]
    fn gaps_are_not_detected() {
        let names = ["shard_0000.tar", "shard_0001.tar", "shard_0003.tar"];
        let tokens = compact_shard_names(names, "tar").unwrap();
        assert_eq!(tokens, vec!["shard_{0000..0003}.tar"]);
    }

    #[test]
    fn range_starts_at_zero_even_when_first_shard_is_missing() {
        let names = ["shard_0005.tar", "shard_0006.tar"];
        let tokens = compact_shard_names(names, "tar").unwrap();
        assert_eq!(tokens, vec!["shard_{0000..0006}.tar"]);
    }

    #[test]
    fn width_comes_from_first_observed_suffix() {
        let group = group_shard_names(["s_7.tar", "s_0010.tar"], "tar").remove(0);
        assert_eq!(group.digit_width(), 1);
        assert_eq!(group.tokens("tar").unwrap(), vec!["s_{0..10}.tar"]);
    }

    #[test]
    fn non_shard_names_are_ignored() {
        let names = ["shard_0000.tar", "meta.json", "shard_0001.tar.idx", "guitar"];
        let tokens = compact_shard_names(names, "tar").unwrap();
        assert_eq!(tokens, vec!["shard_{0000..0000}.tar"]);
    }

    #[test]
    fn bare_names_are_emitted_literally() {
        let names = ["/d/train.tar", "/d/train3.tar", "/d/extra.tar"];
        let tokens = compact_shard_names(names, "tar").unwrap();
        assert_eq!(
            tokens,
            vec!["/d/extra.tar", "/d/train.tar", "/d/train{0..3}.tar"]
        );
    }

    #[test]
    fn oversized_suffix_is_an_error() {
        let names = ["shard_123456789012345678901234567890.tar"];
        assert!(matches!(
            compact_shard_names(names, "tar"),
            Err(ResolveError::ShardIndexOverflow(_))
        ));
    }

    #[test]
    fn grouping_is_independent_of_input_order() {
        let forward = ["b_1.tar", "a_0.tar", "b_0.tar", "a_2.tar"];
        let mut reversed = forward;
        reversed.reverse();
        assert_eq!(
            compact_shard_names(forward, "tar").unwrap(),
            compact_shard_names(reversed, "tar").unwrap()
        );
    }
}
