//! Exclusion patterns such as `hero_powers.hero` or `-super_name`.

use std::collections::BTreeSet;
use std::fmt;

/// A set of dotted paths to leave out of a serialized entity.
///
/// Paths are relative to the node being serialized: `hero_powers.hero` on a hero means
/// "inside each of my `hero_powers`, drop `hero`". A leading `-` is accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rules {
    patterns: BTreeSet<Vec<String>>,
}

impl Rules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses each pattern; blank patterns and empty segments are skipped.
    pub fn parse<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns.into_iter().fold(Self::new(), |rules, pattern| rules.exclude(pattern.as_ref()))
    }

    #[must_use]
    pub fn exclude(mut self, pattern: &str) -> Self {
        let segments: Vec<String> = pattern
            .trim()
            .trim_start_matches('-')
            .split('.')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();

        if !segments.is_empty() {
            self.patterns.insert(segments);
        }
        self
    }

    /// `true` when `field` itself is excluded at this level.
    #[must_use]
    pub fn excludes(&self, field: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.len() == 1 && pattern[0] == field)
    }

    /// Rules that apply inside `field`, with `field` stripped from each matching path.
    #[must_use]
    pub fn descend(&self, field: &str) -> Self {
        let patterns = self
            .patterns
            .iter()
            .filter(|pattern| pattern.len() > 1 && pattern[0] == field)
            .map(|pattern| pattern[1..].to_vec())
            .collect();
        Self { patterns }
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self { patterns: self.patterns.union(&other.patterns).cloned().collect() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Rules {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::parse(iter)
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> =
            self.patterns.iter().map(|pattern| format!("-{}", pattern.join("."))).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_minus_and_blank_segments_are_ignored() {
        let rules = Rules::parse(["-hero_powers.hero", "  ", "hero_powers..hero", "-", "name"]);

        assert_eq!(rules.len(), 2);
        assert!(rules.excludes("name"));
        assert!(!rules.excludes("hero_powers"));
    }

    #[test]
    fn descend_strips_the_leading_segment() {
        let rules = Rules::parse(["hero_powers.hero", "hero_powers.power.hero_powers", "power"]);

        let inner = rules.descend("hero_powers");

        assert!(inner.excludes("hero"));
        assert!(!inner.excludes("power"));
        assert!(inner.descend("power").excludes("hero_powers"));
        assert!(rules.descend("hero").is_empty());
    }

    #[test]
    fn union_merges_without_duplicates() {
        let left = Rules::parse(["hero_powers.hero"]);
        let right = Rules::parse(["-hero_powers.hero", "-super_name"]);

        let merged = left.union(&right);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.to_string(), "[-hero_powers.hero, -super_name]");
    }
}
