use tracing::debug;

use crate::double_array::{DoubleArrayEncoder, DoubleArrayTrie, ROOT_STATE};
use crate::errors::Result;
use crate::failure::build_failure;
use crate::trie::Trie;

/// Compiled keyword automaton.
///
/// All tables are fixed after construction, so one automaton can be shared by
/// any number of threads.
pub struct Automaton {
    pub(crate) da: DoubleArrayTrie,
    pub(crate) failure: Vec<usize>,
    pub(crate) patterns: Vec<Vec<char>>,
}

impl Automaton {
    /// Compiles an automaton with the default settings.
    ///
    /// # Arguments
    ///
    /// * `patterns` - Keywords to search for.
    ///
    /// # Errors
    ///
    /// This function will return an error variant when:
    ///
    /// * `patterns` is empty.
    /// * a pattern is empty or contains U+0000.
    ///
    /// # Examples
    ///
    /// ```
    /// use dacmark::Automaton;
    ///
    /// let automaton = Automaton::new(["he", "hers"]).unwrap();
    /// assert_eq!("【hers】", String::from_utf8(automaton.tag_line("hers")).unwrap());
    /// ```
    pub fn new<I, P>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        AutomatonBuilder::new().build(patterns)
    }

    /// Base table of the double array.
    pub fn base(&self) -> &[isize] {
        &self.da.base
    }

    /// Check table of the double array.
    pub fn check(&self) -> &[usize] {
        &self.da.check
    }

    /// Output table, indexed by slot. Slots without a pattern hold [`usize::MAX`].
    pub fn output(&self) -> &[usize] {
        &self.da.output
    }

    /// Failure table, indexed by state. [`ROOT_STATE`] is the root.
    pub fn failure(&self) -> &[usize] {
        &self.failure
    }

    /// Number of distinct patterns.
    pub fn n_patterns(&self) -> usize {
        self.patterns.len()
    }

    /// Gets a pattern by the id reported in a [`Match`](crate::Match).
    pub fn pattern(&self, id: usize) -> Option<String> {
        self.patterns.get(id).map(|p| p.iter().collect())
    }
}

/// Builder of [`Automaton`].
pub struct AutomatonBuilder {
    step_size: usize,
    chained_failure: bool,
}

impl Default for AutomatonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomatonBuilder {
    pub const fn new() -> Self {
        Self {
            step_size: 65536,
            chained_failure: false,
        }
    }

    /// Sets the number of slots the tables grow by while encoding.
    pub const fn step_size(mut self, step_size: usize) -> Self {
        self.step_size = step_size;
        self
    }

    /// Walks the whole failure chain of the parent when computing a failure
    /// link, instead of looking only at the parent's failure state.
    ///
    /// The parent-only rule can miss a keyword that follows a long partial
    /// match whose suffix is several links away. Disabled by default.
    ///
    /// # Examples
    ///
    /// ```
    /// use dacmark::AutomatonBuilder;
    ///
    /// let patterns = ["abcd", "bx", "ce"];
    ///
    /// let automaton = AutomatonBuilder::new().build(patterns).unwrap();
    /// assert!(automaton.find("abce").is_empty());
    ///
    /// let automaton = AutomatonBuilder::new().chained_failure(true).build(patterns).unwrap();
    /// assert_eq!(1, automaton.find("abce").len());
    /// ```
    pub const fn chained_failure(mut self, flag: bool) -> Self {
        self.chained_failure = flag;
        self
    }

    pub fn build<I, P>(self, patterns: I) -> Result<Automaton>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut trie = Trie::new(patterns)?;
        debug!(n_patterns = trie.patterns().len(), "sorted dictionary");

        let da = DoubleArrayEncoder::new(&mut trie, self.step_size).encode();
        debug!(
            n_nodes = trie.n_nodes(),
            n_slots = da.len(),
            "encoded double array"
        );

        let failure = build_failure(&trie, &da, self.chained_failure);
        debug!(
            n_links = failure.iter().filter(|&&f| f != ROOT_STATE).count(),
            chained = self.chained_failure,
            "built failure links"
        );

        Ok(Automaton {
            da,
            failure,
            patterns: trie.into_patterns(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::DacmarkError;

    #[test]
    fn test_empty_dictionary() {
        let patterns: Vec<String> = vec![];
        assert!(matches!(
            Automaton::new(patterns),
            Err(DacmarkError::EmptyDictionary)
        ));
    }

    #[test]
    fn test_deterministic_construction() {
        let a = Automaton::new(["he", "she", "his", "hers", "東京"]).unwrap();
        let b = Automaton::new(["東京", "hers", "his", "she", "he", "his"]).unwrap();
        assert_eq!(a.base(), b.base());
        assert_eq!(a.check(), b.check());
        assert_eq!(a.output(), b.output());
        assert_eq!(a.failure(), b.failure());
        assert_eq!(5, a.n_patterns());
    }

    #[test]
    fn test_step_size_does_not_change_tables() {
        let patterns = ["ab", "bc", "abc", "c"];
        let a = AutomatonBuilder::new().step_size(1).build(patterns).unwrap();
        let b = AutomatonBuilder::new().step_size(1000).build(patterns).unwrap();
        assert_eq!(a.base(), b.base());
        assert_eq!(a.check(), b.check());
        assert_eq!(a.failure(), b.failure());
    }

    #[test]
    fn test_pattern() {
        let automaton = Automaton::new(["b", "a"]).unwrap();
        assert_eq!(Some("a".to_string()), automaton.pattern(0));
        assert_eq!(Some("b".to_string()), automaton.pattern(1));
        assert_eq!(None, automaton.pattern(2));
    }

    #[test]
    fn test_failure_never_points_to_terminal() {
        let automaton = Automaton::new(["a", "aa", "aaa", "ba"]).unwrap();
        for &state in automaton.failure() {
            if state != ROOT_STATE {
                assert!(automaton.base().iter().any(|&b| b == state as isize));
            }
        }
    }
}
