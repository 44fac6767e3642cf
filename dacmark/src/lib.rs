#![cfg_attr(docsrs, feature(doc_cfg))]

//! # dacmark
//!
//! dacmark finds dictionary keywords in text with an Aho-Corasick automaton
//! stored as a double-array trie, and marks every match with `【` and `】`.
//!
//! ## Examples
//!
//! ```
//! use dacmark::Automaton;
//!
//! let automaton = Automaton::new(["he", "hers", "foo"]).unwrap();
//!
//! let tagged = automaton.tag_line("hers and foo\n");
//! assert_eq!("【hers】 and 【foo】\n", String::from_utf8(tagged).unwrap());
//!
//! let matches = automaton.find("a foo");
//! let m = &matches[0];
//! assert_eq!((2, 5), (m.begin(), m.end()));
//! assert_eq!(Some("foo".to_string()), automaton.pattern(m.pattern()));
//! ```
//!
//! Lines can be tagged on several threads with [`MultithreadTagger`]
//! (**crate feature** `multithreading`, enabled by default).

mod automaton;
mod double_array;
mod errors;
mod failure;
mod matcher;
mod trie;
mod utils;

pub use automaton::{Automaton, AutomatonBuilder};
pub use double_array::{ROOT_STATE, START_STATE};
pub use errors::{DacmarkError, InvalidPatternError, Result};
pub use matcher::{Match, END_TAG, START_TAG};

#[cfg(feature = "multithreading")]
pub use matcher::MultithreadTagger;
