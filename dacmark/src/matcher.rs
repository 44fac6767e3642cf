use std::ops::Range;

#[cfg(feature = "multithreading")]
use std::sync::Arc;
#[cfg(feature = "multithreading")]
use std::thread;

#[cfg(feature = "multithreading")]
use crossbeam_channel::{Receiver, Sender};

use crate::automaton::Automaton;
use crate::double_array::{ROOT_STATE, START_STATE};
use crate::utils::decode_utf8;

#[cfg(feature = "multithreading")]
use crate::errors::{DacmarkError, Result};

/// Written before every tagged span (U+3010 `【`).
pub const START_TAG: [u8; 3] = [0xE3, 0x80, 0x90];

/// Written after every tagged span (U+3011 `】`).
pub const END_TAG: [u8; 3] = [0xE3, 0x80, 0x91];

/// Occurrence of a pattern, in code points of the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    begin: usize,
    end: usize,
    pattern: usize,
}

impl Match {
    /// Position of the first code point.
    pub const fn begin(&self) -> usize {
        self.begin
    }

    /// Position after the last code point.
    pub const fn end(&self) -> usize {
        self.end
    }

    pub const fn range(&self) -> Range<usize> {
        self.begin..self.end
    }

    /// Id of the matched pattern, see [`Automaton::pattern`].
    pub const fn pattern(&self) -> usize {
        self.pattern
    }
}

/// Per-line buffers. Each concurrent matcher owns its own.
#[derive(Default)]
pub(crate) struct Scratch {
    chars: Vec<Option<char>>,
    offsets: Vec<usize>,
    matches: Vec<Match>,
}

impl Automaton {
    #[inline(always)]
    fn fail_state(&self, state: usize) -> usize {
        match self.failure.get(state) {
            Some(&fail) if fail != ROOT_STATE => fail,
            _ => START_STATE,
        }
    }

    fn find_in(&self, chars: &[Option<char>], matches: &mut Vec<Match>) {
        matches.clear();
        let mut state = START_STATE;
        for (k, &c) in chars.iter().enumerate() {
            let code = match c {
                Some(c) => u32::from(c),
                None => {
                    state = START_STATE;
                    continue;
                }
            };
            let next = loop {
                if let Some(next) = self.da.next_state(state, code) {
                    break Some(next);
                }
                if state == START_STATE {
                    break None;
                }
                state = self.fail_state(state);
            };
            state = match next {
                Some(next) => next,
                None => continue,
            };

            let pattern = match self.da.output(state) {
                Some(pattern) => pattern,
                None => continue,
            };
            let expected = &self.patterns[pattern];
            let end = k + 1;
            if expected.len() > end {
                continue;
            }
            let begin = end - expected.len();
            if !chars[begin..end]
                .iter()
                .zip(expected)
                .all(|(&c, &e)| c == Some(e))
            {
                continue;
            }
            match matches.last_mut() {
                Some(last) if last.begin == begin => {
                    last.end = end;
                    last.pattern = pattern;
                }
                _ => matches.push(Match {
                    begin,
                    end,
                    pattern,
                }),
            }
        }
    }

    /// Finds keywords in one line.
    ///
    /// Matching starts over on every call. Among matches that start at the same
    /// position only the longest one is kept, and the result is sorted by
    /// [`Match::begin`]. Bytes that are not valid UTF-8 never match.
    ///
    /// # Examples
    ///
    /// ```
    /// use dacmark::Automaton;
    ///
    /// let automaton = Automaton::new(["foo", "bar"]).unwrap();
    /// let matches = automaton.find("xfooybarz");
    /// assert_eq!(1..4, matches[0].range());
    /// assert_eq!(5..8, matches[1].range());
    /// ```
    pub fn find<P>(&self, line: P) -> Vec<Match>
    where
        P: AsRef<[u8]>,
    {
        let mut scratch = Scratch::default();
        decode_utf8(line.as_ref(), &mut scratch.chars, &mut scratch.offsets);
        self.find_in(&scratch.chars, &mut scratch.matches);
        scratch.matches
    }

    /// Wraps every keyword in the line with [`START_TAG`] and [`END_TAG`].
    ///
    /// A line without keywords is returned byte for byte. Tags never nest: a
    /// match starting inside an already tagged span is left as it is.
    ///
    /// # Examples
    ///
    /// ```
    /// use dacmark::Automaton;
    ///
    /// let automaton = Automaton::new(["東京"]).unwrap();
    /// let tagged = automaton.tag_line("私は東京に住む\n");
    /// assert_eq!("私は【東京】に住む\n", String::from_utf8(tagged).unwrap());
    /// ```
    pub fn tag_line<P>(&self, line: P) -> Vec<u8>
    where
        P: AsRef<[u8]>,
    {
        let line = line.as_ref();
        let mut output = Vec::with_capacity(line.len());
        self.tag_line_into(line, &mut output);
        output
    }

    /// Same as [`Automaton::tag_line`], appending to `output`.
    pub fn tag_line_into<P>(&self, line: P, output: &mut Vec<u8>)
    where
        P: AsRef<[u8]>,
    {
        let mut scratch = Scratch::default();
        self.tag_line_with(line.as_ref(), &mut scratch, output);
    }

    pub(crate) fn tag_line_with(&self, line: &[u8], scratch: &mut Scratch, output: &mut Vec<u8>) {
        decode_utf8(line, &mut scratch.chars, &mut scratch.offsets);
        self.find_in(&scratch.chars, &mut scratch.matches);
        if scratch.matches.is_empty() {
            output.extend_from_slice(line);
            return;
        }

        let offsets = &scratch.offsets;
        let mut last_byte = 0;
        let mut last_char = 0;
        for m in &scratch.matches {
            if m.begin < last_char {
                continue;
            }
            let begin = offsets[m.begin];
            let end = offsets[m.end];
            output.extend_from_slice(&line[last_byte..begin]);
            output.extend_from_slice(&START_TAG);
            output.extend_from_slice(&line[begin..end]);
            output.extend_from_slice(&END_TAG);
            last_byte = end;
            last_char = m.end;
        }
        output.extend_from_slice(&line[last_byte..]);
    }

    /// Creates a multithreading tagger.
    ///
    /// # Arguments
    ///
    /// * `n_threads` - The number of threads.
    ///
    /// # Returns
    ///
    /// A multithreading tagger.
    #[cfg(feature = "multithreading")]
    #[cfg_attr(docsrs, doc(cfg(feature = "multithreading")))]
    pub fn multithreading(self, n_threads: usize) -> MultithreadTagger {
        MultithreadTagger::new(self, n_threads)
    }
}

/// Tagger that spreads lines over worker threads sharing one automaton.
#[cfg(feature = "multithreading")]
#[cfg_attr(docsrs, doc(cfg(feature = "multithreading")))]
pub struct MultithreadTagger {
    task_tx: Sender<(usize, Vec<u8>)>,
    result_rx: Receiver<(usize, Vec<u8>)>,
}

#[cfg(feature = "multithreading")]
impl MultithreadTagger {
    /// Creates a multithreading tagger.
    ///
    /// # Arguments
    ///
    /// * `automaton` - A compiled automaton.
    /// * `n_threads` - The number of threads. At least one thread is spawned.
    ///
    /// # Returns
    ///
    /// A multithreading tagger.
    pub fn new(automaton: Automaton, n_threads: usize) -> Self {
        let automaton = Arc::new(automaton);

        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<(usize, Vec<u8>)>();
        for _ in 0..n_threads.max(1) {
            let automaton = Arc::clone(&automaton);
            let result_tx = result_tx.clone();
            let task_rx = task_rx.clone();
            thread::spawn(move || {
                let mut scratch = Scratch::default();
                for (i, line) in task_rx {
                    let mut tagged = Vec::with_capacity(line.len());
                    automaton.tag_line_with(&line, &mut scratch, &mut tagged);
                    if result_tx.send((i, tagged)).is_err() {
                        break;
                    }
                }
            });
        }

        Self { task_tx, result_rx }
    }

    /// Tags lines in parallel.
    ///
    /// # Arguments
    ///
    /// * `lines` - Lines to tag.
    ///
    /// # Returns
    ///
    /// Tagged lines, in the order they were given.
    ///
    /// # Errors
    ///
    /// If the worker threads have stopped, an error variant will be returned.
    pub fn tag_lines<I>(&mut self, lines: I) -> Result<Vec<Vec<u8>>>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut n_lines = 0;
        for (i, line) in lines.into_iter().enumerate() {
            self.task_tx
                .send((i, line))
                .map_err(|_| DacmarkError::WorkerDisconnected)?;
            n_lines += 1;
        }
        let mut tagged = vec![vec![]; n_lines];
        for _ in 0..n_lines {
            let (i, line) = self
                .result_rx
                .recv()
                .map_err(|_| DacmarkError::WorkerDisconnected)?;
            tagged[i] = line;
        }
        Ok(tagged)
    }
}
