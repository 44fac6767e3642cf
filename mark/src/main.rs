use std::fs::File;
use std::io::{prelude::*, stdin, stdout, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use dacmark::{Automaton, AutomatonBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

const BUFFER_SIZE: usize = 256 * 1024;

#[derive(Parser, Debug)]
#[command(name = "mark", about = "A program to tag dictionary keywords in text.")]
struct Args {
    /// The dictionary file, one keyword per line
    #[arg(long)]
    dict: PathBuf,

    /// The text to tag (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// The file to write the tagged text to (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of threads (0 tags on the main thread)
    #[arg(long, default_value = "0")]
    n_threads: usize,

    /// Number of lines handed to the threads at a time
    #[arg(long, default_value = "4096")]
    chunk_size: usize,

    /// Walk the whole failure chain when building failure links
    #[arg(long)]
    chained_failure: bool,
}

/// Reads one keyword per line, trimming whitespace and skipping blank lines.
fn read_dict<R>(rdr: R) -> Result<Vec<String>>
where
    R: BufRead,
{
    let mut words = vec![];
    for line in rdr.lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            words.push(word.to_string());
        }
    }
    Ok(words)
}

/// Tags every line of `rdr`, line terminators included, and returns the number of lines.
fn tag_lines<R, W>(
    automaton: Automaton,
    n_threads: usize,
    chunk_size: usize,
    mut rdr: R,
    mut wtr: W,
) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut n_lines = 0;
    let mut line = vec![];
    if n_threads == 0 {
        let mut tagged = vec![];
        while rdr.read_until(b'\n', &mut line)? != 0 {
            automaton.tag_line_into(&line, &mut tagged);
            wtr.write_all(&tagged)?;
            tagged.clear();
            line.clear();
            n_lines += 1;
        }
    } else {
        let chunk_size = chunk_size.max(1);
        let mut tagger = automaton.multithreading(n_threads);
        let mut chunk = Vec::with_capacity(chunk_size);
        loop {
            let eof = rdr.read_until(b'\n', &mut line)? == 0;
            if !eof {
                chunk.push(std::mem::take(&mut line));
            }
            if chunk.len() >= chunk_size || (eof && !chunk.is_empty()) {
                n_lines += chunk.len();
                for tagged in tagger.tag_lines(chunk.drain(..))? {
                    wtr.write_all(&tagged)?;
                }
            }
            if eof {
                break;
            }
        }
    }
    wtr.flush()?;
    Ok(n_lines)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("Loading dictionary {:?} ...", args.dict);
    let f = File::open(&args.dict)
        .with_context(|| format!("failed to open dictionary: {}", args.dict.display()))?;
    let words = read_dict(BufReader::new(f))?;
    info!("# of keywords: {}", words.len());
    let automaton = AutomatonBuilder::new()
        .chained_failure(args.chained_failure)
        .build(&words)
        .context("failed to build the automaton")?;

    let rdr: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let f = File::open(path)
                .with_context(|| format!("failed to open input: {}", path.display()))?;
            Box::new(BufReader::with_capacity(BUFFER_SIZE, f))
        }
        None => Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin().lock())),
    };
    let wtr: Box<dyn Write> = match &args.output {
        Some(path) => {
            let f = File::create(path)
                .with_context(|| format!("failed to create output: {}", path.display()))?;
            Box::new(BufWriter::with_capacity(BUFFER_SIZE, f))
        }
        None => Box::new(BufWriter::with_capacity(BUFFER_SIZE, stdout().lock())),
    };

    info!("Start tagging");
    let start = Instant::now();
    let n_lines = tag_lines(automaton, args.n_threads, args.chunk_size, rdr, wtr)?;
    let duration = start.elapsed();
    info!("Elapsed: {} [sec]", duration.as_secs_f64());
    info!("Speed: {} [lines/sec]", n_lines as f64 / duration.as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_dict() {
        let words = read_dict("cat\n  dog \r\n\n\t\nbird".as_bytes()).unwrap();
        assert_eq!(vec!["cat", "dog", "bird"], words);
    }

    #[test]
    fn test_tag_lines_keeps_terminators() {
        let input = "a cat\r\nno match\n\nlast cat";
        for n_threads in [0, 2] {
            let automaton = Automaton::new(["cat"]).unwrap();
            let mut output = vec![];
            let n_lines =
                tag_lines(automaton, n_threads, 2, input.as_bytes(), &mut output).unwrap();
            assert_eq!(4, n_lines);
            assert_eq!(
                "a 【cat】\r\nno match\n\nlast 【cat】",
                String::from_utf8(output).unwrap()
            );
        }
    }
}
