use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use tilename::TileName;

/// `train2coords` - export canonical tile coordinates from a training index.
///
/// Reads a text file formatted for ENet road mapper training and creates a
/// text file of `lat,long` lines formatted to be imported by Google Earth.
///
/// Each input line names two image files. The first filename encodes the
/// tile identity `<type><lat>_<long>_<off>_<rot>.png`; only tiles whose
/// rotation is exactly zero are exported. Malformed lines are reported on
/// stderr and skipped, never aborting the run.
#[derive(Parser, Debug)]
#[command(name = "train2coords", version)]
struct Args {
    /// Text file formatted for ENet road mapper training (stdin if omitted).
    #[arg(short = 'i', long = "inputfile")]
    inputfile: Option<PathBuf>,

    /// Text file formatted to be imported by Google Earth (stdout if omitted).
    #[arg(short = 'o', long = "outputfile")]
    outputfile: Option<PathBuf>,
}

/// Per-run tallies for the end-of-run summary.
#[derive(Debug, Default)]
struct Totals {
    lines: usize,
    written: usize,
}

/// Convert one index line into its `(latitude, longitude)` pair.
///
/// Returns `None` both for malformed lines (reported via `warn!` with the
/// 1-based `line_number`) and for well-formed lines whose rotation is
/// nonzero (filtered silently).
fn convert_line(line: &str, line_number: usize) -> Option<(String, String)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 {
        warn!(
            "Line: {}  Expected format: <filename1> <filename2>   Error: {}",
            line_number,
            line.trim_end()
        );
        return None;
    }

    // Only the first path matters; keep its last `/`-separated segment.
    let filename = tokens[0].rsplit('/').next().unwrap_or(tokens[0]);

    let tile = match TileName::parse(filename) {
        Ok(tile) => tile,
        Err(err) => {
            warn!(
                "Line: {}  Expected file format: <type><lat>_<long>_<off>_<rot>.png   Error: {} ({})",
                line_number, filename, err
            );
            return None;
        }
    };

    if !tile.is_canonical() {
        // Rotated augmentation copy; only the unrotated tile is exported.
        return None;
    }

    Some((tile.latitude, tile.longitude))
}

/// Run the converter over `input`, writing one `lat,long` line per
/// canonical tile to `output` in input order.
fn process<R: BufRead, W: Write>(input: R, output: &mut W) -> Result<Totals> {
    let mut totals = Totals::default();

    for (index, line) in input.lines().enumerate() {
        let line = line.context("failed to read input line")?;
        totals.lines += 1;

        if let Some((latitude, longitude)) = convert_line(&line, index + 1) {
            writeln!(output, "{},{}", latitude, longitude)
                .context("failed to write output line")?;
            totals.written += 1;
        }
    }

    Ok(totals)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let input: Box<dyn BufRead> = match &args.inputfile {
        Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
            format!("cannot open input file {}", path.display())
        })?)),
        None => {
            eprint!("Keyboard input <<<");
            Box::new(io::stdin().lock())
        }
    };

    let mut output: Box<dyn Write> = match &args.outputfile {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("cannot create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let totals = process(input, &mut output)?;
    output.flush().context("failed to flush output")?;

    info!("OK {} lines in, {} coordinates out", totals.lines, totals.written);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(input: &str) -> (String, Totals) {
        let mut output = Vec::new();
        let totals = process(Cursor::new(input), &mut output).unwrap();
        (String::from_utf8(output).unwrap(), totals)
    }

    #[test]
    fn test_canonical_tile_is_exported_verbatim() {
        let (out, totals) = run(
            "./images/X40.7128_-74.0060_3_0.0.png ./images/Y40.7128_-74.0060_3_0.0.png\n",
        );
        assert_eq!(out, "40.7128,-74.0060\n");
        assert_eq!(totals.lines, 1);
        assert_eq!(totals.written, 1);
    }

    #[test]
    fn test_nonzero_rotation_is_filtered_silently() {
        let (out, totals) = run("a/X1_2_3_5.png a/Y1_2_3_5.png\n");
        assert_eq!(out, "");
        assert_eq!(totals.written, 0);
    }

    #[test]
    fn test_wrong_token_count_skips_and_continues() {
        let (out, _) = run("a b c\nd/X1_2_3_0.png d/Y1_2_3_0.png\n");
        assert_eq!(out, "1,2\n");
    }

    #[test]
    fn test_blank_line_skips_and_continues() {
        let (out, totals) = run("\nd/X1_2_3_0.png d/Y1_2_3_0.png\n");
        assert_eq!(out, "1,2\n");
        assert_eq!(totals.lines, 2);
    }

    #[test]
    fn test_bad_stem_skips_and_continues() {
        // 3 fields, then a non-numeric rotation, then a good line.
        let input = "a/X1_2_3.png a/Y1_2_3.png\n\
                     a/X1_2_3_abc.png a/Y1_2_3_abc.png\n\
                     a/X9_8_7_0.png a/Y9_8_7_0.png\n";
        let (out, totals) = run(input);
        assert_eq!(out, "9,8\n");
        assert_eq!(totals.lines, 3);
        assert_eq!(totals.written, 1);
    }

    #[test]
    fn test_output_preserves_input_order() {
        let input = "a/X1_10_0_0.png a/Y1_10_0_0.png\n\
                     a/X2_20_0_90.png a/Y2_20_0_90.png\n\
                     a/X3_30_0_0.png a/Y3_30_0_0.png\n";
        let (out, _) = run(input);
        assert_eq!(out, "1,10\n3,30\n");
    }

    #[test]
    fn test_idempotent_over_same_input() {
        let input = "a/X1_2_3_0.png a/Y1_2_3_0.png\nbad line here\n";
        let (first, _) = run(input);
        let (second, _) = run(input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_convert_line_without_directory_part() {
        assert_eq!(
            convert_line("X5_6_7_0.png Y5_6_7_0.png", 1),
            Some(("5".to_owned(), "6".to_owned()))
        );
    }

    #[test]
    fn test_convert_line_zero_spellings() {
        for rot in ["0", "0.0", "-0"] {
            let line = format!("a/X1_2_3_{rot}.png a/Y1_2_3_{rot}.png");
            assert!(convert_line(&line, 1).is_some(), "rotation {rot:?}");
        }
    }
}
