// Minimal demo binary, not part of the core (spec §10). Loads a pattern,
// runs one match, prints the result. Not the host-side test harness the
// full CLI surface describes.

use clap::Parser;
use regex_math::{Config, OptimizationLevel, Regex};

#[derive(Parser)]
#[command(name = "regexmath", about = "Match a pattern against a number or a string, once.")]
struct Args {
    /// The pattern to compile.
    pattern: String,

    /// Match against this unary length instead of a string.
    #[arg(short = 'n', long, conflicts_with = "text")]
    number: Option<u64>,

    /// Sentinel byte for numerical mode's `\w`/`\d`/`\s` classification.
    #[arg(long, default_value = "x")]
    basic_char: char,

    /// Match against this string instead of a number.
    #[arg(long)]
    text: Option<String>,

    /// Report this capture's span instead of the whole match (`\N`).
    #[arg(short = 'o', long, default_value_t = 0)]
    capture: u32,

    /// 0 = naive backtracking only, 1 = + basic runtime shortcuts, 2 = + static/full.
    #[arg(short = 'O', long, default_value_t = 2)]
    optimization_level: u8,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::default();
    config.optimization_level = match args.optimization_level {
        0 => OptimizationLevel::Off,
        1 => OptimizationLevel::Basic,
        _ => OptimizationLevel::Full,
    };

    let re = match Regex::new(&args.pattern, config) {
        Ok(re) => re,
        Err(err) => {
            eprintln!("parse error at offset {}: {}", err.offset, err.message);
            std::process::exit(-1);
        }
    };

    let (matched, offset, length) = if let Some(n) = args.number {
        let m = re.match_number(n, args.basic_char as u8, args.capture);
        (m.matched, m.match_offset, m.match_length)
    } else if let Some(text) = &args.text {
        let m = re.match_string(text.as_bytes(), args.capture);
        (m.matched, m.match_start as u64, m.match_length as u64)
    } else {
        eprintln!("one of -n/--number or --text is required");
        std::process::exit(-1);
    };

    if matched {
        println!("match at offset={offset} length={length}");
    } else {
        println!("no match");
    }
}
