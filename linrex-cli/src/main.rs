use clap::{Parser, Subcommand};
use colored::Colorize;
use linrex_core::{
    Compiler, Fragment, MatchResult, PatternInput, Regex, UnicodePolicy, translate, translate_debug,
};

mod logging;

#[derive(Parser)]
#[command(name = "linrex")]
#[command(about = "linrex - JavaScript RegExp semantics on a linear-time engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Flags for the pattern, e.g. "gu" or "iy"
    #[arg(short, long, global = true)]
    flags: Option<String>,

    /// What to do with patterns compiled without the "u" flag
    #[arg(long, global = true, env = "LINREX_UNICODE_POLICY", default_value = "nothing")]
    unicode_policy: UnicodePolicy,

    #[command(flatten)]
    logging: logging::LogArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pattern against input and show the match
    Exec {
        /// The pattern
        pattern: String,
        /// The input string
        input: String,
    },
    /// Show how a pattern is translated for the engine
    Convert {
        /// The pattern to convert
        pattern: String,
        /// Show the full translation report
        #[arg(short, long)]
        debug: bool,
    },
    /// Replace matches using a `$` template
    Replace {
        /// The pattern
        pattern: String,
        /// The input string
        input: String,
        /// The replacement template
        replacement: String,
    },
    /// Split input around matches
    Split {
        /// The pattern
        pattern: String,
        /// The input string
        input: String,
        /// Maximum number of pieces
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print the index of the first match
    Search {
        /// The pattern
        pattern: String,
        /// The input string
        input: String,
    },
    /// Match several patterns at once and report which one matched
    Set {
        /// The input string
        input: String,
        /// The member patterns, in priority order
        #[arg(required = true)]
        patterns: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.logging.setup_logging(2) {
        eprintln!("{} {}", "Error:".red().bold(), e);
    }

    let compiler = Compiler::with_policy(cli.unicode_policy);
    let flags = cli.flags.as_deref();

    match cli.command {
        Commands::Exec { pattern, input } => cmd_exec(compile(&compiler, &pattern, flags), &input),
        Commands::Convert { pattern, debug } => cmd_convert(&pattern, debug),
        Commands::Replace {
            pattern,
            input,
            replacement,
        } => cmd_replace(compile(&compiler, &pattern, flags), &input, &replacement),
        Commands::Split {
            pattern,
            input,
            limit,
        } => cmd_split(compile(&compiler, &pattern, flags), &input, limit),
        Commands::Search { pattern, input } => cmd_search(compile(&compiler, &pattern, flags), &input),
        Commands::Set { input, patterns } => {
            let members: PatternInput<'_> = patterns.iter().collect();
            match compiler.compile(members, flags) {
                Ok(regex) => cmd_exec(regex, &input),
                Err(e) => fail(e),
            }
        }
    }
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);
    std::process::exit(1);
}

fn compile(compiler: &Compiler, pattern: &str, flags: Option<&str>) -> Regex {
    match compiler.compile(pattern, flags) {
        Ok(r) => r,
        Err(e) => fail(e),
    }
}

fn show_fragment(fragment: Option<Fragment<'_>>) -> String {
    match fragment {
        Some(f) => format!("{:?}", f.to_str_lossy()).green().to_string(),
        None => "undefined".dimmed().to_string(),
    }
}

fn print_match(m: &MatchResult<'_>, last_index: usize) {
    print!("  index {}", m.index().to_string().cyan());
    if let Some(member) = m.pattern_index() {
        print!("  pattern {}", member.to_string().magenta());
    }
    println!("  lastIndex {}", last_index);

    for (i, group) in m.iter().enumerate() {
        println!("    [{}] {}", i, show_fragment(group));
    }
    if let Some(named) = m.groups() {
        for (name, value) in named {
            println!("    <{}> {}", name, show_fragment(*value));
        }
    }
}

fn cmd_exec(mut regex: Regex, input: &str) {
    println!("{} {}", "Pattern:".bold(), regex.to_string().cyan());
    println!("{} {}", "Input:  ".bold(), input.yellow());
    println!();

    let mut count = 0;
    loop {
        let m = match regex.exec(input) {
            Ok(Some(m)) => m,
            Ok(None) => break,
            Err(e) => fail(e),
        };
        count += 1;
        print_match(&m, regex.last_index());
        if !regex.global() {
            break;
        }
        if m.as_fragment().is_empty() {
            regex.set_last_index(regex.last_index() + 1);
        }
    }

    if count == 0 {
        println!("{}", "✗ No match".red());
        std::process::exit(1);
    }
    println!();
    println!("{}", format!("✓ {} match(es)", count).green().bold());
}

fn cmd_convert(pattern: &str, debug: bool) {
    if debug {
        translate_debug(pattern).report();
        return;
    }

    println!("{}", "Converting pattern...".bold());
    println!("  Input:  {}", pattern.cyan());
    println!();
    println!("{}", "Output:".bold());
    println!("  {}", translate(pattern).green());
}

fn cmd_replace(mut regex: Regex, input: &str, replacement: &str) {
    match regex.replace(input, replacement) {
        Ok(result) => println!("{}", result),
        Err(e) => fail(e),
    }
}

fn cmd_split(regex: Regex, input: &str, limit: Option<usize>) {
    let pieces = match regex.split(input, limit) {
        Ok(pieces) => pieces,
        Err(e) => fail(e),
    };
    for (i, piece) in pieces.into_iter().enumerate() {
        println!("  [{}] {}", i, show_fragment(piece));
    }
}

fn cmd_search(regex: Regex, input: &str) {
    match regex.search(input) {
        Ok(Some(index)) => println!("{}", index.to_string().green()),
        Ok(None) => {
            println!("{}", "-1".red());
            std::process::exit(1);
        }
        Err(e) => fail(e),
    }
}
