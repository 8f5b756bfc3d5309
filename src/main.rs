use std::{fs, io::Read, path::PathBuf};

use clap::{Parser, ValueEnum};
use log::info;

use ll1_helper::{
    grammar::{Dialect, Transformed},
    Analysis, ParserConfig, PipelineOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Plain,
    Latex,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DialectArg {
    /// Symbols separated by whitespace
    Words,
    /// Every character is a symbol
    Chars,
}

impl From<DialectArg> for Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Words => Dialect::Words,
            DialectArg::Chars => Dialect::Chars,
        }
    }
}

/// Left factoring, left recursion elimination, FIRST/FOLLOW, LL(1) table
/// and predictive parsing with panic-mode recovery.
#[derive(Debug, Parser)]
#[command(name = "ll1-helper", version, about)]
struct Cli {
    /// Grammar file; read from stdin when omitted
    grammar: Option<PathBuf>,

    /// Sentences to parse, one per line
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "words")]
    dialect: DialectArg,

    #[arg(short, long, value_enum, default_value = "plain")]
    format: OutputFormat,

    /// Skip left factoring
    #[arg(long)]
    no_factor: bool,

    /// Skip left recursion elimination
    #[arg(long)]
    no_elf: bool,

    /// Step budget per sentence
    #[arg(long)]
    max_steps: Option<usize>,

    /// Print the productions after every enabled rewrite
    #[arg(long)]
    prod: bool,

    /// Print FIRST and FOLLOW sets
    #[arg(long)]
    ff: bool,

    /// Print the LL(1) table and its conflicts
    #[arg(long)]
    table: bool,

    /// Print a trace per sentence
    #[arg(long)]
    trace: bool,
}

impl Cli {
    /// No selector given means everything.
    fn all_outputs(&self) -> bool {
        !(self.prod || self.ff || self.table || self.trace)
    }
}

fn print_productions(title: &str, t: &Transformed, format: OutputFormat) {
    if format == OutputFormat::Plain {
        println!("== {} ==", title);
        for event in &t.events {
            println!("# {}", event);
        }
    }
    let out = t.grammar.to_production_output_vec();
    println!(
        "{}",
        match format {
            OutputFormat::Plain => out.to_plaintext(),
            OutputFormat::Latex => out.to_latex(),
            OutputFormat::Json => out.to_json(),
        }
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let all = cli.all_outputs();
    let format = cli.format;

    let source = match &cli.grammar {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut s = String::new();
            std::io::stdin().read_to_string(&mut s)?;
            s
        }
    };

    let options = PipelineOptions {
        dialect: cli.dialect.into(),
        left_factor: !cli.no_factor,
        eliminate_left_recursion: !cli.no_elf,
        parser: ParserConfig {
            max_steps: cli.max_steps,
        },
    };
    let analysis = Analysis::from_source(&source, options)?;
    info!(
        "pipeline finished: {} non-terminals",
        analysis.grammar.non_terminal_iter().count()
    );

    if all || cli.prod {
        if let Some(t) = &analysis.factored {
            print_productions("Left factored", t, format);
        }
        if let Some(t) = &analysis.recursion_free {
            print_productions("Left recursion eliminated", t, format);
        }
        if analysis.factored.is_none() && analysis.recursion_free.is_none() {
            let out = analysis.grammar.to_production_output_vec();
            println!(
                "{}",
                match format {
                    OutputFormat::Plain => out.to_plaintext(),
                    OutputFormat::Latex => out.to_latex(),
                    OutputFormat::Json => out.to_json(),
                }
            );
        }
    }

    if all || cli.ff {
        let t = analysis
            .grammar
            .to_non_terminal_output_vec(&analysis.first, &analysis.follow);
        println!(
            "{}",
            match format {
                OutputFormat::Plain => t.to_plaintext(),
                OutputFormat::Latex => t.to_latex(),
                OutputFormat::Json => t.to_json(),
            }
        );
    }

    if all || cli.table {
        let t = analysis.table.to_output(&analysis.grammar);
        println!(
            "{}",
            match format {
                OutputFormat::Plain => t.to_plaintext(),
                OutputFormat::Latex => t.to_latex(),
                OutputFormat::Json => t.to_json(),
            }
        );
    }

    if let Some(report) = analysis.conflict_report() {
        let table_shown = all || cli.table;
        if format == OutputFormat::Json {
            if cli.input.is_some() {
                eprintln!("{}", report);
            }
        } else if table_shown || cli.input.is_some() {
            println!("{}", report);
        }
    }

    if let Some(path) = &cli.input {
        let sentences = fs::read_to_string(path)?;
        let summary = analysis.parse_sentences(&sentences);

        if format == OutputFormat::Json {
            println!("{}", summary.to_json());
            return Ok(());
        }

        if all || cli.trace {
            for s in &summary.sentences {
                println!("== {} ==", s.sentence);
                println!("{}", s.parse.to_plaintext());
            }
        }
        println!("{}", summary.to_plaintext());
    }

    Ok(())
}
