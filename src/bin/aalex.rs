use aalex::dfa::DFA;
use aalex::diagnostic::Diagnostic;
use aalex::fa::FA;
use aalex::nfa::NFA;
use aalex::scanner::Token;
use aalex::{
    analyze_source, construct_dfa, construct_minimal_dfa, load_grammar, sample_grammar,
    save_grammar, visualize, Lexicon,
};
use clap::{Arg, ArgAction, Command};
use color_eyre::eyre::{Report, Result};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum CliError {
    InvalidExtension(PathBuf),
    InvalidVisualizeTarget(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidExtension(path) => write!(
                f,
                "Error: Invalid file extension for {}. Expected .aa file.",
                path.display()
            ),
            CliError::InvalidVisualizeTarget(target) => write!(
                f,
                "Error: visualize should be one of NFA | DFA | MINIMAL, found {}",
                target
            ),
        }
    }
}

impl std::error::Error for CliError {}

#[derive(Serialize)]
struct JsonReport<'a> {
    tokens: &'a [Token],
    diagnostics: Vec<JsonDiagnostic<'a>>,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    #[serde(flatten)]
    diagnostic: &'a Diagnostic,
    message: String,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(filter)
            .init();
    }
}

fn read_source(path: &Path) -> Result<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("aa") {
        return Err(Report::new(CliError::InvalidExtension(path.to_path_buf())));
    }

    Ok(fs::read_to_string(path)?)
}

fn print_transition_table<T: FA>(title: &str, fa: &T) {
    println!("\n{} Transition Table:", title);
    println!("State  |  Symbol  |  Next State");
    println!("---------------------------------");

    for (state, label, target) in fa.get_transition_triples() {
        println!("  {}     |   {}   |   {}", state, label, target);
    }
}

fn write_tokens(path: &Path, tokens: &[Token]) -> Result<()> {
    let mut out_file = File::create(path)?;

    for token in tokens {
        writeln!(out_file, "({}, {})", token.get_lexeme(), token.get_kind())?;
    }
    Ok(())
}

fn lex_file(args: &clap::ArgMatches, lexicon: &Lexicon, src_file_path: &Path) -> Result<()> {
    let source = read_source(src_file_path)?;
    let output = analyze_source(&source, lexicon);

    if args.get_flag("json") {
        let report = JsonReport {
            tokens: &output.tokens,
            diagnostics: output
                .diagnostics
                .iter()
                .map(|diagnostic| JsonDiagnostic {
                    diagnostic,
                    message: diagnostic.to_string(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for token in &output.tokens {
            println!("{}", token);
        }

        if output.diagnostics.is_empty() {
            println!("\nNo lexical errors found.");
        } else {
            println!("\nErrors found:");
            for diagnostic in &output.diagnostics {
                println!("{}", diagnostic);
            }
        }
    }

    if let Some(out_file_path) = args.get_one::<PathBuf>("output") {
        write_tokens(out_file_path, &output.tokens)?;
    }

    Ok(())
}

fn build_automata(args: &clap::ArgMatches) -> Result<(NFA, DFA, DFA)> {
    let nfa = match args.get_one::<PathBuf>("grammar") {
        Some(grammar_path) => load_grammar(grammar_path)?,
        None => sample_grammar().map_err(Report::new)?,
    };

    if let Some(save_path) = args.get_one::<PathBuf>("save-grammar") {
        save_grammar(&nfa, save_path)?;
    }

    let dfa = construct_dfa(&nfa).map_err(Report::new)?;
    let minimal_dfa = construct_minimal_dfa(&dfa);

    if args.get_flag("save-nfa") {
        nfa.show_fa("constructed_nfa")?;
    }
    if args.get_flag("save-dfa") {
        dfa.show_fa("constructed_dfa")?;
    }
    if args.get_flag("save-minimal-dfa") {
        minimal_dfa.show_fa("constructed_minimal_dfa")?;
    }

    Ok((nfa, dfa, minimal_dfa))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let args = Command::new("aalex")
        .version("0.1.0")
        .about("Lexical analyser for .aa programs with an NFA to DFA demonstration of the language grammar")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("The .aa program source file which should be scanned and tokenized")
                .value_name("INPUT SOURCE FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write the tokens to this file, one (lexeme, KIND) pair per line")
                .value_name("OUTPUT RESULT FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Print tokens and diagnostics as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("symbols")
                .short('s')
                .long("symbols")
                .help("Print the symbol table of built in names")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("grammar")
                .short('g')
                .long("grammar")
                .help("Load the grammar NFA from a JSON file instead of using the built in .aa grammar")
                .value_name("GRAMMAR FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("save-grammar")
                .long("save-grammar")
                .help("Save the grammar NFA as a JSON file")
                .value_name("GRAMMAR FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("automata")
                .short('a')
                .long("automata")
                .help("Print the NFA, DFA and minimal DFA transition tables")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("save-nfa")
                .short('n')
                .long("save-nfa")
                .help("Save the grammar NFA as a Graphviz graph")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("save-dfa")
                .short('d')
                .long("save-dfa")
                .help("Save the DFA obtained after Subset Construction of the NFA")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("save-minimal-dfa")
                .short('m')
                .long("save-minimal-dfa")
                .help("Save the minimal DFA")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("visualize")
                .short('v')
                .long("visualize")
                .help("Visualize the finite automata graphs inside an interactive window that allows for zooming, panning and clicking of elements")
                .value_name("NFA, DFA, MINIMAL")
                .value_parser(clap::value_parser!(String))
                .num_args(1),
        )
        .get_matches();

    let lexicon = Lexicon::aa();

    if args.get_flag("symbols") {
        println!("\n--- Symbol Table ---");
        for entry in lexicon.get_symbols().entries() {
            println!("{}", entry);
        }
    }

    if let Some(src_file_path) = args.get_one::<PathBuf>("input") {
        lex_file(&args, &lexicon, src_file_path)?;
    }

    let wants_automata = args.get_flag("automata")
        || args.get_flag("save-nfa")
        || args.get_flag("save-dfa")
        || args.get_flag("save-minimal-dfa")
        || args.contains_id("grammar")
        || args.contains_id("save-grammar")
        || args.contains_id("visualize");

    if !wants_automata {
        return Ok(());
    }

    let (nfa, dfa, minimal_dfa) = build_automata(&args)?;

    if args.get_flag("automata") {
        print_transition_table("NFA", &nfa);
        print_transition_table("DFA", &dfa);
        print_transition_table("Minimal DFA", &minimal_dfa);

        println!("\nTotal NFA States: {}", nfa.get_num_states());
        println!("Total DFA States: {}", dfa.get_num_states());
        println!("Total Minimal DFA States: {}", minimal_dfa.get_num_states());
    }

    if let Some(target) = args.get_one::<String>("visualize") {
        if target.eq_ignore_ascii_case("nfa") {
            visualize(&nfa)?;
        } else if target.eq_ignore_ascii_case("dfa") {
            visualize(&dfa)?;
        } else if target.eq_ignore_ascii_case("minimal") {
            visualize(&minimal_dfa)?;
        } else {
            return Err(Report::new(CliError::InvalidVisualizeTarget(
                target.to_string(),
            )));
        }
    }

    Ok(())
}
