//! CLI entry point for the LEGv8 simulator binary.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use legv8_core::{
    disassemble_range, load_program, load_program_file, run, CoreConfig, MachineState,
    RegionMemory, RunBoundary, TEXT_START,
};
use legv8_sim::dump::format_registers;
use legv8_sim::logging::init_logging;
use legv8_sim::report::RunReport;
use legv8_sim::shell::{parse_u64, run_shell, Session};
use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;

const USAGE_TEXT: &str = "\
Usage: legv8-sim <command> [options]

Commands:
  run    <program> [--max-steps <n>] [--entry <addr>] [--json]  Run to HLT and dump registers
  disasm <program>                                            List the program
  shell  <program> [--max-steps <n>] [--entry <addr>]          Interactive simulator shell

Options:
  --max-steps <n>  Stop after n instructions (default: no limit)
  --entry <addr>   Initial PC (default: 0x00400000)
  --json           Print the final state as JSON (run only)
  -v, --verbose    Log each executed instruction to stderr
  -h, --help       Show this help message

Programs are text files with one hexadecimal instruction word per line.

Examples:
  legv8-sim run countdown.hex
  legv8-sim run countdown.hex --max-steps 1000 --json
  legv8-sim shell countdown.hex
";

/// Exit code when `run` stops at the step limit instead of `HLT`.
const STEP_LIMIT_EXIT_CODE: i32 = 2;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(RunArgs),
    Disasm(DisasmArgs),
    Shell(RunArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    entry: Option<u64>,
    max_steps: Option<u64>,
    json: bool,
    verbose: bool,
}

impl RunArgs {
    const fn config(&self) -> CoreConfig {
        CoreConfig {
            entry_pc: match self.entry {
                Some(pc) => pc,
                None => TEXT_START,
            },
            max_steps: self.max_steps,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct DisasmArgs {
    input: PathBuf,
    verbose: bool,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_run_args(args, true)
            .map(Command::Run)
            .map(ParseResult::Command),
        "disasm" => parse_disasm_args(args)
            .map(Command::Disasm)
            .map(ParseResult::Command),
        "shell" => parse_run_args(args, false)
            .map(Command::Shell)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(
    mut args: impl Iterator<Item = OsString>,
    accepts_json: bool,
) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut entry = None;
    let mut max_steps = None;
    let mut json = false;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "--json" && accepts_json {
            json = true;
            continue;
        }

        if arg == "--entry" {
            entry = Some(parse_number_option("--entry", args.next())?);
            continue;
        }

        if arg == "--max-steps" {
            max_steps = Some(parse_number_option("--max-steps", args.next())?);
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    let args = RunArgs {
        input,
        entry,
        max_steps,
        json,
        verbose,
    };
    args.config()
        .validate()
        .map_err(|e| format!("invalid value for --entry: {e}"))?;
    Ok(args)
}

fn parse_disasm_args(args: impl Iterator<Item = OsString>) -> Result<DisasmArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut verbose = false;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(DisasmArgs { input, verbose })
}

fn parse_number_option(option: &str, value: Option<OsString>) -> Result<u64, String> {
    let value = value.ok_or_else(|| format!("missing value for {option}"))?;
    let text = value.to_string_lossy();
    parse_u64(&text).ok_or_else(|| format!("invalid value for {option}: {text}"))
}

fn setup_logging(verbose: bool) -> Result<(), i32> {
    init_logging(verbose).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

fn load_words(path: &Path) -> Result<Vec<u32>, i32> {
    load_program_file(path).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

fn run_run(args: &RunArgs) -> Result<(), i32> {
    setup_logging(args.verbose)?;
    let words = load_words(&args.input)?;

    let mut memory = RegionMemory::new();
    load_program(&mut memory, &words, TEXT_START);
    let config = args.config();
    let mut state = MachineState::with_config(&config);
    let outcome = run(&mut state, &mut memory, &config);

    if args.json {
        let json = RunReport::new(&outcome, &state).to_json().map_err(|e| {
            eprintln!("error: failed to serialize report: {e}");
            1
        })?;
        println!("{json}");
    } else {
        print!("{}", format_registers(&state));
        println!(
            "Instructions retired: {} ({} unrecognized)",
            outcome.steps, outcome.unrecognized
        );
    }

    match outcome.boundary {
        RunBoundary::Halted => Ok(()),
        RunBoundary::StepLimit => {
            eprintln!(
                "error: step limit reached after {} instructions without HLT",
                outcome.steps
            );
            Err(STEP_LIMIT_EXIT_CODE)
        }
    }
}

fn run_disasm(args: &DisasmArgs) -> Result<(), i32> {
    setup_logging(args.verbose)?;
    let words = load_words(&args.input)?;

    let mut memory = RegionMemory::new();
    load_program(&mut memory, &words, TEXT_START);
    for row in disassemble_range(&memory, TEXT_START, words.len()) {
        println!("{row}");
    }
    Ok(())
}

fn run_shell_command(args: &RunArgs) -> Result<(), i32> {
    setup_logging(args.verbose)?;
    let words = load_words(&args.input)?;

    let mut session = Session::from_program(&words, args.config());
    println!(
        "Loaded {} words from {}. Type `help` for commands.",
        words.len(),
        args.input.display()
    );

    run_shell(&mut session, io::stdin().lock(), &mut io::stdout().lock()).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Run(args))) => match run_run(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Ok(ParseResult::Command(Command::Disasm(args))) => match run_disasm(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Ok(ParseResult::Command(Command::Shell(args))) => match run_shell_command(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os_args<'a>(args: &'a [&'a str]) -> impl Iterator<Item = OsString> + 'a {
        args.iter().map(OsString::from)
    }

    #[test]
    fn parses_run_command_with_options() {
        let result = parse_run_args(
            os_args(&[
                "countdown.hex",
                "--max-steps",
                "500",
                "--entry",
                "0x400010",
                "--json",
                "-v",
            ]),
            true,
        )
        .expect("valid run args should parse");

        assert_eq!(
            result,
            RunArgs {
                input: PathBuf::from("countdown.hex"),
                entry: Some(0x0040_0010),
                max_steps: Some(500),
                json: true,
                verbose: true,
            }
        );
    }

    #[test]
    fn run_config_defaults_to_text_start() {
        let args = parse_run_args(os_args(&["p.hex"]), true).expect("valid args");
        assert_eq!(args.config(), CoreConfig::default());
    }

    #[test]
    fn shell_rejects_json_flag() {
        let error = parse_run_args(os_args(&["p.hex", "--json"]), false)
            .expect_err("shell should reject --json");
        assert!(error.contains("unknown option: --json"));
    }

    #[test]
    fn parses_disasm_command() {
        let result = parse_args(os_args(&["disasm", "p.hex"])).expect("valid disasm args");
        assert!(matches!(
            result,
            ParseResult::Command(Command::Disasm(DisasmArgs { verbose: false, .. }))
        ));
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os_args(&["--help"])).expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os_args(&["assemble"])).expect_err("unknown command should fail");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn rejects_missing_option_value() {
        let error = parse_run_args(os_args(&["p.hex", "--max-steps"]), true)
            .expect_err("missing value should fail");
        assert_eq!(error, "missing value for --max-steps");
    }

    #[test]
    fn rejects_invalid_option_value() {
        let error = parse_run_args(os_args(&["p.hex", "--entry", "zzz"]), true)
            .expect_err("invalid value should fail");
        assert_eq!(error, "invalid value for --entry: zzz");
    }

    #[test]
    fn rejects_unaligned_entry() {
        let error = parse_run_args(os_args(&["p.hex", "--entry", "0x400002"]), true)
            .expect_err("unaligned entry should fail");
        assert_eq!(
            error,
            "invalid value for --entry: entry pc 0x400002 is not a multiple of 4"
        );

        let error = parse_args(os_args(&["shell", "p.hex", "--entry", "0x400001"]))
            .expect_err("shell should reject unaligned entry too");
        assert!(error.contains("not a multiple of 4"));
    }

    #[test]
    fn rejects_missing_input() {
        let error = parse_disasm_args(std::iter::empty()).expect_err("missing input should fail");
        assert!(error.contains("missing input"));
    }

    #[test]
    fn rejects_multiple_inputs() {
        let error = parse_run_args(os_args(&["a.hex", "b.hex"]), true)
            .expect_err("two inputs should fail");
        assert!(error.contains("multiple input paths"));
    }
}
