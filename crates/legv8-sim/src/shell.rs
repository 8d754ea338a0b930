//! Interactive simulator shell.
//!
//! Each input line parses into a [`ShellCommand`], which a [`Session`]
//! applies to its machine state and memory. The read loop in
//! [`run_shell`] only moves text between the two, so everything but the
//! prompt is testable without a terminal.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use legv8_core::{
    disassemble_one, load_program, run, step_one, CoreConfig, MachineState, Register,
    RegionMemory, RunBoundary, StepOutcome, TEXT_START,
};

use crate::dump::{format_memory, format_registers};

/// Prompt printed before each command.
pub const PROMPT: &str = "LEGv8-SIM> ";

/// Largest number of words a single `mdump` may print.
pub const MAX_DUMP_WORDS: u64 = 4096;

/// Largest instruction count a single `run <n>` may list.
pub const MAX_RUN_STEPS: u64 = 4096;

/// Text printed by `help`.
pub const HELP_TEXT: &str = "\
go                  run until HLT (or the configured step limit)
run <n>             execute at most n (up to 4096) instructions, listing each one
rdump               dump PC, flags and registers
mdump <lo> <hi>     dump memory words from lo to hi
input <reg> <val>   set a register (e.g. `input X2 0x10000000`)
help                show this message
quit                leave the shell";

/// A parsed shell command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    /// Run until halt or the session step limit.
    Go,
    /// Execute at most this many instructions.
    Run(u64),
    /// Dump registers.
    Rdump,
    /// Dump memory words in `lo..=hi`.
    Mdump {
        /// First address (rounded down to a word).
        lo: u64,
        /// Last address, inclusive.
        hi: u64,
    },
    /// Overwrite one register.
    Input {
        /// Destination register.
        reg: Register,
        /// New value.
        value: i64,
    },
    /// Show the command list.
    Help,
    /// Leave the shell.
    Quit,
}

/// A shell line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// The first word is not a known command.
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),
    /// A required argument is absent.
    #[error("`{command}` expects {expected}")]
    MissingArgument {
        /// Command name.
        command: &'static str,
        /// Description of the missing argument.
        expected: &'static str,
    },
    /// An argument did not parse.
    #[error("invalid {what} `{text}`")]
    InvalidArgument {
        /// What the argument should have been.
        what: &'static str,
        /// Offending text.
        text: String,
    },
    /// More arguments than the command takes.
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
    /// `run` count exceeds [`MAX_RUN_STEPS`].
    #[error(
        "run count {count} exceeds the limit of {max} (use `go` to run to completion)",
        max = MAX_RUN_STEPS
    )]
    CountTooLarge {
        /// Requested instruction count.
        count: u64,
    },
    /// `mdump` range is inverted or too large.
    #[error(
        "memory range {lo:#x}..={hi:#x} must be ascending and span at most {max} words",
        max = MAX_DUMP_WORDS
    )]
    InvalidRange {
        /// Requested first address.
        lo: u64,
        /// Requested last address.
        hi: u64,
    },
}

/// Parses one input line. Blank lines yield `Ok(None)`.
///
/// Command names are case-insensitive. Numbers accept a `0x` prefix for hex
/// and otherwise parse as decimal; register values may be negative.
///
/// # Errors
///
/// Returns [`ShellError`] describing the first problem found.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, ShellError> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };

    let command = match first.to_ascii_lowercase().as_str() {
        "go" | "g" => ShellCommand::Go,
        "run" | "r" => {
            let count = words.next().ok_or(ShellError::MissingArgument {
                command: "run",
                expected: "an instruction count",
            })?;
            let count = parse_u64(count).ok_or_else(|| invalid("count", count))?;
            if count > MAX_RUN_STEPS {
                return Err(ShellError::CountTooLarge { count });
            }
            ShellCommand::Run(count)
        }
        "rdump" => ShellCommand::Rdump,
        "mdump" => {
            let missing = ShellError::MissingArgument {
                command: "mdump",
                expected: "<lo> <hi> addresses",
            };
            let lo_text = words.next().ok_or_else(|| missing.clone())?;
            let hi_text = words.next().ok_or(missing)?;
            let lo = parse_u64(lo_text).ok_or_else(|| invalid("address", lo_text))?;
            let hi = parse_u64(hi_text).ok_or_else(|| invalid("address", hi_text))?;
            if hi < lo || (hi - lo) / 4 >= MAX_DUMP_WORDS {
                return Err(ShellError::InvalidRange { lo, hi });
            }
            ShellCommand::Mdump { lo, hi }
        }
        "input" | "i" => {
            let missing = ShellError::MissingArgument {
                command: "input",
                expected: "<reg> <value>",
            };
            let reg_text = words.next().ok_or_else(|| missing.clone())?;
            let value_text = words.next().ok_or(missing)?;
            let reg = parse_register(reg_text).ok_or_else(|| invalid("register", reg_text))?;
            let value = parse_i64(value_text).ok_or_else(|| invalid("value", value_text))?;
            ShellCommand::Input { reg, value }
        }
        "help" | "h" | "?" => ShellCommand::Help,
        "quit" | "q" | "exit" => ShellCommand::Quit,
        _ => return Err(ShellError::UnknownCommand(first.to_string())),
    };

    if let Some(extra) = words.next() {
        return Err(ShellError::UnexpectedArgument(extra.to_string()));
    }
    Ok(Some(command))
}

/// Parses an unsigned number, hex with a `0x` prefix or decimal.
#[must_use]
pub fn parse_u64(text: &str) -> Option<u64> {
    let text = text.replace('_', "");
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) if hex.bytes().all(|byte| byte.is_ascii_hexdigit()) => {
            u64::from_str_radix(hex, 16).ok()
        }
        None if text.bytes().all(|byte| byte.is_ascii_digit()) => text.parse().ok(),
        _ => None,
    }
}

/// Parses a register value. Hex literals are taken as raw 64-bit patterns,
/// so `0xffffffffffffffff` is `-1`.
#[allow(clippy::cast_possible_wrap)]
fn parse_i64(text: &str) -> Option<i64> {
    if let Some(magnitude) = text.strip_prefix('-') {
        return parse_u64(magnitude).and_then(|value| 0_i64.checked_sub_unsigned(value));
    }
    parse_u64(text).map(|value| value as i64)
}

fn parse_register(text: &str) -> Option<Register> {
    let upper = text.to_ascii_uppercase();
    if upper == "XZR" {
        return Some(Register::ZERO);
    }
    let digits = upper.strip_prefix('X').unwrap_or(&upper);
    digits.parse::<u8>().ok().and_then(Register::new)
}

fn invalid(what: &'static str, text: &str) -> ShellError {
    ShellError::InvalidArgument {
        what,
        text: text.to_string(),
    }
}

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellReply {
    /// Print this text and read the next command.
    Continue(String),
    /// Leave the shell.
    Quit,
}

/// Machine state and memory driven by shell commands.
#[derive(Debug, Clone)]
pub struct Session {
    state: MachineState,
    memory: RegionMemory,
    config: CoreConfig,
    retired: u64,
}

impl Session {
    /// Starts a session over preloaded memory.
    #[must_use]
    pub fn new(memory: RegionMemory, config: CoreConfig) -> Self {
        Self {
            state: MachineState::with_config(&config),
            memory,
            config,
            retired: 0,
        }
    }

    /// Loads `words` at the start of the text region and starts a session.
    #[must_use]
    pub fn from_program(words: &[u32], config: CoreConfig) -> Self {
        let mut memory = RegionMemory::new();
        load_program(&mut memory, words, TEXT_START);
        Self::new(memory, config)
    }

    /// Current machine state.
    #[must_use]
    pub const fn state(&self) -> &MachineState {
        &self.state
    }

    /// Backing memory.
    #[must_use]
    pub const fn memory(&self) -> &RegionMemory {
        &self.memory
    }

    /// Instructions retired since the session started.
    #[must_use]
    pub const fn retired(&self) -> u64 {
        self.retired
    }

    /// Applies one command.
    pub fn apply(&mut self, command: &ShellCommand) -> ShellReply {
        tracing::debug!(?command, "shell command");
        let text = match *command {
            ShellCommand::Go => self.go(),
            ShellCommand::Run(count) => self.run_steps(count),
            ShellCommand::Rdump => format!(
                "{}Instructions retired: {}\n",
                format_registers(&self.state),
                self.retired
            ),
            ShellCommand::Mdump { lo, hi } => format_memory(&self.memory, lo, hi),
            ShellCommand::Input { reg, value } => {
                if reg.is_zero() {
                    "XZR is hard-wired to zero; write ignored\n".to_string()
                } else {
                    self.state.arch.set_gpr(reg, value);
                    format!("{reg} = {value:#x} ({value})\n")
                }
            }
            ShellCommand::Help => format!("{HELP_TEXT}\n"),
            ShellCommand::Quit => return ShellReply::Quit,
        };
        ShellReply::Continue(text)
    }

    fn go(&mut self) -> String {
        if self.state.is_halted() {
            return "machine is halted\n".to_string();
        }
        let outcome = run(&mut self.state, &mut self.memory, &self.config);
        self.retired += outcome.steps;

        let mut text = match outcome.boundary {
            RunBoundary::Halted => format!("halted after {} instructions", outcome.steps),
            RunBoundary::StepLimit => {
                format!("stopped at step limit after {} instructions", outcome.steps)
            }
        };
        if outcome.unrecognized > 0 {
            text.push_str(&format!(" ({} unrecognized)", outcome.unrecognized));
        }
        text.push('\n');
        text
    }

    /// Steps at most `count` instructions, clamped to [`MAX_RUN_STEPS`].
    fn run_steps(&mut self, count: u64) -> String {
        let mut text = String::new();
        for _ in 0..count.min(MAX_RUN_STEPS) {
            let row = disassemble_one(&self.memory, self.state.arch.pc());
            let (outcome, next) = step_one(&self.state, &mut self.memory);
            if outcome == StepOutcome::AlreadyHalted {
                text.push_str("machine is halted\n");
                break;
            }
            self.state = next;
            self.retired += 1;
            text.push_str(&row.to_string());
            text.push('\n');
            if self.state.is_halted() {
                break;
            }
        }
        text
    }
}

/// Reads commands from `input` until `quit` or end of input, writing the
/// prompt, replies and parse errors to `output`.
///
/// # Errors
///
/// Propagates I/O errors from either stream.
pub fn run_shell(
    session: &mut Session,
    input: impl BufRead,
    output: &mut impl Write,
) -> io::Result<()> {
    write!(output, "{PROMPT}")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            Ok(Some(command)) => match session.apply(&command) {
                ShellReply::Continue(text) => write!(output, "{text}")?,
                ShellReply::Quit => {
                    writeln!(output, "Bye.")?;
                    return Ok(());
                }
            },
            Ok(None) => {}
            Err(err) => writeln!(output, "error: {err}")?,
        }
        write!(output, "{PROMPT}")?;
        output.flush()?;
    }

    writeln!(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use legv8_core::{CoreConfig, MemoryBus, Register, DATA_START, TEXT_START};

    use super::{
        parse_command, parse_u64, run_shell, Session, ShellCommand, ShellError, ShellReply,
        MAX_DUMP_WORDS, MAX_RUN_STEPS,
    };

    const HLT: u32 = 0xD440_0000;
    // MOVZ X1, #5; ADD X0, X0, X1; SUBS X1, X1, #1; B.NE #-8; HLT
    const COUNTDOWN: [u32; 5] = [0xD280_00A1, 0x8B01_0000, 0xF100_0421, 0x54FF_FFC1, HLT];

    fn reg(index: u8) -> Register {
        Register::new(index).expect("valid register")
    }

    fn reply_text(reply: ShellReply) -> String {
        match reply {
            ShellReply::Continue(text) => text,
            ShellReply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn parses_every_command() {
        assert_eq!(parse_command("go"), Ok(Some(ShellCommand::Go)));
        assert_eq!(parse_command("  RUN 12 "), Ok(Some(ShellCommand::Run(12))));
        assert_eq!(parse_command("rdump"), Ok(Some(ShellCommand::Rdump)));
        assert_eq!(
            parse_command("mdump 0x10000000 0x1000000c"),
            Ok(Some(ShellCommand::Mdump {
                lo: DATA_START,
                hi: DATA_START + 12
            }))
        );
        assert_eq!(
            parse_command("input x2 -7"),
            Ok(Some(ShellCommand::Input {
                reg: reg(2),
                value: -7
            }))
        );
        assert_eq!(parse_command("?"), Ok(Some(ShellCommand::Help)));
        assert_eq!(parse_command("q"), Ok(Some(ShellCommand::Quit)));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn input_accepts_hex_patterns_and_zero_register() {
        assert_eq!(
            parse_command("input XZR 0xffffffffffffffff"),
            Ok(Some(ShellCommand::Input {
                reg: Register::ZERO,
                value: -1
            }))
        );
        assert_eq!(
            parse_command("input 30 0x0040_0000"),
            Ok(Some(ShellCommand::Input {
                reg: reg(30),
                value: 0x0040_0000
            }))
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            parse_command("jump"),
            Err(ShellError::UnknownCommand("jump".to_string()))
        );
        assert!(matches!(
            parse_command("run"),
            Err(ShellError::MissingArgument { command: "run", .. })
        ));
        assert!(matches!(
            parse_command("input X32 1"),
            Err(ShellError::InvalidArgument { what: "register", .. })
        ));
        assert_eq!(
            parse_command("go now"),
            Err(ShellError::UnexpectedArgument("now".to_string()))
        );
        assert_eq!(
            parse_command("mdump 0x20 0x10"),
            Err(ShellError::InvalidRange { lo: 0x20, hi: 0x10 })
        );
        let too_wide = format!("mdump 0 {}", MAX_DUMP_WORDS * 4);
        assert!(matches!(
            parse_command(&too_wide),
            Err(ShellError::InvalidRange { .. })
        ));
    }

    #[test]
    fn number_parsing_handles_hex_and_decimal() {
        assert_eq!(parse_u64("0x400000"), Some(0x0040_0000));
        assert_eq!(parse_u64("0X1_0000"), Some(0x1_0000));
        assert_eq!(parse_u64("42"), Some(42));
        assert_eq!(parse_u64("0xg"), None);
        assert_eq!(parse_u64("+5"), None);
        assert_eq!(parse_u64("0x+1"), None);
        assert_eq!(parse_u64("0x"), None);
    }

    #[test]
    fn run_count_is_capped() {
        assert_eq!(
            parse_command(&format!("run {MAX_RUN_STEPS}")),
            Ok(Some(ShellCommand::Run(MAX_RUN_STEPS)))
        );
        assert_eq!(
            parse_command("run 18446744073709551615"),
            Err(ShellError::CountTooLarge { count: u64::MAX })
        );
    }

    #[test]
    fn run_listing_on_endless_loop_is_bounded() {
        // B #0
        let mut session = Session::from_program(&[0x1400_0000], CoreConfig::default());

        let text = reply_text(session.apply(&ShellCommand::Run(u64::MAX)));

        assert_eq!(text.lines().count() as u64, MAX_RUN_STEPS);
        assert_eq!(session.retired(), MAX_RUN_STEPS);
        assert!(!session.state().is_halted());
    }

    #[test]
    fn go_runs_program_to_halt() {
        let mut session = Session::from_program(&COUNTDOWN, CoreConfig::default());

        let text = reply_text(session.apply(&ShellCommand::Go));

        assert_eq!(text, "halted after 17 instructions\n");
        assert!(session.state().is_halted());
        assert_eq!(session.state().arch.gpr(reg(0)), 15);
        assert_eq!(session.retired(), 17);
        assert_eq!(
            reply_text(session.apply(&ShellCommand::Go)),
            "machine is halted\n"
        );
    }

    #[test]
    fn go_respects_step_limit() {
        let config = CoreConfig {
            max_steps: Some(3),
            ..CoreConfig::default()
        };
        let mut session = Session::from_program(&COUNTDOWN, config);

        let text = reply_text(session.apply(&ShellCommand::Go));

        assert_eq!(text, "stopped at step limit after 3 instructions\n");
        assert_eq!(session.state().arch.pc(), TEXT_START + 12);
    }

    #[test]
    fn run_lists_each_executed_instruction() {
        let mut session = Session::from_program(&COUNTDOWN, CoreConfig::default());

        let text = reply_text(session.apply(&ShellCommand::Run(2)));

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0x00400000:  d28000a1  MOVZ X1"));
        assert!(lines[1].starts_with("0x00400004:  8b010000  ADD X0"));
        assert_eq!(session.state().arch.gpr(reg(1)), 5);
        assert_eq!(session.retired(), 2);
    }

    #[test]
    fn run_stops_at_halt() {
        let mut session = Session::from_program(&[HLT], CoreConfig::default());

        let text = reply_text(session.apply(&ShellCommand::Run(10)));
        assert_eq!(text.lines().count(), 1);
        assert_eq!(session.retired(), 1);

        let again = reply_text(session.apply(&ShellCommand::Run(1)));
        assert_eq!(again, "machine is halted\n");
    }

    #[test]
    fn input_writes_register_but_not_xzr() {
        let mut session = Session::from_program(&[HLT], CoreConfig::default());

        let text = reply_text(session.apply(&ShellCommand::Input {
            reg: reg(4),
            value: 255,
        }));
        assert_eq!(text, "X4 = 0xff (255)\n");
        assert_eq!(session.state().arch.gpr(reg(4)), 255);

        let text = reply_text(session.apply(&ShellCommand::Input {
            reg: Register::ZERO,
            value: 9,
        }));
        assert!(text.starts_with("XZR is hard-wired"));
        assert_eq!(session.state().arch.gpr(Register::ZERO), 0);
    }

    #[test]
    fn rdump_and_mdump_render_state() {
        let mut session = Session::from_program(&COUNTDOWN, CoreConfig::default());

        let dump = reply_text(session.apply(&ShellCommand::Rdump));
        assert!(dump.contains("PC     : 0x0000000000400000"));
        assert!(dump.ends_with("Instructions retired: 0\n"));

        let words = reply_text(session.apply(&ShellCommand::Mdump {
            lo: TEXT_START,
            hi: TEXT_START + 4,
        }));
        assert_eq!(words, "0x00400000: 0xd28000a1\n0x00400004: 0x8b010000\n");
        assert_eq!(session.memory().read_word(TEXT_START + 16), HLT);
    }

    #[test]
    fn quit_ends_session() {
        let mut session = Session::from_program(&[HLT], CoreConfig::default());
        assert_eq!(session.apply(&ShellCommand::Quit), ShellReply::Quit);
    }

    #[test]
    fn shell_loop_reports_errors_and_stops_on_quit() {
        let mut session = Session::from_program(&COUNTDOWN, CoreConfig::default());
        let script = "input X0 100\nbogus\n\ngo\nquit\nrdump\n";
        let mut output = Vec::new();

        run_shell(&mut session, script.as_bytes(), &mut output).expect("in-memory io");

        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("X0 = 0x64 (100)"));
        assert!(text.contains("error: unknown command `bogus` (try `help`)"));
        assert!(text.contains("halted after 17 instructions"));
        assert!(text.ends_with("Bye.\n"));
        assert!(!text.contains("Instructions retired"));
        assert_eq!(session.state().arch.gpr(reg(0)), 115);
    }
}
