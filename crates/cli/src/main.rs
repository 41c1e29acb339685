// tabula - headless sheet operations
// Drives a Sheet from a command script and dumps values/texts grids.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use tabula_core::Position;
use tabula_engine::Sheet;
use tabula_formula::Formula;

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Spreadsheet computation core (headless driver)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply edit commands from a script file, or stdin when omitted
    #[command(after_help = "\
Script commands, one per line ('#' starts a comment):
  set <ref> <text>   write a cell (text may be a =formula)
  clear <ref>        clear a cell
  values             print the computed grid
  texts              print the raw-text grid
  size               print the printable size as rows x cols")]
    Run {
        /// Script path
        script: Option<PathBuf>,
    },

    /// Evaluate one formula against an empty sheet and print the result
    Eval {
        /// Formula text (leading = optional)
        formula: String,
    },
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Set(Position, String),
    Clear(Position),
    Values,
    Texts,
    Size,
}

/// Parse a script line. `Ok(None)` for blanks and comments.
fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim_end();
    let stripped = line.trim_start();
    if stripped.is_empty() || stripped.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match stripped.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim_start()),
        None => (stripped, ""),
    };

    match verb {
        "set" => {
            let (cell, text) = match rest.split_once(char::is_whitespace) {
                Some((cell, text)) => (cell, text),
                None if !rest.is_empty() => (rest, ""),
                _ => bail!("set needs a cell reference"),
            };
            let pos = parse_ref(cell)?;
            Ok(Some(Command::Set(pos, text.to_string())))
        }
        "clear" => {
            if rest.is_empty() {
                bail!("clear needs a cell reference");
            }
            Ok(Some(Command::Clear(parse_ref(rest)?)))
        }
        "values" => Ok(Some(Command::Values)),
        "texts" => Ok(Some(Command::Texts)),
        "size" => Ok(Some(Command::Size)),
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

fn parse_ref(text: &str) -> Result<Position> {
    Position::from_a1(text).ok_or_else(|| anyhow!("bad cell reference '{text}'"))
}

fn run_script(input: &str, out: &mut impl Write) -> Result<()> {
    let mut sheet = Sheet::new();
    for (index, line) in input.lines().enumerate() {
        let lineno = index + 1;
        let command = parse_command(line).with_context(|| format!("line {lineno}"))?;
        match command {
            None => {}
            Some(Command::Set(pos, text)) => sheet
                .set_cell(pos, &text)
                .with_context(|| format!("line {lineno}: set {pos}"))?,
            Some(Command::Clear(pos)) => sheet
                .clear_cell(pos)
                .with_context(|| format!("line {lineno}: clear {pos}"))?,
            Some(Command::Values) => {
                let mut grid = String::new();
                sheet.write_values(&mut grid)?;
                out.write_all(grid.as_bytes())?;
            }
            Some(Command::Texts) => {
                let mut grid = String::new();
                sheet.write_texts(&mut grid)?;
                out.write_all(grid.as_bytes())?;
            }
            Some(Command::Size) => {
                let size = sheet.printable_size();
                writeln!(out, "{}x{}", size.rows, size.cols)?;
            }
        }
    }
    Ok(())
}

fn eval_formula(formula: &str) -> Result<()> {
    let expr = formula.strip_prefix('=').unwrap_or(formula);
    let parsed = Formula::parse(expr)?;
    let sheet = Sheet::new();
    println!("{}", parsed.evaluate(&sheet));
    Ok(())
}

fn run() -> Result<()> {
    match Cli::parse().command {
        Commands::Run { script } => {
            let input = match script {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    io::stdin().read_to_string(&mut buffer).context("reading stdin")?;
                    buffer
                }
            };
            let stdout = io::stdout();
            run_script(&input, &mut stdout.lock())
        }
        Commands::Eval { formula } => eval_formula(&formula),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("tabula: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a1(name: &str) -> Position {
        Position::from_a1(name).unwrap()
    }

    #[test]
    fn test_parse_blank_and_comment() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# note").unwrap(), None);
    }

    #[test]
    fn test_parse_set_keeps_text_verbatim() {
        assert_eq!(
            parse_command("set B2 =A1 + 1").unwrap(),
            Some(Command::Set(a1("B2"), "=A1 + 1".to_string()))
        );
        // No text clears the cell content
        assert_eq!(
            parse_command("set B2").unwrap(),
            Some(Command::Set(a1("B2"), String::new()))
        );
    }

    #[test]
    fn test_parse_clear_and_queries() {
        assert_eq!(parse_command("clear C3").unwrap(), Some(Command::Clear(a1("C3"))));
        assert_eq!(parse_command("values").unwrap(), Some(Command::Values));
        assert_eq!(parse_command("texts").unwrap(), Some(Command::Texts));
        assert_eq!(parse_command("size").unwrap(), Some(Command::Size));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_command("set").is_err());
        assert!(parse_command("clear").is_err());
        assert!(parse_command("set 12 x").is_err());
        assert!(parse_command("frobnicate A1").is_err());
    }

    #[test]
    fn test_run_script_end_to_end() {
        let script = "\
set A1 5
set B1 =A1*2
values
size
clear A1
values
";
        let mut out = Vec::new();
        run_script(script, &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        // After the clear, B1 recomputes against an empty A1.
        assert_eq!(printed, "5\t10\n1x2\n\t0\n");
    }

    #[test]
    fn test_run_script_reports_line_numbers() {
        let mut out = Vec::new();
        let err = run_script("set A1 1\nset A1 =A1\n", &mut out).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
