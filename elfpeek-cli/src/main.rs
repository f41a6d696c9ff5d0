mod report;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use elfpeek_core::{Binary, DecodeError, DecodeOptions, Tables};

use report::Selection;

/// Exit status for input that could not be decoded as ELF.
const EXIT_DECODE: u8 = 3;

/// Read-only ELF header inspector
#[derive(Parser)]
#[command(
    name = "elfpeek",
    about = "Decode ELF identification, file header and program/section header tables",
    version,
    author
)]
struct Cli {
    /// Path to the ELF file
    #[arg(required = true)]
    path: std::path::PathBuf,

    /// Fail on unrecognized file types and machines
    #[arg(long)]
    strict: bool,

    /// Accept OS/ABI values other than System V
    #[arg(long = "any-abi")]
    any_abi: bool,

    /// Also list NULL table entries
    #[arg(long)]
    all: bool,

    /// Emit JSON instead of tables
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Show the identification block and file header
    Header,
    /// List program headers (segments)
    Segments,
    /// List section headers
    Sections,
}

impl Cli {
    fn options(&self) -> DecodeOptions {
        DecodeOptions {
            strict: self.strict,
            allow_foreign_abi: self.any_abi,
        }
    }

    /// Tables the selection needs; the rest are never decoded.
    fn tables(&self) -> Tables {
        let sel = self.selection();
        Tables {
            program: sel.segments,
            section: sel.sections,
        }
    }

    fn selection(&self) -> Selection {
        let only = |c: Command| self.command.is_none_or(|cmd| cmd == c);
        Selection {
            header: only(Command::Header),
            segments: only(Command::Segments),
            sections: only(Command::Sections),
            show_null: self.all,
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let options = cli.options();
    let sel = cli.selection();
    log::debug!("decoding with {options:?}, showing {sel:?}");

    let buf = elfpeek_core::read_file(&cli.path)?;
    let bin = Binary::decode_only(&buf, &options, cli.tables())
        .with_context(|| format!("cannot decode {}", cli.path.display()))?;

    if cli.json {
        println!("{}", report::render_json(&bin, &sel)?);
    } else {
        print!("{}", report::render_text(&bin, &sel));
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            if err.downcast_ref::<DecodeError>().is_some() {
                ExitCode::from(EXIT_DECODE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
