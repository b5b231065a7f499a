// src/bin/goimpl.rs

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

use goimpl::fs::parse_overlay_archive;
use goimpl::{BuildContext, Error, Implementer, Options, Position};

/// Leaves the timestamp column out of log lines.
struct NoTimestamp;

impl FormatTime for NoTimestamp {
    fn format_time(&self, _w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        Ok(())
    }
}

/// goimpl generates method stubs for RECV to implement IFACE.
#[derive(Parser, Debug)]
#[command(name = "goimpl", version, long_about = None)]
#[command(after_help = "Examples:\n\n  goimpl 'f *File' io.Reader\n  goimpl Murmur hash.Hash\n  goimpl --dir $GOPATH/src/github.com/acme/murmur Murmur hash.Hash\n\nDon't forget the single quotes around the receiver type\nto prevent shell globbing.")]
struct Cli {
    /// Package source directory, useful for vendored code
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Include interface comments in the generated stubs
    #[arg(
        long,
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true"
    )]
    comments: bool,

    /// Package name of the receiver
    #[arg(long, value_name = "NAME")]
    recvpkg: Option<String>,

    /// File to write to instead of stdout
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: Option<PathBuf>,

    /// Update the receiver's file in place (see -p for the insertion point)
    #[arg(short = 'u', long = "update")]
    update: bool,

    /// file:line[:col] to insert the stubs at; defaults to just after the
    /// receiver type's declaration
    #[arg(short = 'p', long = "pos", value_name = "POS")]
    pos: Option<String>,

    /// Read an overlay archive of unsaved files from stdin
    #[arg(long)]
    modified: bool,

    /// Receiver expression, e.g. 'f *File'
    recv: String,

    /// Interface reference, e.g. io.Reader or net/http.Handler
    iface: String,
}

fn main() -> ExitCode {
    // Initialize tracing if GOIMPL_LOG is set
    if let Ok(filter) = EnvFilter::try_from_env("GOIMPL_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_timer(NoTimestamp)
            .with_span_events(FmtSpan::CLOSE)
            .compact()
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();
    if cli.out.is_some() && cli.update {
        eprintln!("Please specify only -u (update in-place) or -o (output file).");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            if let Error::Format { source_text, .. } = &err {
                eprintln!("--- generated source ---\n{source_text}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> goimpl::Result<()> {
    let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
    let dir = match cli.dir {
        Some(dir) => absolute(&cwd, &dir),
        None => cwd.clone(),
    };

    let mut implementer = Implementer::new(BuildContext::from_env());
    if cli.modified {
        let mut archive = Vec::new();
        std::io::stdin()
            .read_to_end(&mut archive)
            .map_err(|e| Error::io("<stdin>", e))?;
        let files = parse_overlay_archive(&archive)?
            .into_iter()
            .map(|(path, text)| (absolute(&cwd, &path), text))
            .collect();
        implementer = implementer.with_overlay(files);
    }

    let opts = Options {
        dir: dir.clone(),
        recv_pkg: cli.recvpkg,
        comments: cli.comments.into(),
    };

    let mut out = cli.out;
    let mut pos = match cli.pos {
        Some(spec) => {
            let mut p: Position = spec.parse()?;
            p.file = absolute(&cwd, &p.file);
            Some(p)
        }
        None => None,
    };
    if cli.update {
        let decl_end = implementer.receiver_position(&cli.recv, &dir)?;
        out = Some(decl_end.file.clone());
        pos.get_or_insert(decl_end);
    }

    let src = match &pos {
        None => implementer.generate(&cli.recv, &cli.iface, &opts)?,
        Some(p) => implementer.generate_for_position(&cli.recv, &cli.iface, &opts, p)?,
    };

    match out.filter(|o| o.as_os_str() != "-") {
        Some(path) => std::fs::write(&path, src).map_err(|e| Error::io(path, e)),
        None => std::io::stdout()
            .write_all(src.as_bytes())
            .map_err(|e| Error::io("<stdout>", e)),
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    goimpl::fs::clean(&cwd.join(path))
}
