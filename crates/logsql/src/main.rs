//! logsql CLI - SQL shell for CSV files and text logs

use clap::Parser;
use logsql::cli::write_result;
use logsql::repl::{banner, EditorSource, ReaderSource};
use logsql::{Config, OutputFormat, Renderer, Repl, Session};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use tracing::debug;

const AFTER_HELP: &str = r#"FILES:
  *.csv          First row is the header; columns keep their header names
  anything else  No header; fields split on whitespace, columns are $1, $2, ...

EXAMPLES:
  logsql waf_log.csv
  logsql access.log --sep '\t'
  logsql waf_log.csv -e "SELECT URL FROM current WHERE 风险级别='高'"
  logsql access.log -f json -e "SELECT $1, COUNT(*) AS n FROM current GROUP BY $1"

Inside the shell, end SQL statements with ';' and type .help for commands."#;

#[derive(Parser)]
#[command(name = "logsql")]
#[command(about = "Query a CSV file or text log with SQL as the table 'current'")]
#[command(version)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// CSV or delimited text file to load
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Field separator: a character (',', '\t', '|'), '\s+' for whitespace, or a regex
    #[arg(short = 's', long = "sep", value_name = "DELIM")]
    sep: Option<String>,

    /// Run one SQL statement, print the result and exit
    #[arg(short = 'e', long = "execute", value_name = "SQL")]
    execute: Option<String>,

    /// Output format for --execute
    #[arg(short = 'f', long = "format", value_enum, default_value = "table")]
    format: OutputFormat,

    /// Wrap tables at this many columns instead of the terminal width
    #[arg(short = 'w', long = "max-width", value_name = "COLS")]
    max_width: Option<u16>,

    /// Enable verbose/debug output on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("logsql=debug")
            .with_writer(io::stderr)
            .init();
    }

    install_interrupt_handler()?;

    let config = Config::new(cli.file, cli.sep.as_deref(), cli.max_width)?;
    debug!(
        path = %config.path.display(),
        header = ?config.header_mode(),
        delimiter = %config.effective_delimiter(),
        "loading file"
    );
    let (session, report) = Session::open(&config.path, config.delimiter.clone())?;
    let renderer = Renderer::new(config.max_width);

    if let Some(sql) = cli.execute {
        let sql = sql.trim().trim_end_matches(';');
        let result = session.query(sql)?;
        write_result(&mut io::stdout().lock(), &result, session.columns(), cli.format, &renderer)?;
        return Ok(());
    }

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();

    if interactive {
        println!("{}", banner(&session));
    }
    if let Some(notice) = report.notice() {
        println!("{}", notice);
    }

    if interactive {
        let color = io::stdout().is_terminal();
        let mut repl = Repl::new(session, EditorSource::new()?, io::stdout(), renderer).with_color(color);
        repl.run()?;
    } else {
        let mut repl = Repl::new(session, ReaderSource::new(stdin.lock()), io::stdout(), renderer);
        repl.run()?;
    }

    Ok(())
}

/// Ctrl-C outside the line editor (a running query, piped input) flushes what
/// was printed and exits cleanly.
fn install_interrupt_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        io::stdout().flush().ok();
        std::process::exit(0);
    })?;
    Ok(())
}
