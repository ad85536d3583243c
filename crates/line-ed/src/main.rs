use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use line_ed_config::EditorConfig;
use line_ed_core::{io, Command, Script, SearchOptions, Session};

/// Edit a file with ed-style line commands.
#[derive(Parser, Debug)]
#[command(name = "line-ed", version, about)]
struct Cli {
    /// File to edit.
    file: PathBuf,

    /// Command to run; repeatable. Runs after any script file.
    #[arg(short = 'e', long = "command", value_name = "CMD", allow_hyphen_values = true)]
    commands: Vec<String>,

    /// Script file with one command per line.
    #[arg(short, long, value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Run the commands without writing the file back.
    #[arg(long)]
    dry_run: bool,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Script file commands first, then `-e` commands in order.
    fn build_script(&self) -> Result<Script> {
        let mut script = match &self.script {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read script: {}", path.display()))?;
                Script::parse(&text)
                    .with_context(|| format!("failed to parse script: {}", path.display()))?
            }
            None => Script::default(),
        };
        for cmd in &self.commands {
            let command = cmd
                .parse::<Command>()
                .with_context(|| format!("invalid command: {cmd}"))?;
            script.push(command);
        }
        Ok(script)
    }
}

fn search_options(config: &EditorConfig) -> SearchOptions {
    SearchOptions {
        query: String::new(),
        use_regex: config.search.use_regex,
        case_sensitive: config.search.case_sensitive,
        whole_word: config.search.whole_word,
    }
}

fn run(cli: &Cli, config: &EditorConfig, out: &mut impl Write) -> Result<()> {
    let script = cli.build_script()?;
    let buffer = io::load(&cli.file)?;
    tracing::info!(
        "Running {} commands on {}",
        script.len(),
        cli.file.display()
    );

    let mut session = Session::new(search_options(config), config.print_count);
    let buffer = session.run(buffer, &script, &mut *out)?;
    out.flush().context("failed to flush output")?;

    if cli.dry_run || !config.save_after_script {
        tracing::info!("Leaving {} unchanged", cli.file.display());
        return Ok(());
    }
    if config.backup_on_save {
        let backup = io::save_with_backup(&buffer)?;
        tracing::info!("Backup written to {}", backup.display());
    } else {
        io::save(&buffer)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for printed lines
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(EditorConfig::config_path);
    let config = EditorConfig::load_or_create(&config_path);

    run(&cli, &config, &mut std::io::stdout().lock())
}
