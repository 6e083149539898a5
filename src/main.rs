//! gitradar - where did each changed file get to?

use std::io::{self, Write};
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    event,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use gitradar::cli::{run_summary, SummaryOptions};
use gitradar::core::{
    Config, EnvironmentSource, GitCli, GitQuery, RepoError, RepoRoot, StageAnalyzer,
    StaticEnvironments,
};
use gitradar::logging::{self, LogTarget};
use gitradar::ui::{handle_input, render, App};

/// Shows which lifecycle stage each changed file has reached.
#[derive(Parser, Debug)]
#[command(name = "gitradar", version, about)]
struct Cli {
    /// Repository directory
    #[arg(short = 'd', long = "dir", value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Integration branch on the main remote
    #[arg(long = "main", value_name = "BRANCH")]
    main_branch: Option<String>,

    /// Development branch on the dev remote
    #[arg(long = "dev", value_name = "BRANCH")]
    dev_branch: Option<String>,

    /// Remote holding the integration branch
    #[arg(long = "main-remote", value_name = "REMOTE")]
    main_remote: Option<String>,

    /// Remote holding the development branch
    #[arg(long = "dev-remote", value_name = "REMOTE")]
    dev_remote: Option<String>,

    /// Deployed version of an environment, as name=version (repeatable)
    #[arg(short = 'e', long = "environment", value_name = "NAME=VERSION")]
    environments: Vec<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seconds before a git query is abandoned (0 disables)
    #[arg(long = "timeout", value_name = "SECS")]
    timeout: Option<u64>,

    /// Echo every git command
    #[arg(short = 'D', long = "debug")]
    debug: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write logs to this file while the TUI runs
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Fetch from the remotes before analyzing
    #[arg(long = "fetch")]
    fetch: bool,

    /// Print per-stage counts instead of starting the TUI
    #[arg(long = "summary")]
    summary: bool,

    /// Print the summary as JSON
    #[arg(long = "json", requires = "summary")]
    json: bool,

    /// Inspect the files touched by these commits (summary mode)
    #[arg(long = "commits", value_name = "COMMIT", num_args = 1.., requires = "summary")]
    commits: Vec<String>,

    /// Inspect a branch against the integration head (summary mode)
    #[arg(long = "branch", value_name = "BRANCH", requires = "summary")]
    branch: Option<String>,

    /// Color theme (default, light, mono, or a user theme)
    #[arg(short = 't', long = "theme", value_name = "THEME")]
    theme: Option<String>,
}

/// RAII guard for terminal state. Restores terminal on drop (including panic).
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
        let _ = io::stdout().flush();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    gitradar::metrics::init();

    let target = if cli.summary {
        LogTarget::Stderr
    } else {
        cli.log_file
            .clone()
            .map(LogTarget::File)
            .unwrap_or(LogTarget::Off)
    };
    if let Err(e) = logging::init(cli.verbose, target) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Merge the config file with command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    if let Some(branch) = &cli.main_branch {
        config.main_branch = branch.clone();
    }
    if let Some(branch) = &cli.dev_branch {
        config.dev_branch = branch.clone();
    }
    if let Some(remote) = &cli.main_remote {
        config.main_remote = remote.clone();
    }
    if let Some(remote) = &cli.dev_remote {
        config.dev_remote = remote.clone();
    }
    if let Some(secs) = cli.timeout {
        config.query_timeout_secs = secs;
    }
    if cli.debug {
        config.verbose = true;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;

    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let repo = match RepoRoot::discover(&dir) {
        Ok(repo) => repo,
        Err(RepoError::NotARepo) => {
            eprintln!("Error: Not inside a git repository");
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e).context("Failed to open repository"),
    };
    tracing::info!(root = %repo.path().display(), "repository");

    let git: Arc<dyn GitQuery> = Arc::new(GitCli::new(repo, config.query_config()));
    if cli.fetch {
        fetch(git.as_ref(), &config.main_remote);
    }

    let mut environments = config.environments();
    environments.merge(StaticEnvironments::from_pairs(&cli.environments));
    let environments: Option<Arc<dyn EnvironmentSource>> = if environments.is_empty() {
        None
    } else {
        Some(Arc::new(environments))
    };

    let analyzer = StageAnalyzer::new(git, config.analyzer_config());

    if cli.summary {
        let env_index = gitradar::core::EnvironmentIndex::build(
            environments.as_deref(),
            &analyzer.resolver(),
        );
        let opts = SummaryOptions {
            verbose: cli.verbose > 0,
            json: cli.json,
            commits: cli.commits,
            branch: cli.branch,
        };
        return Ok(run_summary(&analyzer, &env_index, &opts));
    }

    run_tui(analyzer, environments, cli.theme)?;
    Ok(ExitCode::SUCCESS)
}

/// Best-effort refresh of remote-tracking refs.
fn fetch(git: &dyn GitQuery, main_remote: &str) {
    let _timer = gitradar::metrics::Timer::start("fetch");
    for args in [vec!["fetch"], vec!["fetch", main_remote]] {
        let out = git.run("fetch", &args);
        if !out.success {
            tracing::warn!(args = ?args, "fetch failed, continuing with local refs");
        }
    }
}

/// Run the TUI application.
fn run_tui(
    analyzer: StageAnalyzer,
    environments: Option<Arc<dyn EnvironmentSource>>,
    theme: Option<String>,
) -> Result<()> {
    // Restore the terminal before the default hook prints the panic.
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
        let _ = io::stdout().flush();
        default_hook(info);
    }));

    let mut app = App::new(analyzer, environments, theme.as_deref())?;

    let _guard = TerminalGuard::new().context("Failed to set up terminal")?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    run_loop(&mut terminal, &mut app)
}

fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.poll_worker();

        if app.ui.dirty {
            terminal.draw(|frame| render(frame, app))?;
            app.clear_dirty();
        }

        if event::poll(Duration::from_millis(50))? {
            let event = event::read()?;

            if matches!(event, crossterm::event::Event::Resize(_, _)) {
                app.mark_dirty();
            }

            handle_input(app, event);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
