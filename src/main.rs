use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clickcmds::logging::{self, LogTarget};
use clickcmds::panel::parse_selection;
use clickcmds::{
    ConfigStore, Dispatcher, InitStatus, Notice, OutputSink, Panel, PanelMessage, PanelView,
    Preferences, Reaction, ShellTerminals, Workspace,
};

#[derive(Parser, Debug)]
#[command(name = "clickcmds")]
#[command(author, version, about = "Run project commands from a .cmmds file")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Workspace root (default: nearest folder with a .cmmds, else the current folder)
    #[arg(long, global = true, env = "CLICKCMDS_ROOT")]
    root: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the command panel (default)
    Panel,

    /// Run a command by name, or pick one from a list
    Run {
        /// Command name
        name: Option<String>,
    },

    /// Re-read .cmmds and print what the panel would show
    Refresh,

    /// List the effective commands
    List {
        /// Print the merged configuration as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a temporary override for a command; a blank value removes it
    Override {
        /// Command name
        name: String,
        /// Command line to run instead
        value: Option<String>,
    },

    /// Choose where commands run until the overlay is cleared
    Mode {
        #[arg(value_enum)]
        mode: RunMode,
    },

    /// Remove every temporary override and setting
    ClearOverlay,

    /// Open .cmmds in $VISUAL or $EDITOR
    OpenConfig,

    /// Create a sample .cmmds if there is none
    Init,

    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum RunMode {
    /// Reuse the foreground session
    Current,
    /// Start a new session for every run
    New,
}

fn main() {
    let cli = Cli::parse();

    let target = match cli.command {
        None | Some(Command::Panel) => LogTarget::File(logging::default_log_file()),
        _ => LogTarget::Stderr,
    };
    logging::init(cli.verbose, target);

    let start = cli
        .root
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let prefs = Preferences::load_from(&start);
    let workspace = Workspace::discover(cli.root.as_deref(), &prefs.file.name);
    let store = ConfigStore::new(workspace, prefs.file.name.clone());
    let dispatcher = Dispatcher::from_preferences(&prefs);

    let code = match cli.command.unwrap_or(Command::Panel) {
        Command::Panel => {
            let terminals = ShellTerminals::new(OutputSink::LogDir(session_log_dir()));
            match clickcmds::tui::run(Panel::new(store, dispatcher, terminals)) {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("{} {}", "Error:".red(), e);
                    1
                }
            }
        }
        Command::Run { name } => {
            let mut panel = Panel::new(store, dispatcher, ShellTerminals::new(OutputSink::Inherit));
            let code = match name.or_else(|| pick_command(&panel.render())) {
                Some(name) => report(panel.handle(PanelMessage::Run { name })),
                None => 1,
            };
            // Let the shells finish so their output lands before we exit
            panel.terminals_mut().wait_all();
            code
        }
        Command::Refresh => {
            let mut panel = cli_panel(store, dispatcher);
            report(panel.handle(PanelMessage::Refresh))
        }
        Command::List { json } => {
            let effective = store.effective();
            if json {
                match serde_json::to_string_pretty(&effective) {
                    Ok(text) => {
                        println!("{}", text);
                        0
                    }
                    Err(e) => {
                        eprintln!("{} {}", "Error:".red(), e);
                        1
                    }
                }
            } else {
                let width = effective.commands.keys().map(|n| n.len()).max().unwrap_or(0);
                for (name, command) in &effective.commands {
                    println!("{:<width$}  {}", name, command, width = width);
                }
                0
            }
        }
        Command::Override { name, value } => {
            let mut panel = cli_panel(store, dispatcher);
            report(panel.handle(PanelMessage::SetOverride {
                name,
                value: value.unwrap_or_default(),
            }))
        }
        Command::Mode { mode } => {
            let mut panel = cli_panel(store, dispatcher);
            report(panel.handle(PanelMessage::ToggleMode {
                value: mode == RunMode::Current,
            }))
        }
        Command::ClearOverlay => {
            let mut panel = cli_panel(store, dispatcher);
            report(panel.handle(PanelMessage::ClearOverlay))
        }
        Command::OpenConfig => {
            let mut panel = cli_panel(store, dispatcher);
            report(panel.handle(PanelMessage::OpenConfig))
        }
        Command::Init => match clickcmds::init::init_project(&store) {
            Ok(InitStatus::NoWorkspace) => 1,
            Ok(_) => 0,
            Err(e) => {
                eprintln!("{} {}", "Error:".red(), e);
                1
            }
        },
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "clickcmds", &mut io::stdout());
            0
        }
    };

    std::process::exit(code);
}

fn cli_panel(store: ConfigStore, dispatcher: Dispatcher) -> Panel<ShellTerminals> {
    Panel::new(store, dispatcher, ShellTerminals::new(OutputSink::Inherit))
}

/// Session logs for the panel, one folder per process
fn session_log_dir() -> PathBuf {
    std::env::temp_dir().join(format!("clickcmds-sessions-{}", std::process::id()))
}

/// Show a panel reaction on the console and turn it into an exit code
fn report(reaction: Reaction) -> i32 {
    match reaction {
        Reaction::Render(view, notice) => {
            print_view(&view);
            notice.map(print_notice).unwrap_or(0)
        }
        Reaction::Notify(notice) => print_notice(notice),
        Reaction::OpenEditor(path) => match clickcmds::editor::open_in_editor(&path) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{} {}", "Error:".red(), e);
                1
            }
        },
    }
}

fn print_notice(notice: Notice) -> i32 {
    match notice {
        Notice::Info(text) => {
            eprintln!("{}", text.green());
            0
        }
        Notice::Warning(text) => {
            eprintln!("{} {}", "Warning:".yellow(), text);
            1
        }
        Notice::Error(text) => {
            eprintln!("{} {}", "Error:".red(), text);
            1
        }
    }
}

fn print_view(view: &PanelView) {
    let path = view
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "no workspace".to_string());
    let mode = if view.run_in_current_terminal {
        "current terminal"
    } else {
        "new terminals"
    };
    println!("{} {} ({})", "Commands from".bold(), path, mode);

    if view.rows.is_empty() {
        println!("  {}", "No commands found".dimmed());
        return;
    }

    let width = view.rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for row in &view.rows {
        let name = format!("{:<width$}", row.name, width = width);
        if row.is_overridden() {
            let base = row
                .base
                .as_deref()
                .map(|b| format!("  (base: {})", b))
                .unwrap_or_default();
            println!("{} {}  {}{}", "*".yellow(), name.cyan(), row.command.yellow(), base.dimmed());
        } else {
            println!("  {}  {}", name.cyan(), row.command);
        }
    }
}

/// Print a numbered list and read the user's choice from stdin
fn pick_command(view: &PanelView) -> Option<String> {
    let names = view.names();
    if names.is_empty() {
        eprintln!("{} No commands found", "Warning:".yellow());
        return None;
    }

    for (i, row) in view.rows.iter().enumerate() {
        eprintln!("  {:>2}) {}  {}", i + 1, row.name.cyan(), row.command.dimmed());
    }
    eprint!("Command to run: ");
    let _ = io::stderr().flush();

    let mut answer = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut answer) {
        eprintln!("{} {}", "Error:".red(), e);
        return None;
    }

    match parse_selection(&answer, &names) {
        Some(name) => Some(name.to_string()),
        None => {
            if !answer.trim().is_empty() {
                eprintln!("{} No such command: {}", "Warning:".yellow(), answer.trim());
            }
            None
        }
    }
}
