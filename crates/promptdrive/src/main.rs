use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use promptdrive::app::command::{self, DriveError};
use promptdrive::app::drive::{PromptDrive, default_user_path};
use promptdrive::app::event::DriveEvent;
use promptdrive::app::settings::SettingsStore;
use promptdrive::app::workspace::resolve_workspace;
use promptdrive::domain::entry::{Entry, EntryKind, EntryView, RootKind};
use promptdrive::infra::config::{JsonConfigStore, default_settings_path};
use promptdrive::infra::git::RealGitClient;
use tracing::Level;

/// Guards `tree` against symlink cycles.
const MAX_TREE_DEPTH: usize = 32;

#[derive(Parser)]
#[command(
    name = "promptdrive",
    version,
    about = "Browse and manage prompt files across user, repository, and workspace drives"
)]
struct Cli {
    /// Workspace folder; defaults to the current directory.
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// User drive directory; defaults to `~/.promptDrive`.
    #[arg(long, global = true)]
    user_dir: Option<PathBuf>,

    /// Settings file; defaults to `<config dir>/promptdrive/settings.json`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Print every visible root with its folders and prompts.
    Tree,
    /// List the children of a drive directory, or the visible roots.
    Ls {
        path: Option<PathBuf>,

        /// Print entries as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create an empty prompt file.
    NewPrompt {
        name: String,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Create a folder.
    NewFolder {
        name: String,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Delete a prompt or folder.
    Rm {
        path: PathBuf,

        /// Skip the confirmation question.
        #[arg(long)]
        yes: bool,
    },
    /// Print the content of a prompt.
    Cat { path: PathBuf },
    /// Print the effective drive settings.
    Settings,
}

#[derive(Args)]
struct TargetArgs {
    /// Drive directory to create in.
    #[arg(long = "in", conflicts_with = "root")]
    directory: Option<PathBuf>,

    /// Drive root to create in.
    #[arg(long, value_enum)]
    root: Option<RootArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RootArg {
    User,
    Repository,
    Workspace,
}

impl From<RootArg> for RootKind {
    fn from(root: RootArg) -> Self {
        match root {
            RootArg::User => Self::User,
            RootArg::Repository => Self::Repository,
            RootArg::Workspace => Self::Workspace,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::WARN)
        .init();

    let cli = Cli::parse();
    if let Err(message) = run(cli).await {
        let _ = writeln!(io::stderr(), "Error: {message}");

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), String> {
    let config_path = cli.config.clone().unwrap_or_else(default_settings_path);
    let drive = activate(&cli, config_path.clone()).await?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        CliCommand::Tree => write_tree(&drive, None, 0, &mut stdout).map_err(|e| e.to_string()),
        CliCommand::Ls { path, json } => {
            let node = path.map(|path| locate(&drive, &path)).transpose()?;
            let children = drive.get_children(node.as_ref());

            write_listing(&children, json, &mut stdout)
        }
        CliCommand::NewPrompt { name, target } => {
            let directory = target_directory(&drive, &target)?;
            let path = command::create_prompt(&directory, &name).map_err(|e| e.to_string())?;
            drive.refresh();

            writeln!(stdout, "{}", path.display()).map_err(|e| e.to_string())
        }
        CliCommand::NewFolder { name, target } => {
            let directory = target_directory(&drive, &target)?;
            let path = command::create_folder(&directory, &name).map_err(|e| e.to_string())?;
            drive.refresh();

            writeln!(stdout, "{}", path.display()).map_err(|e| e.to_string())
        }
        CliCommand::Rm { path, yes } => {
            let entry = locate(&drive, &path)?;
            if !yes && !confirm_delete(&entry, &mut stdout).map_err(|e| e.to_string())? {
                return writeln!(stdout, "Cancelled").map_err(|e| e.to_string());
            }

            command::delete_entry(&entry).map_err(|e| e.to_string())?;
            drive.refresh();

            writeln!(stdout, "Deleted {}", entry.path.display()).map_err(|e| e.to_string())
        }
        CliCommand::Cat { path } => {
            let entry = locate(&drive, &path)?;
            if !matches!(entry.kind, EntryKind::File { .. }) {
                return Err(format!("`{}` is not a prompt file", path.display()));
            }

            let content = command::read_prompt(&entry.path).map_err(|e| e.to_string())?;

            write!(stdout, "{content}").map_err(|e| e.to_string())
        }
        CliCommand::Settings => {
            let settings = drive.settings().settings();

            writeln!(
                stdout,
                "settingsFile: {}\nenableUserPromptDrive: {}\nuseRepositoryPromptDrive: {}",
                config_path.display(),
                settings.enable_user_drive,
                settings.use_repository_drive
            )
            .map_err(|e| e.to_string())
        }
    }
}

/// Provisions the user drive and resolves roots for the workspace folder.
async fn activate(cli: &Cli, config_path: PathBuf) -> Result<PromptDrive, String> {
    let user_dir = cli.user_dir.clone().unwrap_or_else(default_user_path);
    std::fs::create_dir_all(&user_dir).map_err(|error| {
        format!("Failed to create user drive `{}`: {error}", user_dir.display())
    })?;

    let settings = Arc::new(SettingsStore::new(Arc::new(JsonConfigStore::new(
        config_path,
    ))));
    let mut drive = PromptDrive::new(settings, host_path(&user_dir));

    let folder = cli
        .workspace
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .map(|folder| host_path(&folder));
    let roots = resolve_workspace(folder, &RealGitClient::new()).await;
    drive.dispatch(DriveEvent::WorkspaceResolved(roots));

    Ok(drive)
}

/// Makes a user-supplied path absolute and resolves symlinks where the path
/// (or its parent) exists, so it compares equal to git-reported paths.
fn host_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    if cfg!(windows) {
        return absolute;
    }

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => std::fs::canonicalize(parent)
            .map_or_else(|_| absolute.clone(), |parent| parent.join(name)),
        _ => absolute,
    }
}

/// Resolves a user-supplied path to a drive entry.
fn locate(drive: &PromptDrive, path: &Path) -> Result<Entry, String> {
    drive
        .locate(&host_path(path))
        .ok_or_else(|| format!("`{}` is not a prompt drive entry", path.display()))
}

/// Picks the directory a new prompt or folder is created in.
fn target_directory(drive: &PromptDrive, target: &TargetArgs) -> Result<PathBuf, String> {
    if let Some(directory) = &target.directory {
        let entry = locate(drive, directory)?;
        if !entry.is_directory() {
            return Err(format!("`{}` is not a folder", directory.display()));
        }

        return Ok(entry.path);
    }

    if let Some(root) = target.root {
        let kind = RootKind::from(root);

        return drive
            .visible_root_path(kind)
            .map(Path::to_path_buf)
            .ok_or_else(|| format!("The {} drive is not available", kind.label()));
    }

    drive
        .target_directory(None)
        .ok_or_else(|| DriveError::NoTargetRoot.to_string())
}

/// Asks on stdin whether `entry` should be deleted.
fn confirm_delete(entry: &Entry, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "Are you sure you want to delete {}? [y/N] ", entry.label())?;
    out.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();

    Ok(answer == "y" || answer == "yes")
}

/// Prints `node`'s subtree with two-space indentation per level.
fn write_tree(
    drive: &PromptDrive,
    node: Option<&Entry>,
    depth: usize,
    out: &mut impl Write,
) -> io::Result<()> {
    if depth > MAX_TREE_DEPTH {
        return Ok(());
    }

    for child in drive.get_children(node) {
        writeln!(out, "{}{}", "  ".repeat(depth), entry_line(&child))?;
        if child.is_directory() {
            write_tree(drive, Some(&child), depth + 1, out)?;
        }
    }

    Ok(())
}

/// Prints one listing level as text lines or a JSON array.
fn write_listing(entries: &[Entry], json: bool, out: &mut impl Write) -> Result<(), String> {
    if json {
        let views: Vec<EntryView> = entries.iter().map(EntryView::from).collect();
        let text = serde_json::to_string_pretty(&views).map_err(|e| e.to_string())?;

        return writeln!(out, "{text}").map_err(|e| e.to_string());
    }

    for entry in entries {
        writeln!(out, "{}", entry_line(entry)).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Formats an entry as `label  description`, marking folders with `/`.
fn entry_line(entry: &Entry) -> String {
    let label = match entry.kind {
        EntryKind::Directory => format!("{}/", entry.label()),
        EntryKind::Root(_) | EntryKind::File { .. } => entry.label(),
    };

    match entry.description() {
        Some(description) => format!("{label}  {description}"),
        None => label,
    }
}
