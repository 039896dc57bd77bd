// sheetcraft - replay edit scripts against a sheet from the command line

mod exit_codes;
mod render;
mod script;

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sheetcraft_config::{KeybindingManager, Settings};
use sheetcraft_engine::document::{Clock, SystemClock};
use sheetcraft_engine::events::{SaveCallback, SaveEvent};
use sheetcraft_engine::layout::LayoutConfig;
use sheetcraft_engine::template::{SeedOptions, Template};
use sheetcraft_engine::{SheetConfig, SheetDocument, SheetError};

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_SCRIPT, EXIT_SUCCESS, EXIT_USAGE};
use script::{Runner, ScriptError};

#[derive(Parser)]
#[command(name = "sheetcraft")]
#[command(about = "Spreadsheet editing core, driven from scripts")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Settings file (default: config dir/sheetcraft/settings.json)
    #[arg(long, global = true, env = "SHEETCRAFT_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a template and replay an edit script (file, or stdin when omitted or "-")
    #[command(after_help = "\
Script commands (one per line, # comments):
  select A1 | set A1 <text> | key ctrl+z | insert-row | delete-rows 1,3
  insert-column <type> | delete-column <name> | type A1 <type>
  column-type <name> <type> | rename <name> <new> | move <name> <target>
  resize <name> <px> | autosize <name> | wrap <name> | protect
  format <bold|italic|underline|strikethrough> on|off
  format <font-size|text-color|bg-color|align> <value>
  eval <formula> | undo | redo | copy | cut | paste | template <name> | show")]
    Run {
        /// Script path
        script: Option<PathBuf>,

        /// Template to seed from: budget, timeline, inventory, blank
        #[arg(long, short = 't', default_value = "blank")]
        template: String,

        /// Write the current snapshot here after every change
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// Stop at the first rejected edit
        #[arg(long)]
        strict: bool,

        /// Keybindings file (default: config dir/sheetcraft/keybindings.json)
        #[arg(long)]
        keybindings: Option<PathBuf>,

        /// Do not print the final grid
        #[arg(long)]
        no_show: bool,
    },

    /// Evaluate a formula against a template's seed data
    Eval {
        formula: String,

        #[arg(long, short = 't', default_value = "budget")]
        template: String,
    },

    /// List available templates
    Templates,

    /// Show config file locations and effective settings
    Config,
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn script(err: ScriptError) -> Self {
        let hint = match &err {
            ScriptError::Rejected { .. } => Some("run without --strict to continue past rejected edits".to_string()),
            _ => None,
        };
        Self { code: EXIT_SCRIPT, message: err.to_string(), hint }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<SheetError> for CliError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::UnknownTemplate(_) => {
                CliError::usage(err.to_string()).with_hint("templates: budget, timeline, inventory, blank")
            }
            other => CliError::general(other.to_string()),
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  sheetcraft-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = match cli.command {
        Commands::Run {
            script,
            template,
            save_dir,
            strict,
            keybindings,
            no_show,
        } => cmd_run(&settings, script, &template, save_dir, strict, keybindings, no_show),
        Commands::Eval { formula, template } => cmd_eval(&settings, &formula, &template),
        Commands::Templates => cmd_templates(&settings),
        Commands::Config => cmd_config(&settings, cli.settings),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// `RUST_LOG` wins unless `--verbose` is given; default level is warn.
fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

/// Map user settings onto the engine's config.
fn sheet_config(settings: &Settings) -> SheetConfig {
    SheetConfig {
        layout: LayoutConfig {
            min_row_height: settings.min_row_height,
            line_height: settings.line_height,
            row_padding: settings.row_padding,
            default_column_width: settings.default_column_width,
            ..LayoutConfig::default()
        },
        seed: SeedOptions {
            blank_rows: settings.blank_rows,
            blank_columns: settings.blank_columns,
            column_width: settings.default_column_width,
        },
        font_size: settings.font_size,
        history_limit: settings.history_limit,
    }
}

/// Save callback that persists each snapshot as pretty JSON.
fn snapshot_writer(dir: PathBuf) -> SaveCallback {
    let path = dir.join("snapshot.json");
    let mut saves = 0usize;
    Box::new(move |event: SaveEvent| {
        saves += 1;
        let written = serde_json::to_string_pretty(&event.snapshot)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(&path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => log::debug!("save #{} ({}) -> {}", saves, event.kind.as_str(), path.display()),
            Err(e) => log::warn!("could not write {}: {}", path.display(), e),
        }
    })
}

fn read_script(script: Option<PathBuf>) -> Result<String, CliError> {
    match script {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(&path)
            .map_err(|e| CliError::io(format!("{}: {}", path.display(), e))),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| CliError::io(format!("stdin: {}", e)))?;
            Ok(buf)
        }
    }
}

fn cmd_run(
    settings: &Settings,
    script: Option<PathBuf>,
    template: &str,
    save_dir: Option<PathBuf>,
    strict: bool,
    keybindings: Option<PathBuf>,
    no_show: bool,
) -> Result<(), CliError> {
    let source = read_script(script)?;
    let mut doc = SheetDocument::from_template(template, sheet_config(settings))?;

    if let Some(dir) = save_dir {
        fs::create_dir_all(&dir).map_err(|e| CliError::io(format!("{}: {}", dir.display(), e)))?;
        doc.set_on_save(snapshot_writer(dir));
    }

    let keys = match keybindings {
        Some(path) => KeybindingManager::load_from(&path, settings.modifier_style),
        None => KeybindingManager::new(settings.modifier_style),
    };

    let stdout = io::stdout();
    let mut runner = Runner::new(doc, keys, stdout.lock(), strict);
    let summary = runner.run_script(&source).map_err(CliError::script)?;
    let (doc, mut out) = runner.finish();

    if !no_show {
        render::render_grid(&doc, &mut out).map_err(|e| CliError::io(e.to_string()))?;
    }
    log::info!("{} edits applied, {} rejected", summary.applied, summary.rejected);
    Ok(())
}

fn cmd_eval(settings: &Settings, formula: &str, template: &str) -> Result<(), CliError> {
    let doc = SheetDocument::from_template(template, sheet_config(settings))?;
    println!("{}", doc.evaluate(formula));
    Ok(())
}

fn cmd_templates(settings: &Settings) -> Result<(), CliError> {
    let options = sheet_config(settings).seed;
    let today = SystemClock.today();
    for template in Template::ALL {
        let seed = template.seed(&options, today);
        println!(
            "{:<10} {:<18} {} columns, {} rows",
            template.as_str(),
            seed.title,
            seed.columns.len(),
            seed.rows.len()
        );
    }
    Ok(())
}

fn cmd_config(settings: &Settings, path: Option<PathBuf>) -> Result<(), CliError> {
    let settings_path = path.unwrap_or_else(Settings::config_path);
    let keys = KeybindingManager::new(settings.modifier_style);
    let json = serde_json::to_string_pretty(settings).map_err(|e| CliError::general(e.to_string()))?;

    let mut text = format!(
        "settings:    {}\nkeybindings: {}\n{}\n",
        settings_path.display(),
        keys.config_path().display(),
        json
    );
    for (chord, command) in keys.bindings() {
        text.push_str(&format!("  {:<14} {}\n", chord, command));
    }
    io::stdout()
        .write_all(text.as_bytes())
        .map_err(|e| CliError::io(e.to_string()))
}
