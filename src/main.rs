use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use weekboard_lib::config::Settings;
use weekboard_lib::service::{DisplayService, ErrorResponse, PageView};
use weekboard_lib::{init_tracing, Engine};

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "weekboard", version, about = "Weekly schedule display engine")]
struct Args {
    /// JSON settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding uploaded schedules.
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Quiet period after the last file change, in milliseconds.
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    /// Per-viewer send timeout, in milliseconds.
    #[arg(long, global = true)]
    send_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the storage directory and log refresh events until Ctrl-C
    Watch {
        /// Schedule to activate instead of the most recent upload
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the markup of one week
    Render {
        /// Schedule file; defaults to the most recent upload
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        sheet: Option<String>,
        /// Week index; defaults to the current week
        #[arg(long)]
        week: Option<usize>,
        /// Reference date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// List the visible sheets of a schedule
    Sheets {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the status snapshot as JSON
    Status,
    /// Copy a schedule into the storage directory and activate it
    Upload {
        /// Local file, or an http(s) URL to download
        source: String,
    },
}

impl Args {
    fn settings(&self) -> Result<Settings, weekboard_lib::schedule::ScheduleError> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(dir) = &self.storage_dir {
            settings.storage_dir = dir.clone();
        }
        if let Some(ms) = self.debounce_ms {
            settings.debounce_ms = ms;
        }
        if let Some(ms) = self.send_timeout_ms {
            settings.send_timeout_ms = ms;
        }
        settings.normalized()
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> CliResult {
    let settings = args.settings()?;

    match args.command {
        Command::Watch { file } => watch(settings, file).await,
        Command::Render {
            file,
            sheet,
            week,
            today,
        } => {
            let service = loaded_service(settings, file).await?;
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            match service.page(sheet.as_deref(), week, today) {
                Ok(PageView::Week(week)) => {
                    tracing::info!(sheet = %week.sheet, week = week.index, weeks = week.week_count, label = %week.label, "rendered");
                    println!("{}", week.markup);
                }
                Ok(PageView::AwaitingUpload { message }) => println!("{}", message),
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
                    return Err(e.into());
                }
            }
            Ok(())
        }
        Command::Sheets { file } => {
            let service = loaded_service(settings, file).await?;
            for name in service.list_sheets()? {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Status => {
            let service = loaded_service(settings, None).await?;
            println!("{}", serde_json::to_string_pretty(&service.status().await)?);
            for name in service.list_files()? {
                println!("  {}", name);
            }
            Ok(())
        }
        Command::Upload { source } => {
            let service = DisplayService::new(settings)?;
            let handle = if source.starts_with("http://") || source.starts_with("https://") {
                service.import_from_url(&source).await?
            } else {
                let path = PathBuf::from(&source);
                let bytes = tokio::fs::read(&path).await?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                service.accept_upload(&name, &bytes).await?
            };
            println!("{} ({} sheets)", handle.path().display(), handle.sheet_count());
            Ok(())
        }
    }
}

async fn loaded_service(settings: Settings, file: Option<PathBuf>) -> Result<DisplayService, Box<dyn std::error::Error + Send + Sync>> {
    let service = DisplayService::new(settings)?;
    match file {
        Some(path) => {
            service.activate_file(&path).await?;
        }
        None => {
            service.load_most_recent().await?;
        }
    }
    Ok(service)
}

async fn watch(settings: Settings, file: Option<PathBuf>) -> CliResult {
    let engine = Engine::start(settings).await?;
    if let Some(path) = file {
        engine.activate_file(&path).await?;
    }

    let (viewer, mut refreshes) = engine.connect_viewer().await;
    let status = engine.service().status().await;
    tracing::info!(
        file = status.active_file_name.as_deref().unwrap_or("-"),
        sheets = status.sheet_count,
        "watching, press Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            event = refreshes.recv() => match event {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                break;
            }
        }
    }
    engine.disconnect_viewer(viewer).await;
    Ok(())
}
