use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notification_agent::app::{forward_interrupts, Config, ExitReason, Session, SessionOptions};
use notification_agent::model::{AccessoryView, AccessoryViewKind, MediaLoader, MediaType, PopupReminder};

/// Notification Agent - headless popup and payload tooling
#[derive(Parser)]
#[command(name = "notification-agent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); defaults to the config file value
    #[arg(short, long)]
    log_level: Option<String>,

    /// Alternative config file
    #[arg(short, long, env = "NOTIFICATION_AGENT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a popup and wait for an exit point
    Popup {
        /// Accessory view type and payload (repeatable)
        #[arg(long = "accessory-view", num_args = 2, value_names = ["TYPE", "PAYLOAD"])]
        accessory_views: Vec<String>,
        /// Seconds before the popup times out
        #[arg(long)]
        timeout: Option<u64>,
        /// Reminder payload, e.g. "/timeinterval 60 /repeat"
        #[arg(long)]
        reminder: Option<String>,
        /// Listen for warning button visibility updates
        #[arg(long)]
        warning_button: bool,
        /// Echo interactive updates as JSON lines on stderr
        #[arg(long)]
        echo_events: bool,
    },
    /// Decode an accessory view payload and print it as JSON
    Decode {
        /// Accessory view type (input, checklist, dropdown, ...)
        kind: String,
        payload: String,
    },
    /// Decode a popup reminder payload and print it as JSON
    Reminder { payload: String },
    /// Resolve a media source and print its descriptor as JSON
    Media {
        #[arg(long = "type", value_enum, default_value = "image")]
        media_type: MediaKindArg,
        payload: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MediaKindArg {
    Image,
    Video,
}

impl From<MediaKindArg> for MediaType {
    fn from(kind: MediaKindArg) -> Self {
        match kind {
            MediaKindArg::Image => MediaType::Image,
            MediaKindArg::Video => MediaType::Video,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitReason::InvalidArgumentsSyntax.code()
            } else {
                0
            };
            std::process::exit(code);
        }
    };

    let reason = match run(cli) {
        Ok(reason) => reason,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitReason::InternalError
        }
    };
    std::process::exit(reason.code());
}

fn run(cli: Cli) -> Result<ExitReason> {
    // 設定を先に読み込む（ファイルがなければ作成）
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };

    // ログ初期化
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(&level)?;

    match cli.command {
        Commands::Popup {
            accessory_views,
            timeout,
            reminder,
            warning_button,
            echo_events,
        } => {
            let options = SessionOptions {
                timeout_secs: timeout,
                reminder: None,
                warning_button,
                echo_events: echo_events || config.popup.echo_events,
            };
            run_popup(&config, &accessory_views, reminder.as_deref(), options)
        }
        Commands::Decode { kind, payload } => decode_view(&config, &kind, &payload),
        Commands::Reminder { payload } => match PopupReminder::parse(&payload) {
            Ok(reminder) => {
                println!("{}", serde_json::to_string_pretty(&reminder)?);
                Ok(ExitReason::UntrackedSuccess)
            }
            Err(e) => {
                warn!("Invalid reminder payload: {}", e);
                eprintln!("Invalid reminder payload: {}", e);
                Ok(ExitReason::from(&e))
            }
        },
        Commands::Media {
            media_type,
            payload,
        } => {
            let loader = MediaLoader::new(&config.media)?;
            match loader.load(media_type.into(), &payload) {
                Some(media) => {
                    println!("{}", serde_json::to_string_pretty(&media)?);
                    Ok(ExitReason::UntrackedSuccess)
                }
                None => {
                    warn!("Unable to load media from '{}'", payload);
                    Ok(ExitReason::UnableToLoadResources)
                }
            }
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let log_dir = directories::ProjectDirs::from("", "", "notification-agent")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("notification-agent"));

    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("notification-agent.log"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(log_file).with_ansi(false))
        .init();

    info!("Notification Agent starting");
    Ok(())
}

fn decode_view(config: &Config, kind: &str, payload: &str) -> Result<ExitReason> {
    let view = AccessoryViewKind::from_name(kind).and_then(|kind| AccessoryView::parse(kind, payload, config));
    match view {
        Ok(view) => {
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(ExitReason::UntrackedSuccess)
        }
        Err(e) => {
            warn!("Invalid {} payload: {}", kind, e);
            eprintln!("Invalid {} payload: {}", kind, e);
            Ok(ExitReason::from(&e))
        }
    }
}

fn run_popup(
    config: &Config,
    accessory_views: &[String],
    reminder: Option<&str>,
    mut options: SessionOptions,
) -> Result<ExitReason> {
    if let Some(payload) = reminder {
        match PopupReminder::parse(payload) {
            Ok(reminder) => options.reminder = Some(reminder),
            Err(e) => {
                error!("Invalid reminder payload: {}", e);
                return Ok(ExitReason::from(&e));
            }
        }
    }

    // メディアの取得はblockingクライアントを使うためランタイム起動前に行う
    let requested = accessory_views.len() / 2;
    let mut views = Vec::with_capacity(requested);
    for pair in accessory_views.chunks_exact(2) {
        let (kind, payload) = (&pair[0], &pair[1]);
        match AccessoryViewKind::from_name(kind).and_then(|kind| AccessoryView::parse(kind, payload, config)) {
            Ok(view) => views.push(view),
            Err(e) => warn!("Skipping {} accessory view: {}", kind, e),
        }
    }

    let keeps_alive = options.timeout_secs.is_some() || options.warning_button;
    if requested > 0 && views.is_empty() && !keeps_alive {
        error!("No accessory view could be created");
        return Ok(ExitReason::InvalidArgumentFormat);
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let reason = runtime.block_on(async {
        let mut session = Session::new(views, options);
        let listener = session.attach_updates(BufReader::new(std::io::stdin()))?;
        let interrupts = forward_interrupts(session.sender());

        let mut stdout = std::io::stdout();
        let reason = session.run(&mut stdout).await;

        interrupts.abort();
        if let Some(listener) = listener {
            // 読み込み中のstdinは中断できないので終了を待たない
            listener.stop();
        }
        reason
    })?;

    runtime.shutdown_background();
    Ok(reason)
}
