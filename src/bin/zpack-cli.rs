//! CLI zpack
//!
//! Просмотр, проверка и создание файлов MessagePack из командной строки.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use zpack::{
    codec::{Reader, Tree, Writer},
    json::{node_to_json, write_json},
    logging::{init_logging, LogFormat, LoggingConfig},
    CodecSettings, StackError,
};

/// Основная структура CLI аргументов
#[derive(Parser)]
#[command(name = "zpack-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("ZPACK_GIT_COMMIT"), " ", env!("ZPACK_BUILD_DATE"), ")",
    "\nfeatures: ", env!("ZPACK_FEATURES"),
))]
#[command(about = "zpack CLI - inspect, validate and encode MessagePack files", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Файл настроек кодека (toml/json/yaml); окружение `ZPACK_*` приоритетнее
    #[arg(long, global = true, env = "ZPACK_CONFIG")]
    config: Option<PathBuf>,
    /// Включить подробный вывод (debug)
    #[arg(short, long, global = true, help = "Включить подробный вывод для отладки")]
    verbose: bool,
    /// Формат логов
    #[arg(long, global = true, value_enum, default_value = "compact")]
    log_format: LogFormatArg,
    /// Подкоманда для выполнения
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum LogFormatArg {
    Json,
    Pretty,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

/// Подкоманды CLI
#[derive(Subcommand)]
enum Commands {
    /// Вывести сообщение как JSON
    Inspect {
        /// Файл MessagePack
        file: PathBuf,
        /// Читать файл потоком через буфер вместо загрузки целиком
        #[arg(long)]
        stream: bool,
        /// Однострочный JSON
        #[arg(long)]
        compact: bool,
    },
    /// Проверить, что файл содержит одно корректное сообщение
    Validate {
        /// Файл MessagePack
        file: PathBuf,
        /// Отчёт в JSON (код статуса и контекст ошибки)
        #[arg(long)]
        json: bool,
    },
    /// Преобразовать JSON в MessagePack
    Encode {
        /// Входной JSON
        input: PathBuf,
        /// Выходной файл MessagePack
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: if cli.verbose { "debug" } else { "warn" }.to_string(),
        format: cli.log_format.into(),
        ..LoggingConfig::default()
    };
    init_logging(logging).context("Failed to initialize logging")?;

    let settings = CodecSettings::load_from(cli.config.as_deref())
        .context("Failed to load codec settings")?;
    debug!(?settings, "codec settings loaded");

    match cli.command {
        Commands::Inspect {
            file,
            stream,
            compact,
        } => inspect(&settings, file, stream, compact),
        Commands::Validate { file, json } => validate(&settings, file, json),
        Commands::Encode { input, output } => encode(&settings, input, output),
    }
}

fn inspect(
    settings: &CodecSettings,
    file: PathBuf,
    stream: bool,
    compact: bool,
) -> Result<()> {
    let tree = if stream {
        Tree::from_file_streaming(&file, settings.tree_config())?
    } else {
        Tree::from_file(&file, settings.tree_config())?
    };
    info!(
        nodes = tree.node_count(),
        pages = tree.page_count(),
        "tree built"
    );

    let value = node_to_json(tree.root());
    tree.check()
        .with_context(|| format!("Failed to convert {}", file.display()))?;

    let text = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{text}");
    Ok(())
}

fn validate(
    settings: &CodecSettings,
    file: PathBuf,
    json: bool,
) -> Result<()> {
    let mut reader = Reader::from_file(&file, settings.reader_config())?;
    reader.discard();
    let result = reader.destroy();

    if json {
        let report = match result {
            Ok(()) => serde_json::json!({ "file": file.display().to_string(), "ok": true }),
            Err(e) => {
                let err = StackError::from(e).context(format!("Failed to validate {}", file.display()));
                serde_json::json!({
                    "file": file.display().to_string(),
                    "ok": false,
                    "error": err.to_response(),
                })
            }
        };
        println!("{report}");
    } else {
        match result {
            Ok(()) => println!("{}: ok", file.display()),
            Err(e) => println!("{}: {} ({})", file.display(), e, e.name()),
        }
    }

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

fn encode(
    settings: &CodecSettings,
    input: PathBuf,
    output: PathBuf,
) -> Result<()> {
    let text = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse JSON from {}", input.display()))?;

    let mut writer = Writer::to_file(&output, settings.writer_config())?;
    write_json(&mut writer, &value);
    writer
        .destroy()
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(output = %output.display(), "encoded");
    Ok(())
}
