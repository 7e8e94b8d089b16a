use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use clap::{ArgAction, Parser};
use tracing::Level;

use dom_translate::core::{format_output_path, translate_document, DocumentOptions, DocumentReport};
use dom_translate::env::{self, EnvVar};
use dom_translate::translation::{
    load_translation_config, ConfigManager, LanguageStore, MemoryLanguageStore,
    RedbLanguageStore, RunStatus, TranslationConfig,
};

/// Translates the visible text of an HTML document in place
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the HTML document to translate
    input: Option<PathBuf>,

    /// Target language (e.g. 'en'); defaults to the persisted selection
    #[arg(short, long)]
    language: Option<String>,

    /// Output path, supports %title%, %lang% and %timestamp%; prints to stdout if absent
    #[arg(short, long)]
    output: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the offline dictionary only
    #[arg(long)]
    offline: bool,

    /// Translation API key
    #[arg(long)]
    api_key: Option<String>,

    /// redb file holding the selected language
    #[arg(long)]
    state: Option<PathBuf>,

    /// Charset of the input document
    #[arg(short, long)]
    encoding: Option<String>,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH")]
    generate_config: Option<PathBuf>,

    /// Print the supported environment variables and exit
    #[arg(long)]
    env_docs: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.env_docs {
        print!("{}", env::generate_env_docs());
        return Ok(());
    }

    if let Some(path) = &args.generate_config {
        ConfigManager::generate_example_config(path)?;
        eprintln!("已生成示例配置文件: {}", path.display());
        return Ok(());
    }

    let Some(input) = args.input.clone() else {
        return Err("缺少输入文件，使用 --help 查看用法".into());
    };

    let config = load_config(&args)?;
    let store = open_store(&args, &config);
    let options = DocumentOptions {
        language: args.language.clone(),
        encoding: args.encoding.clone(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    let (output, report) =
        local.block_on(&runtime, translate_document(&input, &options, config, store))?;

    match &args.output {
        Some(path) => {
            let path = format_output_path(path, report.title.as_deref(), &report.language);
            fs::write(&path, &output)?;
            tracing::info!("已写入 {}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&output)?;
            stdout.flush()?;
        }
    }

    print_summary(&report);
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => env::core::LogLevel::get()
            .ok()
            .and_then(|level| level.parse::<Level>().ok())
            .unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<TranslationConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => ConfigManager::from_path(path)?.into_config(),
        None => load_translation_config(),
    };

    if args.offline {
        config.start_offline = true;
    }
    if let Some(key) = &args.api_key {
        config.api_key = Some(key.clone());
    }
    config.validate()?;

    Ok(config)
}

fn open_store(args: &Args, config: &TranslationConfig) -> Rc<dyn LanguageStore> {
    let path = args
        .state
        .clone()
        .or_else(|| config.state_path.clone())
        .or_else(default_state_path);

    match path {
        Some(path) => match RedbLanguageStore::open(&path) {
            Ok(store) => Rc::new(store),
            Err(e) => {
                tracing::warn!("无法打开状态文件 {}，语言选择不会被保存: {}", path.display(), e);
                Rc::new(MemoryLanguageStore::new())
            }
        },
        None => Rc::new(MemoryLanguageStore::new()),
    }
}

fn default_state_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dom-translate")
        .map(|dirs| dirs.data_dir().join("state.redb"))
}

fn print_summary(report: &DocumentReport) {
    match &report.run {
        Some(run) => {
            let status = match run.status {
                RunStatus::Completed => "completed",
                RunStatus::CompletedWithErrors => "completed with errors",
                RunStatus::Restored => "restored",
            };
            eprintln!(
                "{}: {} ({} units, {} batches, {} fell back, {} elements) in {} ms",
                report.language,
                status,
                run.total_units,
                run.total_batches,
                run.failed_batches.len(),
                report.elements.translated,
                run.duration().num_milliseconds()
            );
        }
        None => eprintln!("{}: unchanged", report.language),
    }
}
