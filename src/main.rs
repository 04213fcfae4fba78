use anyhow::Result;
use clap::Parser;
use livesub::audio::source::AudioSource;
use livesub::audio::wav::WavAudioSource;
use livesub::cli::{Cli, Commands, ConfigAction};
use livesub::config::Config;
use livesub::events::{EventReceiver, PipelineEvent};
use livesub::streaming::pipeline::{Pipeline, PipelineConfig};
use livesub::translate::openai::OpenAiTranslator;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match &cli.command {
        None => {
            let config = load_config(&cli)?;
            run_live(&cli, config).await?;
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::File { path }) => {
            let config = load_config(&cli)?;
            run_file(&cli, config, path).await?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, &cli)?;
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);
    let config = cli.apply_to_config(Config::load_or_default(&path)?.with_env_overrides());
    config.validate()?;
    Ok(config)
}

async fn run_live(cli: &Cli, config: Config) -> Result<()> {
    #[cfg(not(feature = "cpal-audio"))]
    {
        let _ = (cli, config);
        anyhow::bail!("built without audio capture; rebuild with --features cpal-audio");
    }

    #[cfg(feature = "cpal-audio")]
    {
        let source = livesub::audio::capture::CpalAudioSource::new(
            config.audio.device.as_deref(),
            config.audio.device_index,
        )?;
        run_pipeline(cli, config, source).await
    }
}

async fn run_file(cli: &Cli, config: Config, path: &Path) -> Result<()> {
    let source = if path == Path::new("-") {
        WavAudioSource::from_stdin()?
    } else {
        WavAudioSource::from_file(path)?
    };
    eprintln!(
        "Transcribing {} ({:.1}s of audio)",
        path.display(),
        source.duration_secs()
    );
    run_pipeline(cli, config, source).await
}

async fn run_pipeline<A>(cli: &Cli, config: Config, source: A) -> Result<()>
where
    A: AudioSource + 'static,
{
    let recognizer = build_recognizer(&config)?;
    let translator = build_translator(&config, cli.no_translate)?;

    let (event_tx, event_rx) = livesub::events::channel();
    let quiet = cli.quiet;
    let printer = std::thread::spawn(move || print_events(event_rx, quiet));

    let handle = Pipeline::with_config(PipelineConfig::from_config(&config)).start(
        source,
        recognizer,
        translator,
        event_tx,
    )?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            tracing::info!("interrupted, finalizing open phrase");
            handle.stop();
        }
        _ = watch_feed(&handle) => {}
    }
    handle.wait().await;

    // All event senders are gone once the stations exit.
    let _ = printer.join();
    Ok(())
}

/// Resolves once the capture feed stops on its own (finite sources).
async fn watch_feed(handle: &livesub::streaming::pipeline::PipelineHandle) {
    while handle.is_running() {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

#[cfg(feature = "whisper")]
fn build_recognizer(config: &Config) -> Result<Arc<livesub::stt::whisper::WhisperRecognizer>> {
    use livesub::stt::whisper::{WhisperConfig, WhisperRecognizer};

    let model_path = find_model(&config.stt.whisper_model, &config.stt.compute_type)?;
    let recognizer = WhisperRecognizer::new(WhisperConfig {
        model_path,
        language: config.stt.source_language.clone(),
        threads: None,
        use_gpu: config.stt.device != "cpu",
    })?;
    tracing::info!(
        model = recognizer.model_name(),
        backend = livesub::defaults::gpu_backend(),
        "loaded whisper model"
    );
    Ok(Arc::new(recognizer))
}

#[cfg(not(feature = "whisper"))]
fn build_recognizer(_config: &Config) -> Result<Arc<livesub::stt::recognizer::MockRecognizer>> {
    anyhow::bail!(
        "this binary was built without speech recognition; \
         rebuild with: cargo build --release --features whisper"
    )
}

/// Look for `ggml-<model>.bin` in the cache dir, then a local `models/` dir.
///
/// `compute_type` selects a quantized variant of the model file when it
/// is not "default" (ggml bakes quantization into the file).
#[cfg(feature = "whisper")]
fn find_model(model: &str, compute_type: &str) -> Result<std::path::PathBuf> {
    let filename = match compute_type {
        "int8" => format!("ggml-{}-q8_0.bin", model),
        // stock ggml models are already float16
        _ => format!("ggml-{}.bin", model),
    };

    if let Some(cache) = dirs::cache_dir() {
        let path = cache.join("livesub/models").join(&filename);
        if path.exists() {
            return Ok(path);
        }
    }
    let local = std::path::PathBuf::from("models").join(&filename);
    if local.exists() {
        return Ok(local);
    }

    anyhow::bail!(
        "whisper model '{}' not found; place {} under ~/.cache/livesub/models/ \
         (download from https://huggingface.co/ggerganov/whisper.cpp)",
        model,
        filename
    )
}

fn build_translator(config: &Config, no_translate: bool) -> Result<Option<Arc<OpenAiTranslator>>> {
    if no_translate {
        return Ok(None);
    }
    if config.translate.api_key.is_none() && config.translate.base_url.is_none() {
        tracing::warn!(
            "no API key or base URL configured, translation disabled \
             (set OPENAI_API_KEY or translate.base_url)"
        );
        return Ok(None);
    }
    Ok(Some(Arc::new(OpenAiTranslator::new(&config.translate)?)))
}

fn list_audio_devices() -> Result<()> {
    #[cfg(feature = "cpal-audio")]
    {
        let devices = livesub::audio::capture::list_devices()?;
        if devices.is_empty() {
            println!("No audio input devices found");
        } else {
            println!("Available audio input devices:");
            for (index, name) in devices.iter().enumerate() {
                println!("  [{}] {}", index, name);
            }
        }
        Ok(())
    }
    #[cfg(not(feature = "cpal-audio"))]
    anyhow::bail!("built without audio capture; rebuild with --features cpal-audio")
}

fn handle_config_command(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(cli)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Console renderer for pipeline events.
///
/// Runs on its own thread so terminal writes never block the pipeline;
/// exits when the last event sender is dropped.
fn print_events(events: EventReceiver, quiet: bool) {
    let mut out = std::io::stdout();
    for event in events.iter() {
        match event {
            PipelineEvent::DisplayUpdated { stable, partial, .. } => {
                if !quiet {
                    // overwrite the current line with the live text
                    let _ = write!(out, "\r\x1b[K{} {}", stable, partial);
                    let _ = out.flush();
                }
            }
            PipelineEvent::PhraseFinalized { text, .. } => {
                let _ = writeln!(out, "\r\x1b[K{}", text);
                let _ = out.flush();
            }
            PipelineEvent::TranslationReady { text, .. } => {
                let _ = writeln!(out, "  = {}", text);
                let _ = out.flush();
            }
            PipelineEvent::TranslationFailed { message, .. } => {
                let _ = writeln!(out, "  = (translation unavailable)");
                let _ = out.flush();
                tracing::warn!(%message, "translation failed");
            }
            PipelineEvent::Error { phrase_id, message } => {
                tracing::warn!(?phrase_id, %message, "pipeline error");
            }
        }
    }
}
