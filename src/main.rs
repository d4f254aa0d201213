use clap::Parser;
use enviro_mqtt_bridge::accessory::AccessoryStore;
use enviro_mqtt_bridge::cache_lock::CacheLock;
use enviro_mqtt_bridge::config::{Config, load_dotenv};
use enviro_mqtt_bridge::input::mqtt::EnviroListener;
use enviro_mqtt_bridge::platform::Platform;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// How often newly registered accessories are written to the cache.
const CACHE_SAVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "enviro-mqtt-bridge", version, about)]
struct Args {
    /// First topic segment of Enviro messages
    #[arg(long, env = "MQTT_TOPIC_PREFIX")]
    prefix: Option<String>,

    /// Accessory cache file
    #[arg(long, env = "ENVIRO_ACCESSORY_CACHE")]
    cache: Option<PathBuf>,

    /// Keep accessories in memory only
    #[arg(long)]
    no_cache: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logger(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file before anything else
    load_dotenv();
    let args = Args::parse();
    init_logger(&args.log_level);
    info!("Starting Enviro MQTT bridge");

    let mut config = Config::from_env();
    if let Some(prefix) = args.prefix {
        config.mqtt.topic_prefix = prefix.trim_matches('/').to_string();
    }
    if let Some(cache) = args.cache {
        config.platform.cache_path = Some(cache);
    }
    if args.no_cache {
        config.platform.cache_path = None;
    }

    info!("Configuration loaded:");
    info!(
        "  Broker: {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );
    info!("  Topic prefix: {}", config.mqtt.topic_prefix);
    info!("  Accessory cache: {:?}", config.platform.cache_path);

    let (store, _lock) = match &config.platform.cache_path {
        Some(path) => {
            let lock = match CacheLock::acquire(path) {
                Ok(lock) => {
                    info!("Acquired cache lock {:?}", lock.path());
                    lock
                }
                Err(e) => {
                    error!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            let store = AccessoryStore::open(path.clone(), &config.platform.ignored_accessories);
            (store, Some(lock))
        }
        None => (AccessoryStore::in_memory(), None),
    };
    let store = Arc::new(store);

    let mut platform = Platform::new(config.platform.name.clone(), store.clone());
    let listener = EnviroListener::new(&config.mqtt);
    info!("Listening on {}/#", listener.prefix());

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        shutdown_signal.cancel();
    });

    // Cache writes are blocking file I/O, so they stay off the MQTT poll loop.
    let saver_store = store.clone();
    let saver_shutdown = shutdown.clone();
    let saver = tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SAVE_INTERVAL);
        loop {
            tokio::select! {
                _ = saver_shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }
            let store = saver_store.clone();
            match tokio::task::spawn_blocking(move || store.save_if_dirty()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!("Failed to save accessory cache: {}", e),
                Err(e) => error!("Accessory cache save task failed: {}", e),
            }
        }
    });

    info!("Enviro MQTT bridge is running, press Ctrl+C to exit");
    listener
        .run(shutdown, |key, reading| platform.on_reading(&key, &reading))
        .await;

    if let Err(e) = saver.await {
        error!("Accessory cache saver failed: {}", e);
    }

    info!("Known devices:");
    for (id, kind, name) in platform.devices() {
        match platform.handler(&id) {
            Some(handler) => info!(
                "  {} [{}] {} (added {})",
                name,
                kind,
                id,
                handler.accessory().created_at().format("%Y-%m-%d %H:%M")
            ),
            None => info!("  {} [{}] {}", name, kind, id),
        }
    }

    if let Err(e) = store.save() {
        error!("Failed to save accessory cache: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Enviro MQTT bridge stopped");
    ExitCode::SUCCESS
}
