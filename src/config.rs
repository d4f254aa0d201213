use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Split one `.env` line into a key/value pair.
///
/// Blank lines and `#` comments yield `None`. Values may contain spaces and
/// lose one pair of surrounding quotes.
pub fn parse_dotenv_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let mut value = value.trim();
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }

    Some((key, value))
}

/// Load environment variables from a `.env` file in the working directory.
/// Variables already present in the environment win.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    let Ok(content) = fs::read_to_string(env_path) else {
        return;
    };

    for (key, value) in content.lines().filter_map(parse_dotenv_line) {
        if std::env::var(key).is_err() {
            // SAFETY: called from main before the async runtime spawns any threads
            unsafe { std::env::set_var(key, value) };
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub platform: PlatformConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// First topic segment of every Enviro message, subscribed as `prefix/#`.
    pub topic_prefix: String,
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,
    /// Where cached accessories are persisted. `None` keeps them in memory only.
    pub cache_path: Option<PathBuf>,
    /// Display names of cached accessories that must not be restored.
    pub ignored_accessories: Vec<String>,
}

/// Default location of the accessory cache file.
pub fn default_cache_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("enviro-mqtt-bridge")
        .join("accessories.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig {
                broker_host: "localhost".to_string(),
                broker_port: 1883,
                client_id: "enviro-mqtt-bridge".to_string(),
                username: None,
                password: None,
                topic_prefix: "enviro".to_string(),
                keep_alive_secs: 30,
            },
            platform: PlatformConfig {
                name: "Pimoroni Enviro".to_string(),
                cache_path: Some(default_cache_path()),
                ignored_accessories: Vec::new(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from defaults overridden by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // MQTT configuration
        if let Some(host) = lookup("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        if let Some(port) = lookup("MQTT_BROKER_PORT")
            && let Ok(p) = port.parse()
        {
            config.mqtt.broker_port = p;
        }
        if let Some(client_id) = lookup("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Some(username) = lookup("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Some(password) = lookup("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }
        if let Some(prefix) = lookup("MQTT_TOPIC_PREFIX") {
            config.mqtt.topic_prefix = prefix.trim_matches('/').to_string();
        }
        if let Some(keep_alive) = lookup("MQTT_KEEP_ALIVE_SECS")
            && let Ok(k) = keep_alive.parse()
        {
            config.mqtt.keep_alive_secs = k;
        }

        // Platform configuration
        if let Some(name) = lookup("ENVIRO_PLATFORM_NAME") {
            config.platform.name = name;
        }
        if let Some(path) = lookup("ENVIRO_ACCESSORY_CACHE") {
            config.platform.cache_path = Some(PathBuf::from(path));
        }
        if let Some(names) = lookup("ENVIRO_IGNORED_ACCESSORIES") {
            config.platform.ignored_accessories = names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }

        config
    }
}
