//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::composition::Canvas;
use crate::domain::config::{AppConfig, CaptureConfig, VIDEO_CONTAINERS};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;
    presenter.output(read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(invalid(
        key,
        format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    ))
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Current value of a key, formatted for display
fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    let capture = config.capture.as_ref();
    match key {
        "output_dir" => config.output_dir.clone(),
        "scratch_dir" => config.scratch_dir.clone(),
        "max_duration" => config.max_duration.clone(),
        "export_timeout" => config.export_timeout.clone(),
        "canvas_width" => config.canvas_width.map(|v| v.to_string()),
        "canvas_height" => config.canvas_height.map(|v| v.to_string()),
        "frame_rate" => config.frame_rate.map(|v| v.to_string()),
        "container" => config.container.clone(),
        "notify" => config.notify.map(|b| b.to_string()),
        "keep_sources" => config.keep_sources.map(|b| b.to_string()),
        "capture.input_format" => capture.and_then(|c| c.input_format.clone()),
        "capture.front_device" => capture.and_then(|c| c.front_device.clone()),
        "capture.back_device" => capture.and_then(|c| c.back_device.clone()),
        "capture.audio_format" => capture.and_then(|c| c.audio_format.clone()),
        "capture.audio_device" => capture.and_then(|c| c.audio_device.clone()),
        "capture.mirror_front" => capture.and_then(|c| c.mirror_front).map(|b| b.to_string()),
        _ => None,
    }
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "output_dir" | "scratch_dir" => {
            let path = non_empty(key, value)?;
            if key == "output_dir" {
                config.output_dir = Some(path);
            } else {
                config.scratch_dir = Some(path);
            }
        }
        "max_duration" | "export_timeout" => {
            let duration: Duration = value.parse().map_err(|e| invalid(key, format!("{}", e)))?;
            if key == "max_duration" {
                config.max_duration = Some(duration.to_string());
            } else {
                config.export_timeout = Some(duration.to_string());
            }
        }
        "canvas_width" => {
            let width = parse_dimension(key, value)?;
            config.canvas_width = Some(width);
        }
        "canvas_height" => {
            let height = parse_dimension(key, value)?;
            check_canvas(key, config.canvas_width.unwrap_or(2), height, 30)?;
            config.canvas_height = Some(height);
        }
        "frame_rate" => {
            let fps: u32 = value
                .parse()
                .map_err(|_| invalid(key, "Value must be a whole number"))?;
            check_canvas(key, 2, 4, fps)?;
            config.frame_rate = Some(fps);
        }
        "container" => {
            let container = value.trim().to_lowercase();
            if !VIDEO_CONTAINERS.contains(&container.as_str()) {
                return Err(invalid(
                    key,
                    format!(
                        "Invalid value '{}'. Valid options: {}",
                        value,
                        VIDEO_CONTAINERS.join(", ")
                    ),
                ));
            }
            config.container = Some(container);
        }
        "notify" => config.notify = Some(parse_bool(key, value)?),
        "keep_sources" => config.keep_sources = Some(parse_bool(key, value)?),
        _ => {
            let capture = config.capture.get_or_insert_with(CaptureConfig::default);
            match key {
                "capture.input_format" => capture.input_format = Some(non_empty(key, value)?),
                "capture.front_device" => capture.front_device = Some(non_empty(key, value)?),
                "capture.back_device" => capture.back_device = Some(non_empty(key, value)?),
                "capture.audio_format" => capture.audio_format = Some(non_empty(key, value)?),
                "capture.audio_device" => capture.audio_device = Some(non_empty(key, value)?),
                "capture.mirror_front" => capture.mirror_front = Some(parse_bool(key, value)?),
                _ => return Err(invalid(key, "Unknown key")),
            }
        }
    }
    Ok(())
}

fn non_empty(key: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(key, "Value must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Canvas dimensions must be positive and even
fn parse_dimension(key: &str, value: &str) -> Result<u32, ConfigError> {
    let dimension: u32 = value
        .parse()
        .map_err(|_| invalid(key, "Value must be a whole number"))?;
    if dimension == 0 || dimension % 2 != 0 {
        return Err(invalid(key, "Value must be positive and even"));
    }
    Ok(dimension)
}

fn check_canvas(key: &str, width: u32, height: u32, fps: u32) -> Result<(), ConfigError> {
    Canvas::new(width, height, fps)
        .map(|_| ())
        .map_err(|e| invalid(key, e.reason))
}

/// Parse a boolean value
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, "Value must be 'true' or 'false'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(key: &str, value: &str) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::empty();
        apply_value(&mut config, key, value)?;
        Ok(config)
    }

    #[test]
    fn bool_values() {
        assert!(parse_bool("notify", "true").unwrap());
        assert!(!parse_bool("notify", "FALSE").unwrap());
        assert!(parse_bool("notify", "yes").is_err());
    }

    #[test]
    fn durations_are_normalized() {
        let config = set("max_duration", "90s").unwrap();
        assert_eq!(config.max_duration.as_deref(), Some("1m30s"));
        assert!(set("export_timeout", "soon").is_err());
    }

    #[test]
    fn canvas_dimensions_must_be_even() {
        assert_eq!(set("canvas_width", "720").unwrap().canvas_width, Some(720));
        assert!(set("canvas_width", "721").is_err());
        assert!(set("canvas_width", "0").is_err());
        assert!(set("canvas_height", "1282").is_err(), "half height must stay even");
        assert_eq!(set("canvas_height", "1280").unwrap().canvas_height, Some(1280));
    }

    #[test]
    fn frame_rate_range() {
        assert_eq!(set("frame_rate", "60").unwrap().frame_rate, Some(60));
        assert!(set("frame_rate", "0").is_err());
        assert!(set("frame_rate", "fast").is_err());
    }

    #[test]
    fn container_must_be_known() {
        assert_eq!(set("container", "MOV").unwrap().container.as_deref(), Some("mov"));
        assert!(set("container", "avi").is_err());
    }

    #[test]
    fn capture_keys_create_section() {
        let config = set("capture.back_device", "/dev/video3").unwrap();
        assert_eq!(
            read_value(&config, "capture.back_device").as_deref(),
            Some("/dev/video3")
        );
        let config = set("capture.mirror_front", "false").unwrap();
        assert_eq!(read_value(&config, "capture.mirror_front").as_deref(), Some("false"));
        assert!(set("capture.front_device", "  ").is_err());
    }

    #[test]
    fn every_key_reads_unset_on_empty_config() {
        let config = AppConfig::empty();
        for key in VALID_CONFIG_KEYS {
            assert_eq!(read_value(&config, key), None, "{key}");
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            check_key("api_key"),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
