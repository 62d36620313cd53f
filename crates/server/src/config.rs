use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub events_buffer: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8090".into(),
            events_buffer: 256,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file_overrides(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Ok(v) = std::env::var("APP__EVENTS_BUFFER") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.events_buffer = parsed;
        }
    }

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("events_buffer") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.events_buffer = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_to_loopback() {
        let settings = Settings::default();
        assert_eq!(settings.server_bind, "127.0.0.1:8090");
        assert_eq!(settings.events_buffer, 256);
    }

    #[test]
    fn file_overrides_replace_bind_addr() {
        let mut settings = Settings::default();
        apply_file_overrides(
            &mut settings,
            "bind_addr = \"0.0.0.0:9000\"\nevents_buffer = \"64\"\n",
        );
        assert_eq!(settings.server_bind, "0.0.0.0:9000");
        assert_eq!(settings.events_buffer, 64);
    }

    #[test]
    fn malformed_file_and_values_are_ignored() {
        let mut settings = Settings::default();
        apply_file_overrides(&mut settings, "not really toml [");
        apply_file_overrides(&mut settings, "events_buffer = \"plenty\"\n");
        assert_eq!(settings.server_bind, "127.0.0.1:8090");
        assert_eq!(settings.events_buffer, 256);
    }
}
