use ff_rs_game::scheduler::{BUFF_SWEEP_INTERVAL, MOB_STEP_INTERVAL, PLAYER_TICK_INTERVAL};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub world: WorldSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub timers: TimersSection,
    #[serde(default)]
    pub permissions: PermissionsSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    pub address: String,
    pub port: u16,
    pub motd: String,
    pub max_players: u32,
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    /// Path of the JSON content tables.
    #[serde(default = "default_content")]
    pub content: String,
    /// Directory holding one JSON record per player.
    #[serde(default = "default_player_data")]
    pub player_data: String,
    #[serde(default = "default_true")]
    pub simulate_mobs: bool,
    /// Auto-save interval in seconds. 0 = disabled. Default: 300 (5 minutes).
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval: u64,
}

fn default_content() -> String {
    "data/content.json".into()
}

fn default_player_data() -> String {
    "players".into()
}

fn default_true() -> bool {
    true
}

fn default_autosave_interval() -> u64 {
    300
}

/// Periodic job intervals in milliseconds.
#[derive(Debug, Deserialize)]
pub struct TimersSection {
    #[serde(default = "default_mob_step_ms")]
    pub mob_step_ms: u64,
    #[serde(default = "default_player_tick_ms")]
    pub player_tick_ms: u64,
    #[serde(default = "default_buff_sweep_ms")]
    pub buff_sweep_ms: u64,
}

fn default_mob_step_ms() -> u64 {
    MOB_STEP_INTERVAL
}

fn default_player_tick_ms() -> u64 {
    PLAYER_TICK_INTERVAL
}

fn default_buff_sweep_ms() -> u64 {
    BUFF_SWEEP_INTERVAL
}

impl Default for TimersSection {
    fn default() -> Self {
        Self {
            mob_step_ms: default_mob_step_ms(),
            player_tick_ms: default_player_tick_ms(),
            buff_sweep_ms: default_buff_sweep_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PermissionsSection {
    /// Accounts at or below this level may use GM packets.
    #[serde(default = "default_gm_account_level")]
    pub gm_account_level: i32,
}

fn default_gm_account_level() -> i32 {
    30
}

impl Default for PermissionsSection {
    fn default() -> Self {
        Self {
            gm_account_level: default_gm_account_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        address = "0.0.0.0"
        port = 23001
        motd = "Test Shard"
        max_players = 20

        [world]

        [logging]
        level = "debug"
    "#;

    #[test]
    fn parse_config() {
        let config: ServerConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.server.port, 23001);
        assert_eq!(config.server.motd, "Test Shard");
        assert_eq!(config.server.max_players, 20);
        assert_eq!(config.world.content, "data/content.json");
        assert_eq!(config.world.player_data, "players");
        assert!(config.world.simulate_mobs);
        assert_eq!(config.world.autosave_interval, 300);
        assert_eq!(config.logging.level, "debug");
        // timers and permissions default when absent
        assert_eq!(config.timers.mob_step_ms, 200);
        assert_eq!(config.timers.player_tick_ms, 4000);
        assert_eq!(config.timers.buff_sweep_ms, 1000);
        assert_eq!(config.permissions.gm_account_level, 30);
    }

    #[test]
    fn parse_config_with_overrides() {
        let toml_str = r#"
            [server]
            address = "127.0.0.1"
            port = 23002
            motd = "Dev"
            max_players = 5

            [world]
            content = "content/dev.json"
            player_data = "/tmp/players"
            simulate_mobs = false
            autosave_interval = 0

            [timers]
            mob_step_ms = 100

            [permissions]
            gm_account_level = 50

            [logging]
            level = "trace"
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.world.content, "content/dev.json");
        assert!(!config.world.simulate_mobs);
        assert_eq!(config.world.autosave_interval, 0);
        assert_eq!(config.timers.mob_step_ms, 100);
        assert_eq!(config.timers.player_tick_ms, 4000);
        assert_eq!(config.permissions.gm_account_level, 50);
    }

    #[test]
    fn missing_server_section_is_an_error() {
        let toml_str = r#"
            [world]
            [logging]
            level = "info"
        "#;
        assert!(toml::from_str::<ServerConfig>(toml_str).is_err());
    }
}
