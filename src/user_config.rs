use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".config";
const APP_CONFIG_DIR: &str = "sipsound";
const CONFIG_FILE_NAME: &str = "config.yml";

#[derive(Clone)]
pub struct UserConfigPaths {
  pub config_file_path: PathBuf,
}

/// On-disk shape: everything optional so a partial file only overrides what
/// it names.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorConfigString {
  pub tick_rate_milliseconds: Option<u64>,
  pub volume_step_percent: Option<u8>,
}

#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfigString {
  pub url: Option<String>,
  pub token: Option<String>,
}

#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserConfigString {
  behavior: Option<BehaviorConfigString>,
  server: Option<ServerConfigString>,
}

#[derive(Clone)]
pub struct BehaviorConfig {
  pub tick_rate_milliseconds: u64,
  pub volume_step_percent: u8,
}

#[derive(Clone)]
pub struct ServerConfig {
  pub url: String,
  pub token: Option<String>,
}

#[derive(Clone)]
pub struct UserConfig {
  pub behavior: BehaviorConfig,
  pub server: ServerConfig,
  pub path_to_config: Option<UserConfigPaths>,
}

impl UserConfig {
  pub fn new() -> UserConfig {
    UserConfig {
      behavior: BehaviorConfig {
        tick_rate_milliseconds: 100,
        volume_step_percent: 5,
      },
      server: ServerConfig {
        url: "http://localhost:3001".to_string(),
        token: None,
      },
      path_to_config: None,
    }
  }

  pub fn get_or_build_paths(&mut self) -> Result<()> {
    match dirs::home_dir() {
      Some(home) => {
        let path = Path::new(&home);
        let home_config_dir = path.join(CONFIG_DIR);
        let app_config_dir = home_config_dir.join(APP_CONFIG_DIR);

        if !home_config_dir.exists() {
          fs::create_dir(&home_config_dir)?;
        }
        if !app_config_dir.exists() {
          fs::create_dir(&app_config_dir)?;
        }

        let config_file_path = app_config_dir.join(CONFIG_FILE_NAME);
        self.path_to_config = Some(UserConfigPaths { config_file_path });
        Ok(())
      }
      None => Err(anyhow!("no $HOME directory found for the config file")),
    }
  }

  pub fn load_config(&mut self) -> Result<()> {
    if self.path_to_config.is_none() {
      self.get_or_build_paths()?;
    }
    let path = match &self.path_to_config {
      Some(paths) => paths.config_file_path.clone(),
      None => return Ok(()),
    };
    self.load_config_from(&path)
  }

  /// Merge the file at `path` over the defaults. A missing or empty file
  /// leaves the defaults untouched.
  pub fn load_config_from(&mut self, path: &Path) -> Result<()> {
    if !path.exists() {
      return Ok(());
    }
    let config_string = fs::read_to_string(path)?;
    // serde fails if the file is empty
    if config_string.trim().is_empty() {
      return Ok(());
    }

    let config_yml: UserConfigString = serde_yaml::from_str(&config_string)?;

    if let Some(behavior) = config_yml.behavior {
      if let Some(tick_rate) = behavior.tick_rate_milliseconds {
        if tick_rate < 10 {
          return Err(anyhow!("tick_rate_milliseconds must be at least 10"));
        }
        self.behavior.tick_rate_milliseconds = tick_rate;
      }
      if let Some(step) = behavior.volume_step_percent {
        if step == 0 || step > 50 {
          return Err(anyhow!("volume_step_percent must be between 1 and 50"));
        }
        self.behavior.volume_step_percent = step;
      }
    }

    if let Some(server) = config_yml.server {
      if let Some(url) = server.url {
        self.server.url = url;
      }
      if server.token.is_some() {
        self.server.token = server.token;
      }
    }

    Ok(())
  }
}

impl Default for UserConfig {
  fn default() -> Self {
    UserConfig::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn load(yaml: &str) -> Result<UserConfig> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", yaml).unwrap();
    let mut config = UserConfig::new();
    config.load_config_from(file.path())?;
    Ok(config)
  }

  #[test]
  fn partial_file_merges_over_defaults() {
    let config = load(
      "server:\n  url: http://music.local:8080\nbehavior:\n  tick_rate_milliseconds: 250\n",
    )
    .unwrap();
    assert_eq!(config.server.url, "http://music.local:8080");
    assert_eq!(config.behavior.tick_rate_milliseconds, 250);
    // untouched fields keep their defaults
    assert_eq!(config.behavior.volume_step_percent, 5);
    assert!(config.server.token.is_none());
  }

  #[test]
  fn empty_file_keeps_defaults() {
    let config = load("").unwrap();
    assert_eq!(config.server.url, "http://localhost:3001");
    assert_eq!(config.behavior.tick_rate_milliseconds, 100);
  }

  #[test]
  fn out_of_range_values_are_rejected() {
    assert!(load("behavior:\n  tick_rate_milliseconds: 1\n").is_err());
    assert!(load("behavior:\n  volume_step_percent: 90\n").is_err());
  }

  #[test]
  fn missing_file_is_fine() {
    let mut config = UserConfig::new();
    assert!(config
      .load_config_from(Path::new("/definitely/not/here.yml"))
      .is_ok());
  }
}
