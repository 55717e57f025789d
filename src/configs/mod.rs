/*
This code is part of the WhiteboxTools geospatial analysis library.
Authors: WhiteboxTools developers
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use crate::error::{Result, ShapefileError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// How records are made available after a shapefile is opened.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Decode each record on request through the .shx index.
    #[default]
    Index,
    /// Decode every record up front and keep them in memory.
    Loaded,
}

/// What a full load does with a record whose header disagrees with the
/// index or whose content is malformed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorruptRecordPolicy {
    #[default]
    Abort,
    Skip,
}

/// A structure to hold reader settings. Backed by settings.json file in the
/// working directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Configs {
    pub verbose_mode: bool,
    pub read_mode: ReadMode,
    pub corrupt_record_policy: CorruptRecordPolicy,
    pub rebuild_missing_index: bool,
}

impl Default for Configs {
    fn default() -> Configs {
        Configs {
            verbose_mode: false,
            read_mode: ReadMode::Index,
            corrupt_record_policy: CorruptRecordPolicy::Abort,
            rebuild_missing_index: true,
        }
    }
}

fn config_file() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join("settings.json"))
}

/// Reads settings.json from the working directory, falling back to the
/// defaults when there is none.
pub fn get_configs() -> Result<Configs> {
    read_configs(&config_file()?)
}

pub fn read_configs(path: &Path) -> Result<Configs> {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).map_err(|e| ShapefileError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Configs::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn save_configs(configs: &Configs) -> Result<()> {
    write_configs(configs, &config_file()?)
}

pub fn write_configs(configs: &Configs, path: &Path) -> Result<()> {
    let configs_json =
        serde_json::to_string_pretty(configs).map_err(|e| ShapefileError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let mut file = File::create(path)?;
    file.write_all(configs_json.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_configs_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(read_configs(&path).unwrap(), Configs::default());

        let configs = Configs {
            verbose_mode: true,
            read_mode: ReadMode::Loaded,
            corrupt_record_policy: CorruptRecordPolicy::Skip,
            rebuild_missing_index: false,
        };
        write_configs(&configs, &path).unwrap();
        assert_eq!(read_configs(&path).unwrap(), configs);

        // missing keys take their defaults
        fs::write(&path, r#"{ "read_mode": "loaded" }"#).unwrap();
        let partial = read_configs(&path).unwrap();
        assert_eq!(partial.read_mode, ReadMode::Loaded);
        assert!(partial.rebuild_missing_index);

        fs::write(&path, "not json").unwrap();
        assert!(matches!(read_configs(&path), Err(ShapefileError::Config { .. })));

        // only a missing file falls back to the defaults
        assert!(matches!(read_configs(dir.path()), Err(ShapefileError::Io(_))));
    }
}
