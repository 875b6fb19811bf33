//! Configuration management for iu.
//!
//! The config is a single JSON file (`~/.iu` by default) holding a set of
//! named upload targets and the name of the active one:
//!
//! ```json
//! {
//!     "Active": "default",
//!     "Uploader": {
//!         "default": {
//!             "URL": "https://example.com/upload",
//!             "ResultGetter": "data.url",
//!             "Header": { "Authorization": ["Bearer ..."] }
//!         }
//!     }
//! }
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::{
    collections::BTreeMap,
    env,
    error::Error,
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

const CONFIG_FILE_NAME: &str = ".iu";
const DEFAULT_UPLOADER: &str = "default";

/// Represents the user configuration.
#[derive(Serialize, Deserialize, Default, Debug)]
#[cfg_attr(test, derive(Clone, PartialEq, Eq))]
#[serde(default)]
pub struct Config {
    /// Name of the upload target used when none is given on the command line.
    #[serde(rename = "Active")]
    pub active: String,

    /// All configured upload targets, keyed by name.
    #[serde(rename = "Uploader")]
    pub uploaders: BTreeMap<String, Target>,
}

/// A single upload endpoint.
#[derive(Serialize, Deserialize, Default, Debug)]
#[cfg_attr(test, derive(Clone, PartialEq, Eq))]
#[serde(default)]
pub struct Target {
    /// Endpoint that receives the multipart POST.
    #[serde(rename = "URL")]
    pub url: String,

    /// Dotted path to the result URL in the JSON response, e.g. `data.url`.
    #[serde(rename = "ResultGetter")]
    pub result_getter: String,

    /// Extra request headers. Each value is sent as a separate header line.
    #[serde(rename = "Header")]
    pub header: BTreeMap<String, Vec<String>>,
}

/// Errors that can occur during configuration loading or saving.
#[derive(Debug)]
pub enum ConfigError {
    /// Could not determine the home directory
    NoHome,
    /// I/O error accessing config file
    Io(io::Error),
    /// Failed to deserialize config file
    Deserialize(serde_json::Error),
    /// The requested uploader is not defined in the config
    UnknownUploader(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoHome => {
                write!(f, "Could not determine home directory")
            }
            ConfigError::Io(err) => {
                write!(f, "I/O error accessing config file: {err}")
            }
            ConfigError::Deserialize(err) => {
                write!(f, "Failed to parse config file: {err}")
            }
            ConfigError::UnknownUploader(name) => {
                write!(f, "Unknown uploader: {name}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Deserialize(err) => Some(err),
            ConfigError::NoHome | ConfigError::UnknownUploader(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

/// Gets the path to the configuration file in the user's home directory.
///
/// Returns `None` if the home directory cannot be determined.
pub fn default_path() -> Option<PathBuf> {
    let mut path = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)?;
    path.push(CONFIG_FILE_NAME);
    Some(path)
}

impl Config {
    /// The config written on first run: a single empty placeholder target
    /// that is also the active one.
    pub fn placeholder() -> Config {
        let mut uploaders = BTreeMap::new();
        uploaders.insert(DEFAULT_UPLOADER.to_string(), Target::default());
        Config {
            active: DEFAULT_UPLOADER.to_string(),
            uploaders,
        }
    }

    /// Writes the placeholder config to `path` unless a file already exists
    /// there. An existing file is never touched.
    pub fn ensure_exists(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Ok(());
        }

        match Config::placeholder().save_to_path(path) {
            Ok(()) => {
                info!(
                    "Created config at {}; fill in an uploader and re-run",
                    path.display()
                );
                Ok(())
            }
            // Someone else created it between the check and the write.
            Err(ConfigError::Io(err))
                if err.kind() == io::ErrorKind::AlreadyExists =>
            {
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Loads the configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        debug!("Loading config from: {}", path.display());
        let contents = fs::read_to_string(path)?;
        serde_json::from_str::<Config>(&contents)
            .map_err(ConfigError::Deserialize)
    }

    /// Saves the configuration to a new file at `path`.
    ///
    /// Creates the parent directory if it doesn't exist. Fails with
    /// `AlreadyExists` if the file is already there.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        debug!("Saving config to: {}", path.display());
        if let Some(parent_dir) = path.parent() {
            if !parent_dir.as_os_str().is_empty() {
                fs::create_dir_all(parent_dir)?;
            }
        }

        let contents = self.to_json_pretty()?;

        let mut file_opts = fs::OpenOptions::new();
        file_opts.write(true).create_new(true);

        // Headers usually hold API tokens, so set permissions to -rw-------
        #[cfg(unix)]
        file_opts.mode(0o600);

        let mut file = file_opts.open(path)?;
        file.write_all(&contents)?;
        Ok(())
    }

    /// Returns the target called `name`.
    pub fn target(&self, name: &str) -> Result<&Target, ConfigError> {
        self.uploaders
            .get(name)
            .ok_or_else(|| ConfigError::UnknownUploader(name.to_string()))
    }

    /// Serializes with a 4-space indent.
    fn to_json_pretty(&self) -> Result<Vec<u8>, ConfigError> {
        let mut contents = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser =
            serde_json::Serializer::with_formatter(&mut contents, formatter);
        self.serialize(&mut ser).map_err(io::Error::from)?;
        contents.push(b'\n');
        Ok(contents)
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    // Helper to create a config path within a temporary directory
    fn temp_config_path(temp_dir: &tempfile::TempDir) -> PathBuf {
        temp_dir.path().join(CONFIG_FILE_NAME)
    }

    #[test]
    fn test_default_path_ends_with_file_name() {
        if let Some(path) = default_path() {
            assert!(path.ends_with(CONFIG_FILE_NAME));
        }
    }

    #[test]
    fn test_load_config_non_existent() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_config_path(&temp_dir);
        assert!(!config_path.exists());

        let result = Config::load_from_path(&config_path);
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_bootstrap_then_load() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_config_path(&temp_dir);

        Config::ensure_exists(&config_path).unwrap();
        assert!(config_path.exists());

        #[cfg(unix)]
        {
            let metadata = fs::metadata(&config_path).unwrap();
            assert_eq!(
                metadata.permissions().mode() & 0o777,
                0o600,
                "Permissions should be 0o600"
            );
        }

        let config = Config::load_from_path(&config_path).unwrap();
        assert_eq!(config, Config::placeholder());

        // The active name must point at a defined target.
        let target = config.target(&config.active).unwrap();
        assert_eq!(target, &Target::default());
    }

    #[test]
    fn test_bootstrap_creates_parent_dirs() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("dir").join("iu");

        Config::ensure_exists(&config_path).unwrap();
        assert!(config_path.exists());
    }

    #[test]
    fn test_bootstrap_keeps_existing_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_config_path(&temp_dir);
        let existing = r#"{"Active": "mine", "Uploader": {}}"#;
        fs::write(&config_path, existing).unwrap();

        Config::ensure_exists(&config_path).unwrap();

        assert_eq!(fs::read_to_string(&config_path).unwrap(), existing);
    }

    #[test]
    fn test_placeholder_file_format() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_config_path(&temp_dir);
        Config::ensure_exists(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        let expected = "{\n    \"Active\": \"default\",\n    \"Uploader\": {\n        \"default\": {\n            \"URL\": \"\",\n            \"ResultGetter\": \"\",\n            \"Header\": {}\n        }\n    }\n}\n";
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_load_full_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_config_path(&temp_dir);
        fs::write(
            &config_path,
            r#"{
                "Active": "smms",
                "Uploader": {
                    "smms": {
                        "URL": "https://sm.ms/api/v2/upload",
                        "ResultGetter": "data.url",
                        "Header": {"Authorization": ["token"], "X-Multi": ["a", "b"]}
                    },
                    "other": {"URL": "http://localhost/upload"}
                }
            }"#,
        )
        .unwrap();

        let config = Config::load_from_path(&config_path).unwrap();
        assert_eq!(config.active, "smms");

        let smms = config.target("smms").unwrap();
        assert_eq!(smms.url, "https://sm.ms/api/v2/upload");
        assert_eq!(smms.result_getter, "data.url");
        assert_eq!(smms.header["X-Multi"], vec!["a", "b"]);

        // Missing fields fall back to empty values.
        let other = config.target("other").unwrap();
        assert_eq!(other.result_getter, "");
        assert!(other.header.is_empty());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_config_path(&temp_dir);
        fs::write(&config_path, "not json").unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_load_wrong_shape() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_config_path(&temp_dir);
        fs::write(&config_path, r#"{"Active": 1, "Uploader": []}"#).unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_unknown_uploader() {
        let config = Config::placeholder();
        let err = config.target("missing").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownUploader(ref name) if name == "missing"));
        assert_eq!(err.to_string(), "Unknown uploader: missing");
    }
}
