use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// String-keyed configuration bag shared between the front-end and the core.
///
/// The core only ever copies the keys it owns into an internal snapshot; the
/// front-end keeps mutating its own bag and pushes changes through
/// `reload_config_option`.
#[derive(Clone, Debug, Default)]
pub struct CoreConfig {
    values: BTreeMap<String, String>,
    directory: Option<PathBuf>,
}

impl CoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn unset(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get_value(key)?.trim().parse().ok()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get_value(key)?;
        match value.trim() {
            "true" | "yes" | "on" => Some(true),
            "false" | "no" | "off" => Some(false),
            other => other.parse::<i64>().ok().map(|n| n != 0),
        }
    }

    /// Copy a single key from another bag, dropping it if absent there.
    pub fn copy_value(&mut self, other: &CoreConfig, key: &str) {
        match other.get_value(key) {
            Some(value) => self.set(key, value),
            None => {
                self.values.remove(key);
            }
        }
    }

    /// Directory the front-end keeps configuration in; used for BIOS
    /// discovery fallbacks.
    pub fn set_directory(&mut self, path: impl Into<PathBuf>) {
        self.directory = Some(path.into());
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }
}

/// Typed snapshot of the options the façade owns outright.
#[derive(Clone, Debug)]
pub struct CoreOptions {
    pub mute: bool,
    pub volume: i32,
    pub frameskip: i32,
    pub skip_bios: bool,
    pub use_bios: bool,
    pub bios: Option<PathBuf>,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            mute: false,
            volume: 0x100,
            frameskip: 0,
            skip_bios: false,
            use_bios: true,
            bios: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing_accepts_words_and_numbers() {
        let mut config = CoreConfig::new();
        config.set("a", "true");
        config.set("b", "0");
        config.set("c", "2");
        config.set("d", "off");
        assert_eq!(config.get_bool("a"), Some(true));
        assert_eq!(config.get_bool("b"), Some(false));
        assert_eq!(config.get_bool("c"), Some(true));
        assert_eq!(config.get_bool("d"), Some(false));
        assert_eq!(config.get_bool("missing"), None);
    }

    #[test]
    fn copy_value_mirrors_presence() {
        let mut src = CoreConfig::new();
        src.set("gba.bios", "/tmp/bios.bin");
        let mut dst = CoreConfig::new();
        dst.set("gba.bios", "/old/path");
        dst.copy_value(&src, "gba.bios");
        assert_eq!(dst.get_value("gba.bios"), Some("/tmp/bios.bin"));
        src.unset("gba.bios");
        dst.copy_value(&src, "gba.bios");
        assert_eq!(dst.get_value("gba.bios"), None);
    }
}
