// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config location.

use std::path::PathBuf;

const CONFIG_FILE: &str = "config.json";

/// Directory holding Folio's settings. Not created here; a missing
/// directory simply means defaults.
pub fn config_dir() -> PathBuf {
    config_base().join("folio")
}

/// Default settings file, used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

fn config_base() -> PathBuf {
    // Try XDG config dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    // Last resort
    PathBuf::from("/tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_lives_under_folio() {
        let path = default_config_path();
        assert!(path.ends_with("folio/config.json"));
    }
}
