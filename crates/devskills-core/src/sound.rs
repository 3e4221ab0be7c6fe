//! Notification sounds for assistant hook events.
//!
//! Playback is best effort. A missing sound file or player is reported back
//! to the caller as an outcome, never as an error.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Plugin directory exported by the host to hook commands.
pub const PLUGIN_ROOT_ENV: &str = "CLAUDE_PLUGIN_ROOT";
pub const SOUNDS_DIR: &str = "sounds";
pub const DEFAULT_SOUND: &str = "finished.mp3";

pub fn sound_file(event: &str) -> &'static str {
    match event {
        "session_start" => "ready.mp3",
        "stop" => "finished.mp3",
        "permission" => "human-input.mp3",
        _ => DEFAULT_SOUND,
    }
}

/// `$CLAUDE_PLUGIN_ROOT`, or the directory containing the running binary.
pub fn default_plugin_root() -> PathBuf {
    if let Some(root) = std::env::var_os(PLUGIN_ROOT_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(root);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn sound_path(plugin_root: &Path, event: &str) -> PathBuf {
    plugin_root.join(SOUNDS_DIR).join(sound_file(event))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Played { player: String },
    MissingSound(PathBuf),
    NoPlayer,
}

fn run_quiet(mut cmd: Command) -> bool {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    match cmd.status() {
        Ok(status) => status.success(),
        Err(e) => {
            tracing::debug!(error = %e, "player failed to start");
            false
        }
    }
}

fn powershell_script(path: &Path) -> String {
    let uri = path.display().to_string().replace('\'', "''");
    format!(
        "Add-Type -AssemblyName presentationCore\n\
         $m = New-Object System.Windows.Media.MediaPlayer\n\
         $m.Open([Uri]'{uri}')\n\
         Start-Sleep -Milliseconds 300\n\
         $m.Play()\n\
         Start-Sleep -Seconds 2\n"
    )
}

/// Candidate players for the current platform, in preference order.
fn players(path: &Path) -> Vec<(&'static str, Command)> {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("powershell.exe");
        cmd.arg("-Command").arg(powershell_script(path));
        vec![("powershell", cmd)]
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("afplay");
        cmd.arg(path);
        vec![("afplay", cmd)]
    } else {
        ["paplay", "aplay"]
            .into_iter()
            .filter_map(|name| {
                let bin = which::which(name).ok()?;
                let mut cmd = Command::new(bin);
                cmd.arg(path);
                Some((name, cmd))
            })
            .collect()
    }
}

pub fn play_file(path: &Path) -> PlayOutcome {
    if !path.is_file() {
        return PlayOutcome::MissingSound(path.to_path_buf());
    }
    for (name, cmd) in players(path) {
        if run_quiet(cmd) {
            return PlayOutcome::Played {
                player: name.to_string(),
            };
        }
    }
    PlayOutcome::NoPlayer
}

pub fn play(plugin_root: &Path, event: &str) -> PlayOutcome {
    let path = sound_path(plugin_root, event);
    let outcome = play_file(&path);
    tracing::debug!(event, path = %path.display(), ?outcome, "play sound");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn events_map_to_sound_files() {
        assert_eq!(sound_file("session_start"), "ready.mp3");
        assert_eq!(sound_file("stop"), "finished.mp3");
        assert_eq!(sound_file("permission"), "human-input.mp3");
        assert_eq!(sound_file("anything-else"), "finished.mp3");
    }

    #[test]
    fn sound_path_is_under_sounds_dir() {
        let path = sound_path(Path::new("/plugins/hooks"), "permission");
        assert_eq!(path, Path::new("/plugins/hooks/sounds/human-input.mp3"));
    }

    #[test]
    fn missing_sound_is_silent() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            play(dir.path(), "stop"),
            PlayOutcome::MissingSound(dir.path().join("sounds/finished.mp3"))
        );
    }

    #[test]
    fn powershell_script_escapes_quotes() {
        let script = powershell_script(Path::new("C:/it's/ready.mp3"));
        assert!(script.contains("[Uri]'C:/it''s/ready.mp3'"));
    }
}
