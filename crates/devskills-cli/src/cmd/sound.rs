use devskills_core::sound::{default_plugin_root, play, PlayOutcome};

/// Never fails: a hook must not block the assistant.
pub fn run(event: &str) -> anyhow::Result<()> {
    match play(&default_plugin_root(), event) {
        PlayOutcome::Played { player } => tracing::debug!(event, player = %player, "played"),
        PlayOutcome::MissingSound(path) => {
            tracing::debug!(event, path = %path.display(), "no sound file")
        }
        PlayOutcome::NoPlayer => tracing::debug!(event, "no audio player available"),
    }
    Ok(())
}
