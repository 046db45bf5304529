use super::CliError;
use anyhow::Context;
use febpost_core::io::SaveTarget;
use std::path::Path;

/// Install the stderr subscriber once per process; the filter comes from the
/// standard environment variable and defaults to warnings only.
pub(super) fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(super) fn save_target(save: Option<String>, in_place: bool) -> SaveTarget {
    if in_place {
        SaveTarget::Overwrite
    } else if let Some(name) = save {
        SaveTarget::Named(name)
    } else {
        SaveTarget::Default
    }
}

/// Stage the parent directory of an explicit output path before the core
/// writes into it.
pub(super) fn ensure_parent_dir(path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create output directory '{}'", parent.display())
        })?;
    }
    Ok(())
}
