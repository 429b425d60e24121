//! Open rendered images in the platform viewer

use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Launch the default viewer for `path` without waiting for it.
///
/// Returns whether the viewer process started; a failure is only logged.
pub fn open_in_viewer(path: &Path) -> bool {
    let mut command = opener_command(path);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    match command.spawn() {
        Ok(_) => {
            debug!("Opened {} in viewer", path.display());
            true
        }
        Err(e) => {
            warn!("Could not open {} in a viewer: {}", path.display(), e);
            false
        }
    }
}

fn opener_command(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}
