use color_eyre::eyre::{eyre, Result};
use tokio::process::Command;

pub async fn open_in_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(target_os = "windows")]
    let cmd = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let cmd = "xdg-open";

    tracing::debug!("opening {url} with {cmd}");
    let status = Command::new(cmd)
        .arg(url)
        .status()
        .await
        .map_err(|e| eyre!("Failed to launch {cmd}: {e}"))?;
    if !status.success() {
        return Err(eyre!("{cmd} exited with {status}"));
    }
    Ok(())
}
