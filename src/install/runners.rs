//! Command runners for the launcher CLI (install, uninstall, run)
//!
//! Status lines for install/uninstall go to stdout. `run` prints nothing of
//! its own so the forwarded tool's output is all the caller sees.

use std::ffi::OsString;
use std::io::Write;

use anyhow::{Context, Result};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::forward::{Exit, Invocation};
use super::manager::BinaryManager;
use crate::config::LauncherConfig;

/// Download and install the release matching this launcher
pub async fn run_install(config: &LauncherConfig) -> Result<()> {
    let manager = BinaryManager::from_config(config)?;
    let release = manager.release()?;

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(
        stdout,
        "🔧 Installing {} {} ({})",
        release.tool,
        release.tag(),
        release.platform
    );
    let _ = stdout.reset();

    let receipt = manager.install().await.context("Installation failed")?;

    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    let _ = writeln!(
        stdout,
        "✅ Installed to {}",
        manager.layout().binary_path().display()
    );
    let _ = stdout.reset();
    let _ = writeln!(stdout, "   Source: {}", receipt.url);

    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
    let _ = writeln!(
        stdout,
        "   ⚠ Archive not verified (no published checksum); SHA-256 {}",
        receipt.archive_sha256
    );
    let _ = stdout.reset();

    Ok(())
}

/// Remove the cached installation
pub fn run_uninstall(config: &LauncherConfig) -> Result<()> {
    let manager = BinaryManager::from_config(config)?;
    let removed = manager.uninstall().context("Uninstallation failed")?;

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    if removed {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = writeln!(
            stdout,
            "✅ Removed {} from {}",
            config.tool(),
            manager.layout().dir().display()
        );
    } else {
        let _ = writeln!(
            stdout,
            "Nothing to uninstall at {}",
            manager.layout().dir().display()
        );
    }
    let _ = stdout.reset();
    Ok(())
}

/// Run the tool with `args`, installing it on first use. Returns how it exited.
pub async fn run_tool(config: &LauncherConfig, args: Vec<OsString>) -> Result<Exit> {
    let manager = BinaryManager::from_config(config)?;
    Ok(manager.run(Invocation::new(args)).await?)
}

/// Print an error and its causes to stderr
pub fn report_error(err: &anyhow::Error) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "error:");
    let _ = stderr.reset();
    let _ = writeln!(stderr, " {err:#}");
}
