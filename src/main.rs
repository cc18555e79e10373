use anyhow::{Context, Result};
use log::debug;

use jscpdrs_cli::{Exit, LauncherConfig};
use jscpdrs_cli::cli::Cmd;
use jscpdrs_cli::config::LOG_ENV;
use jscpdrs_cli::install::runners;

fn main() {
    // Quiet by default: a forwarded run must look exactly like the native tool.
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "warn"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();

    let cmd = match Cmd::from_args(std::env::args_os()) {
        Ok(cmd) => cmd,
        Err(e) => e.exit(),
    };

    // Everything runs in sequence; one thread is all the launcher needs.
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let exit = match rt.block_on(real_main(cmd)) {
        Ok(exit) => exit,
        Err(e) => {
            runners::report_error(&e);
            Exit::Code(1)
        }
    };
    drop(rt);
    exit.exit_process();
}

async fn real_main(cmd: Cmd) -> Result<Exit> {
    let config =
        LauncherConfig::bundled().context("Failed to load the bundled launcher descriptor")?;
    debug!("{cmd:?} for {} {}", config.tool(), config.version());

    match cmd {
        Cmd::Install => runners::run_install(&config).await.map(|()| Exit::Code(0)),
        Cmd::Uninstall => runners::run_uninstall(&config).map(|()| Exit::Code(0)),
        Cmd::Run { args } => runners::run_tool(&config, args).await,
    }
}
