use std::ffi::OsString;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "jscpdrs-cli",
    version,
    about = "Fetches, caches and runs the native jscpd-rs copy/paste detector",
    disable_help_subcommand = true
)]
pub struct Args {
    #[command(subcommand)]
    pub sub: Cmd,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Cmd {
    /// Download the native tool for this platform into the local cache
    Install,
    /// Remove the cached native tool
    Uninstall,
    /// Run the native tool with every following argument (the default)
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
}

impl Cmd {
    /// Select the launcher operation for a full argv (program name first).
    ///
    /// Only a leading `install`, `uninstall` or `run` selects an operation;
    /// anything else, flags included, is forwarded verbatim to the tool.
    /// `run` forwards whatever follows it, so `run install` passes `install`
    /// through.
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let selector = args.get(1).and_then(|a| a.to_str()).map(str::to_owned);
        match selector.as_deref() {
            Some("run") => Ok(Cmd::Run {
                args: args.into_iter().skip(2).collect(),
            }),
            Some("install" | "uninstall") => Args::try_parse_from(args).map(|a| a.sub),
            _ => Ok(Cmd::Run {
                args: args.into_iter().skip(1).collect(),
            }),
        }
    }
}
