use anyhow::Result;
use clap::Args;
use mars_common::Layout;
use std::path::PathBuf;

/// Options shared by every command that touches the data directory.
#[derive(Debug, Clone, Args)]
pub struct RootOpts {
    /// Supervisor data directory (defaults to ~/.marscredit)
    #[clap(long)]
    pub data_dir: Option<PathBuf>,
}

impl RootOpts {
    pub fn layout(&self) -> Result<Layout> {
        match &self.data_dir {
            Some(dir) => Ok(Layout::new(dir)),
            None => Layout::default_root(),
        }
    }
}

/// Prompt for a password unless one was passed on the command line.
pub fn resolve_password(flag: &Option<String>, prompt: &str) -> Result<String> {
    match flag {
        Some(password) => Ok(password.clone()),
        None => Ok(rpassword::prompt_password(prompt)?),
    }
}
