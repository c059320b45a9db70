//! Navigation primitive consumed by the palette.

use std::io;
use std::process::{Command as StdCommand, Stdio};

use tracing::{info, warn};

use crate::model::types::ResultItem;

pub trait Navigator {
    /// In-app route transition.
    fn push_route(&mut self, path: &str);

    /// Open `url` in a separate browser process.
    fn open_external(&mut self, url: &str) -> io::Result<()>;
}

/// Route `item` to the right primitive. Failures to open an external link
/// are logged and otherwise ignored.
pub fn navigate<N: Navigator + ?Sized>(item: &ResultItem, nav: &mut N) {
    if item.external {
        info!(href = %item.href, id = %item.id, "navigate_external");
        if let Err(err) = nav.open_external(&item.href) {
            warn!(href = %item.href, error = %err, "external navigation failed");
        }
    } else {
        info!(href = %item.href, id = %item.id, "navigate");
        nav.push_route(&item.href);
    }
}

/// Spawns the configured browser, or the platform opener, detached from the TUI.
#[derive(Debug, Clone, Default)]
pub struct ExternalOpener {
    browser: Option<String>,
}

impl ExternalOpener {
    pub fn new(browser: Option<String>) -> Self {
        Self {
            browser: browser.filter(|b| !b.trim().is_empty()),
        }
    }

    fn command(&self, url: &str) -> StdCommand {
        if let Some(browser) = &self.browser {
            let mut parts = browser.split_whitespace();
            let program = parts.next().unwrap_or("xdg-open");
            let mut cmd = StdCommand::new(program);
            cmd.args(parts).arg(url);
            return cmd;
        }
        if cfg!(target_os = "macos") {
            let mut cmd = StdCommand::new("open");
            cmd.arg(url);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = StdCommand::new("cmd");
            cmd.args(["/C", "start", ""]).arg(url);
            cmd
        } else {
            let mut cmd = StdCommand::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }

    pub fn open(&self, url: &str) -> io::Result<()> {
        self.command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }

    /// Program that would be launched, for diagnostics.
    pub fn program(&self, url: &str) -> String {
        self.command(url).get_program().to_string_lossy().into_owned()
    }
}
