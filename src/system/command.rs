use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::HostSystem;
use crate::error::SubsystemError;

const SUBSCRIPTION_MANAGER: &str = "/usr/sbin/subscription-manager";
const INSIGHTS_CLIENT: &str = "/usr/bin/insights-client";
const SYSTEMCTL: &str = "/usr/bin/systemctl";
const RHSM_CONF: &str = "/etc/rhsm/rhsm.conf";

const YGGDRASIL_SERVICE: &str = "yggdrasil.service";
const FACTS_TIMER: &str = "rhc-canonical-facts.timer";
const FACTS_SERVICE: &str = "rhc-canonical-facts.service";

/// [`HostSystem`] backed by subscription-manager, insights-client and
/// systemctl.
#[derive(Debug, Clone)]
pub struct CommandHost {
    cert_file: PathBuf,
    rhsm_conf: PathBuf,
}

impl CommandHost {
    pub fn new(cert_file: impl Into<PathBuf>) -> Self {
        Self {
            cert_file: cert_file.into(),
            rhsm_conf: PathBuf::from(RHSM_CONF),
        }
    }

    pub fn with_rhsm_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.rhsm_conf = path.into();
        self
    }

    fn run(program: &str, args: &[&str]) -> Result<Output, SubsystemError> {
        tracing::debug!("executing {} {}", program, args.join(" "));
        Command::new(program)
            .args(args)
            .output()
            .map_err(|source| SubsystemError::Spawn {
                program: program.to_string(),
                source,
            })
    }

    /// Run a command that must exit successfully.
    fn run_checked(program: &str, args: &[&str]) -> Result<Output, SubsystemError> {
        let output = Self::run(program, args)?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(command_failed(program, args, &output))
        }
    }
}

fn command_failed(program: &str, args: &[&str], output: &Output) -> SubsystemError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    };
    SubsystemError::CommandFailed {
        command: format!("{} {}", program, args.join(" ")),
        message,
    }
}

/// Read `manage_repos` from the `[rhsm]` section of an rhsm.conf file.
/// A missing option means repositories are managed.
pub fn manage_repos_enabled(conf: &str) -> bool {
    let mut in_rhsm = false;
    for line in conf.lines().map(str::trim) {
        if line.starts_with('#') || line.starts_with(';') || line.is_empty() {
            continue;
        }
        if line.starts_with('[') {
            in_rhsm = line == "[rhsm]";
            continue;
        }
        if !in_rhsm {
            continue;
        }
        if let Some((key, value)) = line.split_once(['=', ':']) {
            if key.trim() == "manage_repos" {
                return value.trim() == "1";
            }
        }
    }
    true
}

fn read_conf(path: &Path) -> Result<String, SubsystemError> {
    fs::read_to_string(path).map_err(|source| SubsystemError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl HostSystem for CommandHost {
    fn is_registered(&self) -> bool {
        self.cert_file.exists()
    }

    fn content_enabled(&self) -> Result<bool, SubsystemError> {
        read_conf(&self.rhsm_conf).map(|conf| manage_repos_enabled(&conf))
    }

    fn set_content_enabled(&self, enabled: bool) -> Result<(), SubsystemError> {
        let flag = if enabled {
            "--rhsm.manage_repos=1"
        } else {
            "--rhsm.manage_repos=0"
        };
        Self::run_checked(SUBSCRIPTION_MANAGER, &["config", flag])?;
        tracing::debug!("content management set to {} in rhsm.conf", enabled);
        Ok(())
    }

    fn analytics_registered(&self) -> Result<bool, SubsystemError> {
        let args = ["--status"];
        let output = Self::run(INSIGHTS_CLIENT, &args)?;
        if output.status.success() {
            return Ok(true);
        }
        // A bare non-zero exit only means "not registered"; anything on
        // stderr is a real failure.
        if output.stderr.iter().all(u8::is_ascii_whitespace) {
            Ok(false)
        } else {
            Err(command_failed(INSIGHTS_CLIENT, &args, &output))
        }
    }

    fn register_analytics(&self) -> Result<(), SubsystemError> {
        Self::run_checked(INSIGHTS_CLIENT, &["--register"]).map(drop)
    }

    fn unregister_analytics(&self) -> Result<(), SubsystemError> {
        Self::run_checked(INSIGHTS_CLIENT, &["--unregister"]).map(drop)
    }

    fn remote_management_active(&self) -> Result<bool, SubsystemError> {
        // is-active exits non-zero for inactive units, so only stdout matters.
        let output = Self::run(SYSTEMCTL, &["is-active", YGGDRASIL_SERVICE])?;
        Ok(String::from_utf8_lossy(&output.stdout).trim() == "active")
    }

    fn activate_remote_management(&self) -> Result<(), SubsystemError> {
        Self::run_checked(SYSTEMCTL, &["enable", "--now", FACTS_TIMER])?;
        // Facts must exist before yggdrasil starts.
        Self::run_checked(SYSTEMCTL, &["start", FACTS_SERVICE])?;
        Self::run_checked(SYSTEMCTL, &["enable", "--now", YGGDRASIL_SERVICE])?;
        tracing::debug!("{} activated", YGGDRASIL_SERVICE);
        Ok(())
    }

    fn deactivate_remote_management(&self) -> Result<(), SubsystemError> {
        Self::run_checked(SYSTEMCTL, &["disable", "--now", FACTS_TIMER])?;
        Self::run_checked(SYSTEMCTL, &["disable", "--now", YGGDRASIL_SERVICE])?;
        tracing::debug!("{} deactivated", YGGDRASIL_SERVICE);
        Ok(())
    }
}
