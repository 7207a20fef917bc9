use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::StoreError;

/// Copies a local file to a path on a replica machine.
pub trait Transport: Send + Sync {
    fn copy(&self, source: &Path, machine: &str, destination: &Path) -> Result<(), StoreError>;
}

/// Replicates over ssh: creates the destination directory with `ssh mkdir -p`,
/// then copies the file with `scp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScpTransport;

impl Transport for ScpTransport {
    fn copy(&self, source: &Path, machine: &str, destination: &Path) -> Result<(), StoreError> {
        if let Some(dir) = destination.parent() {
            run(
                Command::new("ssh")
                    .arg("-o")
                    .arg("BatchMode=yes")
                    .arg(machine)
                    .arg("mkdir")
                    .arg("-p")
                    .arg(dir),
                machine,
            )?;
        }
        run(
            Command::new("scp")
                .arg("-q")
                .arg("-B")
                .arg(source)
                .arg(format!("{machine}:{}", destination.display())),
            machine,
        )
    }
}

fn run(command: &mut Command, machine: &str) -> Result<(), StoreError> {
    let output = command.stdin(Stdio::null()).output()?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(StoreError::Replication {
        machine: machine.to_string(),
        reason: format!("{} ({})", stderr.trim(), output.status),
    })
}
