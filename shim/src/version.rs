// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::io::Write;

use tokio::process::Command;

use crate::errors::ShimError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes the shim version, then the version reported by `command`.
///
/// The shim's own line is written first so it is available even when the
/// child cannot be run.
pub async fn show_version<W: Write>(command: &str, out: &mut W) -> Result<(), ShimError> {
    writeln!(out, "{} version {}", env!("CARGO_PKG_NAME"), VERSION)?;

    let output = Command::new(command)
        .args(["--version", "--disable-version-check"])
        .output()
        .await
        .map_err(|source| ShimError::Spawn {
            command: command.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ShimError::Version {
            command: command.to_string(),
            status: output.status.to_string(),
        });
    }

    out.write_all(&output.stdout)?;
    out.write_all(&output.stderr)?;
    out.flush()?;

    Ok(())
}
