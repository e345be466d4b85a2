#![deny(clippy::all, clippy::pedantic)]

use postwire::Fetched;
use serde::Serialize;
use tracing::warn;

use crate::client::CliError;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))?;
    println!("{out}");
    Ok(())
}

/// Print whatever a read produced; a fallback is still printed but fails the command.
pub fn print_fetched<T: Serialize>(fetched: Fetched<T>) -> Result<(), CliError> {
    print_json(fetched.value())?;
    match fetched {
        Fetched::Fresh(_) => Ok(()),
        Fetched::Fallback { error, .. } => {
            warn!(target = "postwire_cli", error = %error, "printed fallback payload");
            Err(CliError::Degraded(error.to_string()))
        }
    }
}
