pub mod clean;
pub mod history;
pub mod menu;
pub mod sql;
pub mod tables;
pub mod verify;

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::collection::{self, MergeSpec};
use crate::config::OraConfig;
use crate::error::SchemaError;
use crate::schema::teardown::CancelToken;

/// Routes Ctrl-C to whichever teardown is running.
///
/// While a guard from [`InterruptSlot::arm`] is alive, an interrupt cancels
/// that run's token; otherwise there is nothing to stop and the caller decides
/// (the binary exits).
#[derive(Debug, Clone, Default)]
pub struct InterruptSlot(Arc<Mutex<Option<CancelToken>>>);

/// Keeps a fresh token armed until dropped.
pub struct ArmedToken<'a> {
    slot: &'a InterruptSlot,
    token: CancelToken,
}

impl ArmedToken<'_> {
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Drop for ArmedToken<'_> {
    fn drop(&mut self) {
        if let Ok(mut armed) = self.slot.0.lock() {
            *armed = None;
        }
    }
}

impl InterruptSlot {
    pub fn arm(&self) -> ArmedToken<'_> {
        let token = CancelToken::default();
        if let Ok(mut armed) = self.0.lock() {
            *armed = Some(token.clone());
        }
        ArmedToken { slot: self, token }
    }

    /// Cancel the armed run. Returns `false` when nothing is armed.
    pub fn interrupt(&self) -> bool {
        match self.0.lock() {
            Ok(armed) => match armed.as_ref() {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

/// Ask a yes/no question on stdout and read the answer from `input`.
/// Accepts `yes`, `y`, `sim` and `s` (any case); EOF counts as no.
pub fn confirm(question: &str, input: &mut impl BufRead) -> Result<bool> {
    print!("{question} (yes/no): ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "yes" | "y" | "sim" | "s"
    ))
}

/// Print a failed statement with its operator hint, if any.
pub fn print_error(err: &SchemaError) {
    eprintln!("Error: {err}");
    if let Some(hint) = err.query_error().and_then(|e| e.hint()) {
        eprintln!("  Hint: {hint}");
    }
}

/// Merge the API-collection fragments found in `dir` (or the configured directory).
pub fn combine_collection(config: &OraConfig, dir: Option<&Path>) -> Result<()> {
    let dir = dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.resolved_collection_dir());
    let spec = MergeSpec::from_config(&config.collection, &dir);

    let summary = collection::combine(&spec)
        .with_context(|| format!("failed to combine collection in {}", dir.display()))?;

    println!(
        "Collection written to {} ({} folders, {} requests).",
        summary.output.display(),
        summary.folders,
        summary.requests
    );
    Ok(())
}
