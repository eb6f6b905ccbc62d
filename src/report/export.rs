//! JSON Lines export of retrieved assignments.

use crate::models::Submission;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write one JSON object per submission, each on its own line.
pub fn write_jsonl<W: Write>(submissions: &[Submission], mut writer: W) -> Result<()> {
    for sub in submissions {
        serde_json::to_writer(&mut writer, sub)
            .with_context(|| format!("Failed to serialize assignment {}", sub.id))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the export file at `path`.
pub fn export_submissions(submissions: &[Submission], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    write_jsonl(submissions, BufWriter::new(file))
        .with_context(|| format!("Failed to write export file {}", path.display()))
}
