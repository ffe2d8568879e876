// src/monitor/jsonl_store.rs
use std::fs::{ File, OpenOptions };
use std::io::{ BufWriter, Write };
use std::path::{ Path, PathBuf };

use anyhow::{ Context, Result };
use tracing::debug;

use crate::models::opportunity::OpportunityRecord;

/// Persistence collaborator for discovered and executed opportunities
pub trait OpportunityStore: Send {
    /// Buffer a record; must stay cheap
    fn push(&mut self, record: OpportunityRecord);

    /// Persist everything pushed since the last commit and return how many
    /// records were written. Committing with nothing buffered is a no-op.
    fn commit(&mut self) -> Result<usize>;
}

/// Appends one JSON document per line
pub struct JsonLinesStore {
    path: PathBuf,
    buffer: Vec<OpportunityRecord>,
    writer: Option<BufWriter<File>>,
}

impl JsonLinesStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), buffer: Vec::new(), writer: None }
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.writer.is_some() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }
}

impl OpportunityStore for JsonLinesStore {
    fn push(&mut self, record: OpportunityRecord) {
        self.buffer.push(record);
    }

    fn commit(&mut self) -> Result<usize> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        self.ensure_open()?;
        let writer = self.writer.as_mut().context("Opportunity file is not open")?;
        let count = drain_into(writer, &mut self.buffer)?;
        debug!(count, "Committed opportunities");
        Ok(count)
    }
}

/// Writes buffered records one line each, removing every record the writer
/// accepted even when a later one fails, so a retry never repeats a line.
fn drain_into<W: Write>(writer: &mut W, buffer: &mut Vec<OpportunityRecord>) -> Result<usize> {
    let mut line = Vec::new();
    let mut written = 0;
    let mut outcome = Ok(());

    for record in buffer.iter() {
        line.clear();
        if let Err(e) = serde_json::to_writer(&mut line, record) {
            outcome = Err(anyhow::Error::new(e).context("Failed to serialize opportunity"));
            break;
        }
        line.push(b'\n');
        if let Err(e) = writer.write_all(&line) {
            outcome = Err(anyhow::Error::new(e).context("Failed to write opportunity"));
            break;
        }
        written += 1;
    }

    buffer.drain(..written);
    outcome?;
    // BufWriter keeps unflushed bytes and retries them on the next flush
    writer.flush().context("Failed to flush opportunity file")?;
    Ok(written)
}
