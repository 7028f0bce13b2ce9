use std::{
    future::Future,
    io::{ErrorKind, Write},
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tempfile::NamedTempFile;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::debug;

use crate::utils::time::date_to_record_parts;

/// Interface for abstracting storage of day records.
pub trait LedgerStorage {
    /// Stable location of the record for `date`. The record doesn't have to exist yet.
    fn location(&self, date: NaiveDate) -> PathBuf;

    /// Retrieves every line of the record for `date` in file order. A day that was never written
    /// is empty.
    fn read_lines(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Replaces the record for `date` with `lines`. Readers either see the previous record or
    /// the new one, never a mix.
    fn write_lines(&self, date: NaiveDate, lines: Vec<String>) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> LedgerStorage for T
where
    T::Target: LedgerStorage,
{
    fn location(&self, date: NaiveDate) -> PathBuf {
        self.deref().location(date)
    }

    fn read_lines(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<String>>> + Send {
        self.deref().read_lines(date)
    }

    fn write_lines(&self, date: NaiveDate, lines: Vec<String>) -> impl Future<Output = Result<()>> {
        self.deref().write_lines(date, lines)
    }
}

/// The main realization of [LedgerStorage].
pub struct FileLedgerStorage {
    record_dir: PathBuf,
}

impl FileLedgerStorage {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }
}

impl LedgerStorage for FileLedgerStorage {
    fn location(&self, date: NaiveDate) -> PathBuf {
        let mut path = self.record_dir.clone();
        path.extend(date_to_record_parts(date));
        path
    }

    async fn read_lines(&self, date: NaiveDate) -> Result<Vec<String>> {
        async fn extract(path: &Path) -> std::result::Result<Vec<String>, std::io::Error> {
            debug!("Reading {path:?}");
            let mut file = File::open(path).await?;
            file.lock_shared()?;
            let mut lines = BufReader::new(&mut file).split(b'\n');
            let mut result = vec![];
            while let Some(line) = lines.next_segment().await? {
                let line = String::from_utf8(line).map_err(|e| {
                    std::io::Error::new(
                        ErrorKind::InvalidData,
                        format!(
                            "Line {:?} is not valid UTF-8",
                            String::from_utf8_lossy(e.as_bytes())
                        ),
                    )
                })?;
                result.push(line);
            }

            drop(lines);
            file.unlock_async().await?;

            Ok(result)
        }

        let path = self.location(date);
        match extract(&path).await {
            Ok(lines) => Ok(lines),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No record at {path:?}, starting an empty day");
                Ok(vec![])
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read record {path:?}")),
        }
    }

    async fn write_lines(&self, date: NaiveDate, lines: Vec<String>) -> Result<()> {
        let path = self.location(date);
        debug!("Writing {} lines into {path:?}", lines.len());
        tokio::task::spawn_blocking(move || write_atomically(&path, &lines)).await?
    }
}

/// Writes into a temporary file next to `path` and renames it over the record.
fn write_atomically(path: &Path, lines: &[String]) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("Record {path:?} has no parent directory"))?;
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir).context("Failed to create temp file for record")?;
    let mut buffer = Vec::<u8>::new();
    for line in lines {
        buffer.extend_from_slice(line.as_bytes());
        buffer.push(b'\n');
    }
    tmp.write_all(&buffer)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to persist record {path:?}"))?;
    Ok(())
}
