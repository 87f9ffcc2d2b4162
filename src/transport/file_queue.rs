use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::error::{EtlError, Result};
use crate::transport::{Delivery, Transport};

/// Durable queue backed by an append-only NDJSON delivery log, with the
/// consumer's byte offset tracked in SQLite. Publishing appends and flushes a
/// line; only an ack advances the offset, so an unacked or requeued delivery
/// is simply read again on the next receive.
pub struct FileQueue {
    log_path: PathBuf,
    consumer: String,
    meta: Mutex<Connection>,
}

impl FileQueue {
    pub fn open<P: AsRef<Path>>(root: P, consumer: &str) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;

        let conn = Connection::open(root.join("meta.db"))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS consumer_offsets (
                consumer    TEXT PRIMARY KEY,
                byte_offset INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(Self {
            log_path: root.join("queue.ndjson"),
            consumer: consumer.to_string(),
            meta: Mutex::new(conn),
        })
    }

    fn load_offset(&self) -> Result<u64> {
        let conn = self.meta.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT byte_offset FROM consumer_offsets WHERE consumer = ?1")?;
        let mut rows = stmt.query(params![self.consumer])?;
        if let Some(row) = rows.next()? {
            Ok(row.get::<_, i64>(0)? as u64)
        } else {
            Ok(0)
        }
    }

    fn save_offset(&self, byte_offset: u64) -> Result<()> {
        let conn = self.meta.lock().unwrap();
        conn.execute(
            "INSERT INTO consumer_offsets (consumer, byte_offset) VALUES (?1, ?2)
             ON CONFLICT(consumer) DO UPDATE SET byte_offset=excluded.byte_offset",
            params![self.consumer, byte_offset as i64],
        )?;
        Ok(())
    }

    fn append(&self, body: &[u8]) -> Result<()> {
        if body.contains(&b'\n') {
            return Err(EtlError::Transport(
                "payload must not contain newlines".to_string(),
            ));
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        file.write_all(body)?;
        file.write_all(b"\n")?;
        file.sync_data()?;
        Ok(())
    }

    fn read_next(&self) -> Result<Option<Delivery>> {
        let mut offset = self.load_offset()?;
        if !self.log_path.exists() {
            return Ok(None);
        }
        // If the stored offset is beyond the current file end, the log was
        // replaced; start over.
        let end = fs::metadata(&self.log_path)?.len();
        if offset > end {
            offset = 0;
        }

        let mut file = File::open(&self.log_path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(file);

        loop {
            let mut line = String::new();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                return Ok(None); // EOF
            }
            let start = offset;
            offset += read as u64;
            let trimmed = line.trim_end_matches('\n');
            if trimmed.trim().is_empty() {
                continue;
            }
            return Ok(Some(Delivery {
                body: trimmed.as_bytes().to_vec(),
                offset: start,
                next_offset: offset,
            }));
        }
    }
}

#[async_trait]
impl Transport for FileQueue {
    async fn publish(&self, body: &[u8]) -> Result<()> {
        self.append(body)
    }

    async fn receive(&self) -> Result<Option<Delivery>> {
        self.read_next()
    }

    async fn ack(&self, delivery: &Delivery) -> Result<()> {
        self.save_offset(delivery.next_offset)
    }

    async fn nack(&self, delivery: &Delivery, requeue: bool) -> Result<()> {
        if requeue {
            // Leave the offset where it is; the next receive redelivers.
            debug!(offset = delivery.offset, "delivery left for redelivery");
            Ok(())
        } else {
            self.save_offset(delivery.next_offset)
        }
    }
}
