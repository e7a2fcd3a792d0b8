//! Shared fixtures for unit tests: IPC stream builders and an in-memory loader.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arrow::array::{Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;

use crate::error::BoxError;
use crate::loader::{BulkLoader, ConnectionString};
use crate::pipeline::{Row, RowSource};

pub(crate) fn id_name_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("name", DataType::Utf8, true),
    ]))
}

pub(crate) fn id_name_batch(ids: &[i32], names: &[&str]) -> RecordBatch {
    RecordBatch::try_new(
        id_name_schema(),
        vec![
            Arc::new(Int32Array::from(ids.to_vec())),
            Arc::new(StringArray::from(names.to_vec())),
        ],
    )
    .unwrap()
}

/// Serialises `batches` as an IPC stream. An empty slice yields a schema-only stream.
pub(crate) fn ipc_stream(batches: &[RecordBatch]) -> Vec<u8> {
    let schema = batches
        .first()
        .map(RecordBatch::schema)
        .unwrap_or_else(id_name_schema);
    let mut writer = StreamWriter::try_new(Vec::new(), &schema).unwrap();
    for batch in batches {
        writer.write(batch).unwrap();
    }
    writer.finish().unwrap();
    writer.into_inner().unwrap()
}

#[derive(Debug, Default)]
pub(crate) struct MemoryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Default)]
enum Behaviour {
    #[default]
    Accept,
    RefuseConnection,
    RejectWrite(&'static str),
    Stall(Duration),
    Panic,
}

/// Loader that keeps tables in memory. Rows are only committed when a write
/// succeeds, mirroring a transactional destination.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryLoader {
    tables: Arc<Mutex<HashMap<String, MemoryTable>>>,
    opens: Arc<AtomicUsize>,
    behaviour: Arc<Behaviour>,
}

pub(crate) struct MemoryConnection;

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour: Arc::new(behaviour),
            ..Self::default()
        }
    }

    pub fn refusing_connections() -> Self {
        Self::with(Behaviour::RefuseConnection)
    }

    pub fn rejecting_writes(reason: &'static str) -> Self {
        Self::with(Behaviour::RejectWrite(reason))
    }

    pub fn stalling(delay: Duration) -> Self {
        Self::with(Behaviour::Stall(delay))
    }

    pub fn panicking() -> Self {
        Self::with(Behaviour::Panic)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn columns(&self, table: &str) -> Vec<String> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BulkLoader for MemoryLoader {
    type Connection = MemoryConnection;

    fn default_timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn open(&self, _connection: &ConnectionString) -> Result<MemoryConnection, BoxError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match *self.behaviour {
            Behaviour::RefuseConnection => Err("connection refused".into()),
            _ => Ok(MemoryConnection),
        }
    }

    async fn write(
        &self,
        _connection: &mut MemoryConnection,
        destination: &str,
        rows: RowSource,
    ) -> Result<u64, BoxError> {
        match *self.behaviour {
            Behaviour::RejectWrite(reason) => return Err(reason.into()),
            Behaviour::Stall(delay) => tokio::time::sleep(delay).await,
            Behaviour::Panic => panic!("loader exploded mid-write"),
            _ => {}
        }

        let columns = rows.columns().to_vec();
        let collected = rows.collect::<Result<Vec<Row>, _>>()?;
        let written = collected.len() as u64;

        let mut tables = self.tables.lock().unwrap();
        let table = tables.entry(destination.to_string()).or_default();
        table.columns = columns;
        table.rows.extend(collected);
        Ok(written)
    }
}
