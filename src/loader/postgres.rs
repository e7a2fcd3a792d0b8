//! PostgreSQL bulk loader built on `sqlx`.
//!
//! Rows are streamed through `COPY ... FROM STDIN` in CSV form. A `COPY` is a
//! single statement, so a failed write leaves the table untouched.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Connection as _, PgConnection};

use super::{BulkLoader, ConnectionString};
use crate::config::LoaderConfig;
use crate::error::BoxError;
use crate::pipeline::{RowSource, Value};

/// Largest `database.schema.table` reference PostgreSQL accepts.
const MAX_DESTINATION_PARTS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct PostgresLoader {
    config: LoaderConfig,
}

impl PostgresLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BulkLoader for PostgresLoader {
    type Connection = PgConnection;

    fn default_timeout(&self) -> Duration {
        self.config.default_timeout()
    }

    async fn open(&self, connection: &ConnectionString) -> Result<PgConnection, BoxError> {
        Ok(PgConnection::connect(connection.expose()).await?)
    }

    async fn write(
        &self,
        connection: &mut PgConnection,
        destination: &str,
        rows: RowSource,
    ) -> Result<u64, BoxError> {
        let statement = copy_statement(destination, rows.columns())?;
        let flush_at = self.config.copy_buffer_bytes;

        let mut copy = connection.copy_in_raw(&statement).await?;
        let mut buffer = Vec::with_capacity(flush_at);
        let mut frames = 0usize;
        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    copy.abort(err.to_string()).await?;
                    return Err(err.into());
                }
            };
            encode_csv_row(&row, &mut buffer);
            if buffer.len() >= flush_at {
                copy.send(std::mem::replace(&mut buffer, Vec::with_capacity(flush_at)))
                    .await?;
                frames += 1;
            }
        }
        if !buffer.is_empty() {
            copy.send(buffer).await?;
            frames += 1;
        }
        let written = copy.finish().await?;

        bulkcopy_log!(
            log::Level::Debug,
            "postgres_copy_done",
            "rows={} frames={}",
            written,
            frames
        );
        Ok(written)
    }
}

fn copy_statement(destination: &str, columns: &[String]) -> Result<String, String> {
    let table = quote_destination(destination)?;
    let columns = columns
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("COPY {table} ({columns}) FROM STDIN WITH (FORMAT csv)"))
}

/// Appends one CSV record. NULL is the empty unquoted field, so text that is
/// empty (or needs escaping) is always quoted.
fn encode_csv_row(row: &[Value], out: &mut Vec<u8>) {
    for (i, value) in row.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        match value {
            Value::Null => {}
            Value::Bool(v) => out.push(if *v { b't' } else { b'f' }),
            Value::Int16(v) => out.extend_from_slice(v.to_string().as_bytes()),
            Value::Int32(v) => out.extend_from_slice(v.to_string().as_bytes()),
            Value::Int64(v) => out.extend_from_slice(v.to_string().as_bytes()),
            Value::Float32(v) => push_float(f64::from(*v), out),
            Value::Float64(v) => push_float(*v, out),
            Value::Text(v) => push_text(v, out),
            Value::Bytes(v) => {
                out.extend_from_slice(b"\\x");
                for byte in v {
                    out.extend_from_slice(format!("{byte:02x}").as_bytes());
                }
            }
            Value::Date(v) => out.extend_from_slice(v.format("%Y-%m-%d").to_string().as_bytes()),
            Value::Timestamp(v) => out.extend_from_slice(
                v.format("%Y-%m-%d %H:%M:%S%.f").to_string().as_bytes(),
            ),
        }
    }
    out.push(b'\n');
}

fn push_float(v: f64, out: &mut Vec<u8>) {
    let text = if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "Infinity".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        v.to_string()
    };
    out.extend_from_slice(text.as_bytes());
}

fn push_text(text: &str, out: &mut Vec<u8>) {
    let must_quote = text.is_empty()
        || text.contains(',')
        || text.contains('\n')
        || text.contains('\r')
        || text.contains('"');
    if must_quote {
        out.push(b'"');
        out.extend_from_slice(text.replace('"', "\"\"").as_bytes());
        out.push(b'"');
    } else {
        out.extend_from_slice(text.as_bytes());
    }
}

/// Quotes an identifier verbatim, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Parses a possibly schema-qualified table name and re-quotes every part.
///
/// Unquoted parts are trimmed and folded to lower case, matching how PostgreSQL
/// treats an unquoted identifier. Quoted parts keep their exact spelling, with
/// `""` standing for an embedded quote. Anything else (an unbalanced quote, a
/// stray character after a quoted part, an empty part) is rejected.
fn quote_destination(destination: &str) -> Result<String, String> {
    let invalid = |reason: &str| format!("invalid destination `{destination}`: {reason}");

    let mut parts = Vec::new();
    let mut chars = destination.trim().chars().peekable();
    loop {
        let part = if chars.peek() == Some(&'"') {
            chars.next();
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        name.push('"');
                    }
                    Some('"') => break,
                    Some(c) => name.push(c),
                    None => return Err(invalid("unterminated quoted identifier")),
                }
            }
            name
        } else {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                match c {
                    '.' => break,
                    '"' => return Err(invalid("quote inside an unquoted identifier")),
                    _ => {
                        name.push(c);
                        chars.next();
                    }
                }
            }
            name.trim().to_lowercase()
        };
        if part.is_empty() {
            return Err(invalid("empty identifier"));
        }
        parts.push(quote_ident(&part));

        match chars.next() {
            None => break,
            Some('.') => {}
            Some(other) => return Err(invalid(&format!("unexpected `{other}` after identifier"))),
        }
    }

    if parts.len() > MAX_DESTINATION_PARTS {
        return Err(invalid("too many name parts"));
    }
    Ok(parts.join("."))
}
