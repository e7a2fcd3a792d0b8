//! Columnar-to-tabular projection.
//!
//! A [`RowSource`] owns the decoded record batches and yields one [`Row`] at a
//! time, in schema column order. Column kinds are resolved once up front, so an
//! unsupported column type is reported before the loader sees a single row.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    SchemaRef, TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt16Type, UInt32Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, TimeUnit};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::BulkCopyError;

/// A single cell, already widened to the type the destination binds.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

pub type Row = Vec<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    Float32,
    Float64,
    Utf8,
    LargeUtf8,
    Binary,
    LargeBinary,
    Date32,
    Date64,
    Timestamp(TimeUnit),
}

impl ColumnKind {
    fn resolve(name: &str, data_type: &DataType) -> Result<Self, BulkCopyError> {
        let kind = match data_type {
            DataType::Boolean => ColumnKind::Bool,
            DataType::Int8 => ColumnKind::Int8,
            DataType::Int16 => ColumnKind::Int16,
            DataType::Int32 => ColumnKind::Int32,
            DataType::Int64 => ColumnKind::Int64,
            DataType::UInt8 => ColumnKind::UInt8,
            DataType::UInt16 => ColumnKind::UInt16,
            DataType::UInt32 => ColumnKind::UInt32,
            DataType::Float32 => ColumnKind::Float32,
            DataType::Float64 => ColumnKind::Float64,
            DataType::Utf8 => ColumnKind::Utf8,
            DataType::LargeUtf8 => ColumnKind::LargeUtf8,
            DataType::Binary => ColumnKind::Binary,
            DataType::LargeBinary => ColumnKind::LargeBinary,
            DataType::Date32 => ColumnKind::Date32,
            DataType::Date64 => ColumnKind::Date64,
            DataType::Timestamp(unit, _) => ColumnKind::Timestamp(*unit),
            other => {
                return Err(BulkCopyError::decode(format!(
                    "column `{name}` has unsupported type {other}"
                )))
            }
        };
        Ok(kind)
    }
}

/// Lazy, forward-only row iterator over one or more batches sharing a schema.
///
/// Consumed by value: once a loader has drained it there is no way to restart.
#[derive(Debug)]
pub struct RowSource {
    columns: Vec<String>,
    kinds: Vec<ColumnKind>,
    batches: std::vec::IntoIter<RecordBatch>,
    current: Option<RecordBatch>,
    row: usize,
    total_rows: usize,
}

impl RowSource {
    /// Column names, exactly as declared in the batch schema.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows across all batches, including those already yielded.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    fn cell(&self, array: &ArrayRef, kind: ColumnKind, row: usize) -> Result<Value, BulkCopyError> {
        if array.is_null(row) {
            return Ok(Value::Null);
        }
        let value = match kind {
            ColumnKind::Bool => Value::Bool(array.as_boolean().value(row)),
            ColumnKind::Int8 => Value::Int16(array.as_primitive::<Int8Type>().value(row).into()),
            ColumnKind::Int16 => Value::Int16(array.as_primitive::<Int16Type>().value(row)),
            ColumnKind::Int32 => Value::Int32(array.as_primitive::<Int32Type>().value(row)),
            ColumnKind::Int64 => Value::Int64(array.as_primitive::<Int64Type>().value(row)),
            ColumnKind::UInt8 => Value::Int16(array.as_primitive::<UInt8Type>().value(row).into()),
            ColumnKind::UInt16 => {
                Value::Int32(array.as_primitive::<UInt16Type>().value(row).into())
            }
            ColumnKind::UInt32 => {
                Value::Int64(array.as_primitive::<UInt32Type>().value(row).into())
            }
            ColumnKind::Float32 => Value::Float32(array.as_primitive::<Float32Type>().value(row)),
            ColumnKind::Float64 => Value::Float64(array.as_primitive::<Float64Type>().value(row)),
            ColumnKind::Utf8 => Value::Text(array.as_string::<i32>().value(row).to_owned()),
            ColumnKind::LargeUtf8 => Value::Text(array.as_string::<i64>().value(row).to_owned()),
            ColumnKind::Binary => Value::Bytes(array.as_binary::<i32>().value(row).to_vec()),
            ColumnKind::LargeBinary => Value::Bytes(array.as_binary::<i64>().value(row).to_vec()),
            ColumnKind::Date32 => {
                Value::Date(out_of_range(array.as_primitive::<Date32Type>().value_as_date(row), row)?)
            }
            ColumnKind::Date64 => {
                Value::Date(out_of_range(array.as_primitive::<Date64Type>().value_as_date(row), row)?)
            }
            ColumnKind::Timestamp(unit) => {
                let ts = match unit {
                    TimeUnit::Second => array
                        .as_primitive::<TimestampSecondType>()
                        .value_as_datetime(row),
                    TimeUnit::Millisecond => array
                        .as_primitive::<TimestampMillisecondType>()
                        .value_as_datetime(row),
                    TimeUnit::Microsecond => array
                        .as_primitive::<TimestampMicrosecondType>()
                        .value_as_datetime(row),
                    TimeUnit::Nanosecond => array
                        .as_primitive::<TimestampNanosecondType>()
                        .value_as_datetime(row),
                };
                Value::Timestamp(out_of_range(ts, row)?)
            }
        };
        Ok(value)
    }
}

fn out_of_range<T>(value: Option<T>, row: usize) -> Result<T, BulkCopyError> {
    value.ok_or_else(|| BulkCopyError::decode(format!("temporal value out of range at row {row}")))
}

impl Iterator for RowSource {
    type Item = Result<Row, BulkCopyError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self
            .current
            .as_ref()
            .map_or(true, |batch| self.row >= batch.num_rows())
        {
            self.current = Some(self.batches.next()?);
            self.row = 0;
        }

        let batch = self.current.as_ref()?;
        let row = self.row;
        let projected: Result<Row, BulkCopyError> = batch
            .columns()
            .iter()
            .zip(&self.kinds)
            .map(|(array, kind)| self.cell(array, *kind, row))
            .collect();
        self.row += 1;
        Some(projected)
    }
}

/// Projects decoded batches into a [`RowSource`], preserving column order and names.
///
/// No type coercion happens beyond lossless widening; a column whose type has no
/// tabular counterpart fails the projection.
pub fn project(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<RowSource, BulkCopyError> {
    let mut columns = Vec::with_capacity(schema.fields().len());
    let mut kinds = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        kinds.push(ColumnKind::resolve(field.name(), field.data_type())?);
        columns.push(field.name().clone());
    }
    let total_rows = batches.iter().map(RecordBatch::num_rows).sum();

    Ok(RowSource {
        columns,
        kinds,
        batches: batches.into_iter(),
        current: None,
        row: 0,
        total_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        BinaryArray, BooleanArray, Date32Array, Int32Array, ListArray, StringArray,
        TimestampMillisecondArray, UInt16Array,
    };
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn id_name_batch(ids: Vec<i32>, names: Vec<Option<&str>>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(ids)),
                Arc::new(StringArray::from(names)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn preserves_column_order_and_values() {
        let batch = id_name_batch(vec![1, 2, 3], vec![Some("a"), None, Some("c")]);
        let source = project(batch.schema(), vec![batch]).unwrap();

        assert_eq!(source.columns(), ["id", "name"]);
        assert_eq!(source.total_rows(), 3);

        let rows: Vec<Row> = source.map(Result::unwrap).collect();
        assert_eq!(
            rows,
            vec![
                vec![Value::Int32(1), Value::Text("a".into())],
                vec![Value::Int32(2), Value::Null],
                vec![Value::Int32(3), Value::Text("c".into())],
            ]
        );
    }

    #[test]
    fn spans_multiple_batches_and_skips_empty_ones() {
        let first = id_name_batch(vec![1], vec![Some("a")]);
        let empty = id_name_batch(vec![], vec![]);
        let last = id_name_batch(vec![2, 3], vec![Some("b"), Some("c")]);
        let schema = first.schema();

        let ids: Vec<Value> = project(schema, vec![first, empty, last])
            .unwrap()
            .map(|row| row.unwrap().remove(0))
            .collect();
        assert_eq!(ids, vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)]);
    }

    #[test]
    fn widens_and_converts_temporal_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("flag", DataType::Boolean, false),
            Field::new("port", DataType::UInt16, false),
            Field::new("day", DataType::Date32, false),
            Field::new(
                "at",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                false,
            ),
            Field::new("blob", DataType::Binary, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(BooleanArray::from(vec![true])),
                Arc::new(UInt16Array::from(vec![65_535u16])),
                Arc::new(Date32Array::from(vec![19_723])),
                Arc::new(TimestampMillisecondArray::from(vec![1_704_067_200_500])),
                Arc::new(BinaryArray::from_vec(vec![&b"\x00\x01"[..]])),
            ],
        )
        .unwrap();

        let row = project(schema, vec![batch]).unwrap().next().unwrap().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            row,
            vec![
                Value::Bool(true),
                Value::Int32(65_535),
                Value::Date(day),
                Value::Timestamp(day.and_hms_milli_opt(0, 0, 0, 500).unwrap()),
                Value::Bytes(vec![0, 1]),
            ]
        );
    }

    #[test]
    fn rejects_nested_columns_by_name() {
        let item = Arc::new(Field::new("item", DataType::Int32, true));
        let schema = Arc::new(Schema::new(vec![Field::new(
            "tags",
            DataType::List(item),
            true,
        )]));
        let list = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1)])]);
        let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(list)]).unwrap();

        let err = project(schema, vec![batch]).unwrap_err();
        assert!(matches!(err, BulkCopyError::Decode { .. }));
        assert!(err.to_string().contains("`tags`"));
    }
}
