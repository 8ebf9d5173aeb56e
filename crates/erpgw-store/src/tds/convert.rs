//! Driver column values to JSON scalars

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use erpgw_core::Row;
use serde_json::Value;
use tiberius::xml::XmlData;
use tiberius::{ColumnData, FromSql};

/// One driver row as a name-to-value map in column order
pub fn row_to_json(row: tiberius::Row) -> Row {
    let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    let mut out = Row::new();
    for (name, data) in names.into_iter().zip(row) {
        out.insert(name, column_value(&data));
    }
    out
}

pub fn column_value(data: &ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map_or(Value::Null, Value::from),
        ColumnData::I16(v) => v.map_or(Value::Null, Value::from),
        ColumnData::I32(v) => v.map_or(Value::Null, Value::from),
        ColumnData::I64(v) => v.map_or(Value::Null, Value::from),
        ColumnData::F32(v) => v.map_or(Value::Null, |f| Value::from(f64::from(f))),
        ColumnData::F64(v) => v.map_or(Value::Null, Value::from),
        ColumnData::Bit(v) => v.map_or(Value::Null, Value::Bool),
        ColumnData::String(v) => v
            .as_ref()
            .map_or(Value::Null, |s| Value::String(s.to_string())),
        ColumnData::Guid(v) => v.as_ref().map_or(Value::Null, |g| Value::String(g.to_string())),
        ColumnData::Binary(v) => v.as_ref().map_or(Value::Null, |b| {
            Value::String(String::from_utf8_lossy(b).into_owned())
        }),
        ColumnData::Numeric(v) => v.as_ref().map_or(Value::Null, |n| {
            Value::from(n.value() as f64 / 10f64.powi(i32::from(n.scale())))
        }),
        ColumnData::Xml(v) => v.as_ref().map_or(Value::Null, |x| {
            let xml: &XmlData = x;
            Value::String(AsRef::<str>::as_ref(xml).to_string())
        }),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal::<NaiveDateTime>(data, |d| d.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
        }
        ColumnData::Date(_) => temporal::<NaiveDate>(data, |d| d.format("%Y-%m-%d").to_string()),
        ColumnData::Time(_) => temporal::<NaiveTime>(data, |t| t.format("%H:%M:%S%.3f").to_string()),
        ColumnData::DateTimeOffset(_) => {
            temporal::<DateTime<FixedOffset>>(data, |d| d.to_rfc3339())
        }
    }
}

fn temporal<T>(data: &ColumnData<'static>, render: impl Fn(T) -> String) -> Value
where
    T: for<'a> FromSql<'a>,
{
    match T::from_sql(data) {
        Ok(Some(v)) => Value::String(render(v)),
        _ => Value::Null,
    }
}
