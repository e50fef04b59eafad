//! Thread-safe in-memory [`DataStore`] implementation for local development and tests.

// std
use std::cmp::Ordering;
// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	store::{DataStore, Direction, Query, Record, StoreError, StoreFuture},
};

type Tables = Arc<RwLock<HashMap<String, Vec<Record>>>>;

const ID_COLUMN: &str = "id";
const GENERATED_ID_LEN: usize = 24;

/// Storage backend that keeps tables in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Tables);
impl MemoryStore {
	/// Number of rows currently held in `table`.
	pub fn len(&self, table: &str) -> usize {
		self.0.read().get(table).map_or(0, Vec::len)
	}

	fn upsert_now(tables: Tables, table: &str, mut record: Record) -> Result<Record, StoreError> {
		if table.is_empty() {
			return Err(StoreError::backend("table name is empty"));
		}

		let id = match record.get(ID_COLUMN) {
			None | Some(Value::Null) => {
				let id = Value::String(generate_id());

				record.insert(ID_COLUMN.into(), id.clone());

				id
			},
			Some(id @ (Value::String(_) | Value::Number(_))) => id.clone(),
			Some(other) =>
				return Err(StoreError::serialization(format!(
					"`{ID_COLUMN}` must be a string or number, got {other}"
				))),
		};
		let mut guard = tables.write();
		let rows = guard.entry(table.to_owned()).or_default();

		match rows.iter_mut().find(|row| row.get(ID_COLUMN) == Some(&id)) {
			Some(row) => *row = record.clone(),
			None => rows.push(record.clone()),
		}

		Ok(record)
	}

	fn query_now(tables: Tables, table: &str, query: &Query) -> Vec<Record> {
		let guard = tables.read();
		let Some(rows) = guard.get(table) else {
			return Vec::new();
		};
		let mut selected = rows.iter().filter(|row| query.matches(row)).cloned().collect::<Vec<_>>();

		if !query.order.is_empty() {
			selected.sort_by(|a, b| {
				query
					.order
					.iter()
					.map(|key| compare_column(a.get(&key.column), b.get(&key.column), key.direction))
					.find(|ordering| ordering.is_ne())
					.unwrap_or(Ordering::Equal)
			});
		}

		let remaining = selected.into_iter().skip(query.offset);

		match query.limit {
			Some(limit) => remaining.take(limit).collect(),
			None => remaining.collect(),
		}
	}
}
impl DataStore for MemoryStore {
	fn upsert<'a>(&'a self, table: &'a str, record: Record) -> StoreFuture<'a, Record> {
		let tables = self.0.clone();

		Box::pin(async move { Self::upsert_now(tables, table, record) })
	}

	fn query<'a>(&'a self, table: &'a str, query: &'a Query) -> StoreFuture<'a, Vec<Record>> {
		let tables = self.0.clone();

		Box::pin(async move { Ok(Self::query_now(tables, table, query)) })
	}
}

/// Missing and `null` values sort last in either direction.
fn compare_column(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
	let a = a.filter(|v| !v.is_null());
	let b = b.filter(|v| !v.is_null());

	match (a, b) {
		(None, None) => Ordering::Equal,
		(None, Some(_)) => Ordering::Greater,
		(Some(_), None) => Ordering::Less,
		(Some(a), Some(b)) => {
			let ordering = compare_values(a, b);

			match direction {
				Direction::Ascending => ordering,
				Direction::Descending => ordering.reverse(),
			}
		},
	}
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
	match (a, b) {
		(Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
			(Some(a), Some(b)) => a.cmp(&b),
			_ => a.as_f64().partial_cmp(&b.as_f64()).unwrap_or(Ordering::Equal),
		},
		(Value::String(a), Value::String(b)) => a.cmp(b),
		(Value::Bool(a), Value::Bool(b)) => a.cmp(b),
		_ => a.to_string().cmp(&b.to_string()),
	}
}

fn generate_id() -> String {
	rand::rng().sample_iter(Alphanumeric).take(GENERATED_ID_LEN).map(char::from).collect()
}
