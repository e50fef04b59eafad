//! Generic persistence contract consumed by the integration layer.
//!
//! Records are JSON objects grouped into named tables. Backends implement [`DataStore`]
//! (upsert keyed by the `id` column plus filtered/ordered/paginated queries);
//! [`MemoryStore`] is the in-process implementation used by tests and local runs.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Row stored in a table.
pub type Record = serde_json::Map<String, Value>;

/// Boxed future returned by [`DataStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract.
pub trait DataStore
where
	Self: Send + Sync,
{
	/// Inserts `record` into `table`, replacing any row with the same `id`, and returns the
	/// stored row. Backends assign an `id` when the record has none.
	fn upsert<'a>(&'a self, table: &'a str, record: Record) -> StoreFuture<'a, Record>;

	/// Returns the rows of `table` selected by `query`.
	fn query<'a>(&'a self, table: &'a str, query: &'a Query) -> StoreFuture<'a, Vec<Record>>;
}

/// Sort direction for [`Query::order_by`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
	#[default]
	/// Smallest first.
	Ascending,
	/// Largest first.
	Descending,
}

/// Equality filter on a single column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
	/// Column name.
	pub column: String,
	/// Required value.
	pub value: Value,
}

/// Sort key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
	/// Column name.
	pub column: String,
	/// Sort direction.
	pub direction: Direction,
}

/// Row selection: equality filters, ordering, then `offset` and `limit`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
	/// Conjunction of equality filters.
	pub filters: Vec<Filter>,
	/// Sort keys, most significant first.
	pub order: Vec<OrderBy>,
	/// Maximum number of rows returned.
	pub limit: Option<usize>,
	/// Rows skipped after ordering.
	pub offset: usize,
}
impl Query {
	/// Creates an empty query selecting every row.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an equality filter.
	pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
		self.filters.push(Filter { column: column.into(), value: value.into() });

		self
	}

	/// Appends a sort key.
	pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
		self.order.push(OrderBy { column: column.into(), direction });

		self
	}

	/// Caps the number of rows returned.
	pub fn limit(mut self, limit: usize) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Skips `offset` rows after ordering.
	pub fn offset(mut self, offset: usize) -> Self {
		self.offset = offset;

		self
	}

	/// Returns true when `record` satisfies every filter.
	pub fn matches(&self, record: &Record) -> bool {
		self.filters.iter().all(|filter| record.get(&filter.column) == Some(&filter.value))
	}
}

/// Error type produced by [`DataStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Record could not be converted to or from its typed form.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl StoreError {
	/// Wraps a serde failure.
	pub fn serialization(e: impl Display) -> Self {
		Self::Serialization { message: e.to_string() }
	}

	/// Wraps a backend failure.
	pub fn backend(e: impl Display) -> Self {
		Self::Backend { message: e.to_string() }
	}
}
