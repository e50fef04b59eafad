//! Typed integration records and the helper that persists them through a [`DataStore`].
//!
//! Three tables back the assistant: `users`, `conversations` (one row per voice
//! conversation, keyed by the provider's conversation id), and `oauth_credentials` (one row
//! per user and provider). Records cross the [`DataStore`] boundary as JSON objects; decode
//! failures surface as [`StoreError::Serialization`] with the failing field path.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{ConversationId, ProviderId, TokenSecret, UserId},
	exchange::TokenGrant,
	store::{DataStore, Direction, Query, Record, StoreError},
	webhook::ConversationEvent,
};

/// Table holding [`UserRecord`] rows.
pub const USERS_TABLE: &str = "users";
/// Table holding [`ConversationRecord`] rows.
pub const CONVERSATIONS_TABLE: &str = "conversations";
/// Table holding [`IntegrationCredential`] rows.
pub const CREDENTIALS_TABLE: &str = "oauth_credentials";

/// Assistant user profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
	/// Auth provider subject.
	pub id: UserId,
	/// Primary email address.
	pub email: String,
	/// Given name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
}

/// Voice conversation owned by a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
	/// Conversation id assigned by the transcript provider.
	pub id: ConversationId,
	/// Owning user.
	pub user_id: UserId,
	/// Creation instant, stored as Unix seconds.
	#[serde(with = "time::serde::timestamp")]
	pub created_at: OffsetDateTime,
}
impl ConversationRecord {
	/// Creates a record stamped with the current time.
	pub fn new(id: ConversationId, user_id: UserId) -> Self {
		Self { id, user_id, created_at: OffsetDateTime::now_utc() }
	}

	/// Builds a record from a verified webhook event, using the event's own timestamp when
	/// it carries a valid one.
	pub fn from_event(user_id: UserId, event: &ConversationEvent) -> Self {
		let created_at = event
			.event_timestamp
			.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
			.unwrap_or_else(OffsetDateTime::now_utc);

		Self { id: event.data.conversation_id.clone(), user_id, created_at }
	}
}

/// OAuth tokens a user granted to the assistant for one provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationCredential {
	/// Row key, `{user_id}:{provider}`.
	pub id: String,
	/// Owning user.
	pub user_id: UserId,
	/// Provider the tokens belong to.
	pub provider: ProviderId,
	/// Access token.
	pub access_token: TokenSecret,
	/// Refresh token, when issued.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Access token expiry.
	#[serde(default, with = "time::serde::timestamp::option")]
	pub expires_at: Option<OffsetDateTime>,
	/// Notion workspace the bot was installed into.
	#[serde(default)]
	pub workspace_id: Option<String>,
	/// Notion bot identifier.
	#[serde(default)]
	pub bot_id: Option<String>,
	/// Last time the tokens were written.
	#[serde(with = "time::serde::timestamp")]
	pub updated_at: OffsetDateTime,
}
impl IntegrationCredential {
	/// Row key for a user and provider pair.
	pub fn key(user_id: &UserId, provider: &ProviderId) -> String {
		format!("{user_id}:{provider}")
	}

	/// Captures a successful exchange. `issued_at` anchors `expires_in`.
	pub fn from_grant(
		user_id: UserId,
		provider: ProviderId,
		grant: &TokenGrant,
		issued_at: OffsetDateTime,
	) -> Self {
		Self {
			id: Self::key(&user_id, &provider),
			user_id,
			provider,
			access_token: grant.access_token.clone(),
			refresh_token: grant.refresh_token.clone(),
			expires_at: grant.expires_at(issued_at),
			workspace_id: grant.workspace_id().map(str::to_owned),
			bot_id: grant.bot_id().map(str::to_owned),
			updated_at: issued_at,
		}
	}

	/// Returns true once `now` has reached the access token expiry.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| now >= expires_at)
	}
}

/// Typed facade over a [`DataStore`].
#[derive(Debug)]
pub struct Integrations<S>
where
	S: ?Sized + DataStore,
{
	store: Arc<S>,
}
impl<S> Integrations<S>
where
	S: ?Sized + DataStore,
{
	/// Wraps a shared store.
	pub fn new(store: Arc<S>) -> Self {
		Self { store }
	}

	/// Underlying store.
	pub fn store(&self) -> &Arc<S> {
		&self.store
	}

	/// Creates or replaces a user profile.
	pub async fn save_user(&self, user: &UserRecord) -> Result<UserRecord> {
		self.upsert(USERS_TABLE, user).await
	}

	/// Looks up a user profile.
	pub async fn find_user(&self, id: &UserId) -> Result<Option<UserRecord>> {
		self.first(USERS_TABLE, Query::new().eq("id", id.as_ref())).await
	}

	/// Stores a conversation. Recording the same conversation twice keeps one row.
	pub async fn record_conversation(
		&self,
		conversation: &ConversationRecord,
	) -> Result<ConversationRecord> {
		self.upsert(CONVERSATIONS_TABLE, conversation).await
	}

	/// Lists a user's conversations, newest first.
	pub async fn list_conversations(
		&self,
		user_id: &UserId,
		limit: usize,
		offset: usize,
	) -> Result<Vec<ConversationRecord>> {
		let query = Query::new()
			.eq("user_id", user_id.as_ref())
			.order_by("created_at", Direction::Descending)
			.order_by("id", Direction::Ascending)
			.limit(limit)
			.offset(offset);

		self.select(CONVERSATIONS_TABLE, &query).await
	}

	/// Creates or replaces the credential for its user and provider.
	pub async fn save_credential(
		&self,
		credential: &IntegrationCredential,
	) -> Result<IntegrationCredential> {
		self.upsert(CREDENTIALS_TABLE, credential).await
	}

	/// Looks up the credential a user granted for `provider`.
	pub async fn find_credential(
		&self,
		user_id: &UserId,
		provider: &ProviderId,
	) -> Result<Option<IntegrationCredential>> {
		let query = Query::new()
			.eq("user_id", user_id.as_ref())
			.eq("provider", provider.as_ref())
			.limit(1);

		self.first(CREDENTIALS_TABLE, query).await
	}

	/// Lists every credential a user granted, ordered by provider.
	pub async fn list_credentials(&self, user_id: &UserId) -> Result<Vec<IntegrationCredential>> {
		let query = Query::new()
			.eq("user_id", user_id.as_ref())
			.order_by("provider", Direction::Ascending);

		self.select(CREDENTIALS_TABLE, &query).await
	}

	async fn upsert<T>(&self, table: &str, value: &T) -> Result<T>
	where
		T: Serialize + DeserializeOwned,
	{
		let stored = self.store.upsert(table, to_record(value)?).await?;

		Ok(from_record(stored)?)
	}

	async fn select<T>(&self, table: &str, query: &Query) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		let rows = self.store.query(table, query).await?;

		Ok(rows.into_iter().map(from_record).collect::<Result<Vec<_>, _>>()?)
	}

	async fn first<T>(&self, table: &str, query: Query) -> Result<Option<T>>
	where
		T: DeserializeOwned,
	{
		Ok(self.select(table, &query.limit(1)).await?.into_iter().next())
	}
}
impl<S> Clone for Integrations<S>
where
	S: ?Sized + DataStore,
{
	fn clone(&self) -> Self {
		Self { store: self.store.clone() }
	}
}

fn to_record<T>(value: &T) -> Result<Record, StoreError>
where
	T: Serialize,
{
	match serde_json::to_value(value).map_err(StoreError::serialization)? {
		Value::Object(record) => Ok(record),
		other => Err(StoreError::serialization(format!("expected a JSON object, got {other}"))),
	}
}

fn from_record<T>(record: Record) -> Result<T, StoreError>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(Value::Object(record)).map_err(StoreError::serialization)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::Error, store::MemoryStore};

	fn user() -> UserId {
		UserId::new("user_1").expect("User fixture should be valid.")
	}

	#[test]
	fn credential_captures_notion_grant_fields() {
		let grant = TokenGrant {
			access_token: "tok123".into(),
			refresh_token: None,
			expires_in: Some(Duration::hours(1)),
			scope: None,
			token_type: Some("bearer".into()),
			raw_payload: serde_json::json!({
				"access_token": "tok123",
				"workspace_id": "w1",
				"bot_id": "b1",
			}),
		};
		let provider = ProviderId::new("notion").expect("Provider fixture should be valid.");
		let issued_at = OffsetDateTime::UNIX_EPOCH;
		let credential = IntegrationCredential::from_grant(user(), provider, &grant, issued_at);

		assert_eq!(credential.id, "user_1:notion");
		assert_eq!(credential.workspace_id.as_deref(), Some("w1"));
		assert_eq!(credential.bot_id.as_deref(), Some("b1"));
		assert!(!credential.is_expired_at(issued_at));
		assert!(credential.is_expired_at(issued_at + Duration::hours(1)));
	}

	#[test]
	fn conversation_from_event_prefers_event_timestamp() {
		let event: ConversationEvent = serde_json::from_value(serde_json::json!({
			"type": "post_call_transcription",
			"event_timestamp": 1_700_000_000,
			"data": { "conversation_id": "conv_1" },
		}))
		.expect("Event fixture should decode.");
		let record = ConversationRecord::from_event(user(), &event);

		assert_eq!(record.id.as_ref(), "conv_1");
		assert_eq!(record.created_at.unix_timestamp(), 1_700_000_000);
	}

	#[tokio::test]
	async fn corrupt_rows_surface_field_paths() {
		let store = Arc::new(MemoryStore::default());
		let integrations = Integrations::new(store.clone());
		let mut row = Record::new();

		row.insert("id".into(), "user_1".into());
		row.insert("email".into(), Value::from(42));
		store.upsert(USERS_TABLE, row).await.expect("Raw insert should succeed.");

		let err = integrations.find_user(&user()).await.expect_err("Corrupt row should fail.");

		match err {
			Error::Storage(StoreError::Serialization { message }) =>
				assert!(message.contains("email"), "Message should name the field: {message}."),
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
