// std
use std::sync::Arc;
// crates.io
use time::{Duration, macros};
// self
use convo_bridge::{
	auth::{ConversationId, ProviderId, TokenSecret, UserId},
	integration::{
		CREDENTIALS_TABLE, ConversationRecord, IntegrationCredential, Integrations, UserRecord,
	},
	store::{DataStore, MemoryStore, Query},
};

fn user(id: &str) -> UserId {
	UserId::new(id).expect("Failed to build user identifier for memory store tests.")
}

fn conversation(id: &str, owner: &UserId, minutes: i64) -> ConversationRecord {
	ConversationRecord {
		id: ConversationId::new(id).expect("Failed to build conversation identifier."),
		user_id: owner.clone(),
		created_at: macros::datetime!(2025-11-10 12:00 UTC) + Duration::minutes(minutes),
	}
}

fn credential(owner: &UserId, provider: &str, access: &str) -> IntegrationCredential {
	let provider = ProviderId::new(provider).expect("Failed to build provider identifier.");

	IntegrationCredential {
		id: IntegrationCredential::key(owner, &provider),
		user_id: owner.clone(),
		provider,
		access_token: TokenSecret::new(access),
		refresh_token: None,
		expires_at: None,
		workspace_id: Some("w1".into()),
		bot_id: None,
		updated_at: macros::datetime!(2025-11-10 12:00 UTC),
	}
}

fn integrations() -> (Integrations<MemoryStore>, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::default());

	(Integrations::new(store.clone()), store)
}

#[tokio::test]
async fn user_profiles_round_trip_and_update_in_place() {
	let (integrations, store) = integrations();
	let ada = user("user_ada");
	let mut profile = UserRecord {
		id: ada.clone(),
		email: "ada@example.com".into(),
		first_name: Some("Ada".into()),
		last_name: None,
	};

	integrations.save_user(&profile).await.expect("Saving a user should succeed.");

	profile.last_name = Some("Lovelace".into());

	integrations.save_user(&profile).await.expect("Updating a user should succeed.");

	let found = integrations
		.find_user(&ada)
		.await
		.expect("User lookup should succeed.")
		.expect("Saved user should be found.");

	assert_eq!(found, profile);
	assert_eq!(store.len("users"), 1);
	assert!(
		integrations
			.find_user(&user("user_missing"))
			.await
			.expect("User lookup should succeed.")
			.is_none()
	);
}

#[tokio::test]
async fn conversations_list_newest_first_with_pagination() {
	let (integrations, _) = integrations();
	let ada = user("user_ada");
	let bob = user("user_bob");

	for record in [
		conversation("conv_1", &ada, 0),
		conversation("conv_2", &ada, 10),
		conversation("conv_3", &ada, 20),
		conversation("conv_b", &bob, 30),
	] {
		integrations.record_conversation(&record).await.expect("Recording should succeed.");
	}

	// Duplicate webhook deliveries keep a single row.
	integrations
		.record_conversation(&conversation("conv_3", &ada, 20))
		.await
		.expect("Re-recording should succeed.");

	let ids = |records: Vec<ConversationRecord>| {
		records.into_iter().map(|record| record.id.to_string()).collect::<Vec<_>>()
	};
	let first_page =
		integrations.list_conversations(&ada, 2, 0).await.expect("Listing should succeed.");
	let second_page =
		integrations.list_conversations(&ada, 2, 2).await.expect("Listing should succeed.");

	assert_eq!(ids(first_page), ["conv_3", "conv_2"]);
	assert_eq!(ids(second_page), ["conv_1"]);
}

#[tokio::test]
async fn credentials_are_keyed_by_user_and_provider() {
	let (integrations, store) = integrations();
	let ada = user("user_ada");

	integrations
		.save_credential(&credential(&ada, "notion", "tok-old"))
		.await
		.expect("Saving a credential should succeed.");
	integrations
		.save_credential(&credential(&ada, "notion", "tok-new"))
		.await
		.expect("Replacing a credential should succeed.");
	integrations
		.save_credential(&credential(&ada, "google", "ya29"))
		.await
		.expect("Saving a second provider should succeed.");

	let notion = ProviderId::new("notion").expect("Failed to build provider identifier.");
	let found = integrations
		.find_credential(&ada, &notion)
		.await
		.expect("Credential lookup should succeed.")
		.expect("Saved credential should be found.");

	assert_eq!(found.access_token.expose(), "tok-new");
	assert_eq!(found.workspace_id.as_deref(), Some("w1"));

	let providers = integrations
		.list_credentials(&ada)
		.await
		.expect("Listing credentials should succeed.")
		.into_iter()
		.map(|credential| credential.provider.to_string())
		.collect::<Vec<_>>();

	assert_eq!(providers, ["google", "notion"]);

	let raw = store
		.query(CREDENTIALS_TABLE, &Query::new().eq("id", "user_ada:notion"))
		.await
		.expect("Raw query should succeed.");

	assert_eq!(raw.len(), 1);
	assert_eq!(raw[0].get("access_token").and_then(|v| v.as_str()), Some("tok-new"));
}
