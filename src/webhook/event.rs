// self
use crate::{_prelude::*, auth::ConversationId};

/// Post-call event pushed by the voice-conversation provider once a transcript is ready.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEvent {
	/// Event type, e.g. `post_call_transcription`.
	#[serde(rename = "type")]
	pub kind: String,
	/// Unix timestamp at which the provider emitted the event.
	#[serde(default)]
	pub event_timestamp: Option<i64>,
	/// Event payload.
	pub data: ConversationEventData,
}
impl ConversationEvent {
	/// Event type emitted when a transcript becomes available.
	pub const POST_CALL_TRANSCRIPTION: &'static str = "post_call_transcription";

	/// Returns true for transcript-ready events.
	pub fn is_transcript_ready(&self) -> bool {
		self.kind == Self::POST_CALL_TRANSCRIPTION
	}
}

/// Payload section of a [`ConversationEvent`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEventData {
	/// Conversation the event refers to.
	pub conversation_id: ConversationId,
	/// Agent that handled the conversation.
	#[serde(default)]
	pub agent_id: Option<String>,
	/// Fields this crate does not model.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, Value>,
}
