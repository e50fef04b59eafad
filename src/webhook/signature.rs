// std
use std::slice::Iter;

/// A `version,signature` token parsed from the signature header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureEntry {
	/// Scheme tag such as `v1`.
	pub version: String,
	/// Hex-encoded signature as sent.
	pub signature: String,
}

/// Ordered candidate signatures carried by one webhook.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureSet(Vec<SignatureEntry>);
impl SignatureSet {
	/// Parses space-separated `version,signature` tokens, skipping tokens that do not have a
	/// non-empty version and signature.
	pub fn parse(header: &str) -> Self {
		let entries = header
			.split_whitespace()
			.filter_map(|token| {
				let (version, signature) = token.split_once(',')?;

				if version.is_empty() || signature.is_empty() || signature.contains(',') {
					return None;
				}

				Some(SignatureEntry { version: version.to_owned(), signature: signature.to_owned() })
			})
			.collect();

		Self(entries)
	}

	/// Returns true when no token could be parsed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of parsed tokens.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Iterates the parsed tokens in header order.
	pub fn iter(&self) -> Iter<'_, SignatureEntry> {
		self.0.iter()
	}
}
impl<'a> IntoIterator for &'a SignatureSet {
	type IntoIter = Iter<'a, SignatureEntry>;
	type Item = &'a SignatureEntry;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_multiple_tokens_and_skips_garbage() {
		let set = SignatureSet::parse("v1,aa garbage ,bb v1, v2,cc,dd  v1a,ee");
		let parsed = set.iter().map(|e| (e.version.as_str(), e.signature.as_str())).collect::<Vec<_>>();

		assert_eq!(parsed, vec![("v1", "aa"), ("v1a", "ee")]);
	}

	#[test]
	fn empty_header_yields_empty_set() {
		assert!(SignatureSet::parse("").is_empty());
		assert!(SignatureSet::parse("   ").is_empty());
		assert_eq!(SignatureSet::parse("v1,00").len(), 1);
	}
}
