// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fingerprinting algorithm for grouping recurring errors into issues.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{IssueError, Result};

/// Number of stack frames that contribute to the fingerprint.
pub const MAX_STACK_FRAMES: usize = 5;

/// Messages longer than this are cut before hashing.
pub const MAX_MESSAGE_CHARS: usize = 512;

static HEX_ADDRESS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\b0x[0-9a-f]+\b").expect("valid address pattern"));

static UUID: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b")
		.expect("valid uuid pattern")
});

static LINE_COLUMN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r":\d+(?::\d+)?(\)?)$").expect("valid line/column pattern"));

static PYTHON_LINE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\bline \d+\b").expect("valid line pattern"));

static WHITESPACE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Compute the dedup key for an error report.
///
/// The fingerprint is a SHA256 hash based on:
/// 1. Normalized title (most significant)
/// 2. Normalized message, truncated to [`MAX_MESSAGE_CHARS`]
/// 3. The first [`MAX_STACK_FRAMES`] stack frames with line/column numbers stripped
///
/// Memory addresses and UUIDs are masked everywhere. Without a stack the key
/// depends on title and message only.
pub fn compute_fingerprint(title: &str, message: &str, stack: Option<&str>) -> Result<String> {
	let title = normalize(title);
	if title.is_empty() {
		return Err(IssueError::InvalidInput("title must not be empty".to_string()));
	}

	let message = normalize(message);
	if message.is_empty() {
		return Err(IssueError::InvalidInput(
			"message must not be empty".to_string(),
		));
	}
	let message = truncate_chars(&message, MAX_MESSAGE_CHARS);

	let mut hasher = Sha256::new();
	update_field(&mut hasher, &title);
	update_field(&mut hasher, message);

	for frame in stack_signature(stack.unwrap_or_default()) {
		update_field(&mut hasher, &frame);
	}

	Ok(hex::encode(hasher.finalize()))
}

/// The normalized frames that take part in the fingerprint.
pub fn stack_signature(stack: &str) -> Vec<String> {
	stack
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.take(MAX_STACK_FRAMES)
		.map(normalize_frame)
		.collect()
}

fn normalize(s: &str) -> String {
	let masked = mask_dynamic(s.trim());
	WHITESPACE.replace_all(&masked, " ").into_owned()
}

fn normalize_frame(line: &str) -> String {
	let frame = normalize(line);
	let frame = LINE_COLUMN.replace(&frame, "$1");
	PYTHON_LINE.replace_all(&frame, "line ?").into_owned()
}

fn mask_dynamic(s: &str) -> String {
	let s = UUID.replace_all(s, "<uuid>");
	HEX_ADDRESS.replace_all(&s, "0x?").into_owned()
}

// Length-prefixed so that field boundaries cannot shift between inputs.
fn update_field(hasher: &mut Sha256, field: &str) {
	hasher.update((field.len() as u64).to_le_bytes());
	hasher.update(field.as_bytes());
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
	match s.char_indices().nth(max_chars) {
		Some((idx, _)) => &s[..idx],
		None => s,
	}
}

/// Truncate a string to a maximum number of characters with ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
	if s.chars().count() <= max_len {
		s.to_string()
	} else {
		format!("{}...", truncate_chars(s, max_len.saturating_sub(3)))
	}
}
