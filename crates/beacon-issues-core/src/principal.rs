// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated caller of an issue action.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IssueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	Admin,
	User,
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Admin => write!(f, "admin"),
			Self::User => write!(f, "user"),
		}
	}
}

impl FromStr for Role {
	type Err = IssueError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(Self::Admin),
			"user" => Ok(Self::User),
			_ => Err(IssueError::InvalidRole(s.to_string())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	pub id: String,
	pub role: Role,
}

impl Principal {
	pub fn new(id: impl Into<String>, role: Role) -> Self {
		Self {
			id: id.into(),
			role,
		}
	}

	pub fn admin(id: impl Into<String>) -> Self {
		Self::new(id, Role::Admin)
	}

	pub fn user(id: impl Into<String>) -> Self {
		Self::new(id, Role::User)
	}

	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}
}
