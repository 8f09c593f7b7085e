// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-path paging limits.

use serde::Deserialize;

const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
	pub default_page_size: u32,
	pub max_page_size: u32,
}

impl Default for QueryConfig {
	fn default() -> Self {
		QueryConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryConfigLayer {
	#[serde(default)]
	pub default_page_size: Option<u32>,
	#[serde(default)]
	pub max_page_size: Option<u32>,
}

impl QueryConfigLayer {
	pub fn merge(&mut self, other: QueryConfigLayer) {
		if other.default_page_size.is_some() {
			self.default_page_size = other.default_page_size;
		}
		if other.max_page_size.is_some() {
			self.max_page_size = other.max_page_size;
		}
	}

	pub fn finalize(self) -> QueryConfig {
		QueryConfig {
			default_page_size: self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
			max_page_size: self.max_page_size.unwrap_or(DEFAULT_MAX_PAGE_SIZE),
		}
	}
}
