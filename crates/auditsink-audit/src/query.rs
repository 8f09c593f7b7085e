// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read path: paged listing, filtered search and point lookup.

use std::sync::Arc;

use auditsink_config::QueryConfig;
use tracing::instrument;
use uuid::Uuid;

use crate::error::AuditResult;
use crate::event::AuditEvent;
use crate::store::{EventStore, PageRequest, SearchCriteria, SortField, SortOrder};

/// One page of results plus the totals needed to navigate.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
	pub content: Vec<T>,
	pub page: u32,
	pub size: u32,
	pub total_elements: u64,
	pub total_pages: u64,
	pub first: bool,
	pub last: bool,
}

impl<T> Page<T> {
	pub fn of(content: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
		let total_pages = if size == 0 {
			0
		} else {
			total_elements.div_ceil(u64::from(size))
		};

		Self {
			content,
			page,
			size,
			total_elements,
			total_pages,
			first: page == 0,
			last: i128::from(page) >= i128::from(total_pages) - 1,
		}
	}

	pub fn map<U, F>(self, f: F) -> Page<U>
	where
		F: FnMut(T) -> U,
	{
		Page {
			content: self.content.into_iter().map(f).collect(),
			page: self.page,
			size: self.size,
			total_elements: self.total_elements,
			total_pages: self.total_pages,
			first: self.first,
			last: self.last,
		}
	}
}

#[derive(Clone)]
pub struct QueryEngine {
	store: Arc<dyn EventStore>,
	config: QueryConfig,
}

impl QueryEngine {
	pub fn new(store: Arc<dyn EventStore>, config: QueryConfig) -> Self {
		Self { store, config }
	}

	/// Resolve raw paging parameters. Size is clamped to `[1, max_page_size]`
	/// and unknown sort fields fall back to the default.
	pub fn page_request(
		&self,
		page: Option<u32>,
		size: Option<u32>,
		sort_by: Option<&str>,
		sort_order: Option<&str>,
	) -> PageRequest {
		let size = size
			.unwrap_or(self.config.default_page_size)
			.clamp(1, self.config.max_page_size.max(1));

		PageRequest {
			page: page.unwrap_or(0),
			size,
			sort_field: SortField::parse_lenient(sort_by),
			sort_order: SortOrder::parse_lenient(sort_order),
		}
	}

	#[instrument(skip(self, criteria), fields(page = page.page, size = page.size, sort = %page.sort_field))]
	pub async fn search(
		&self,
		criteria: &SearchCriteria,
		page: PageRequest,
	) -> AuditResult<Page<AuditEvent>> {
		let content = self.store.scan(criteria, &page).await?;
		let total = self.store.count(criteria).await?;
		tracing::debug!(returned = content.len(), total, "search complete");
		Ok(Page::of(content, page.page, page.size, total))
	}

	pub async fn list(&self, page: PageRequest) -> AuditResult<Page<AuditEvent>> {
		self.search(&SearchCriteria::default(), page).await
	}

	#[instrument(skip(self))]
	pub async fn get(&self, id: Uuid) -> AuditResult<Option<AuditEvent>> {
		Ok(self.store.find_by_id(id).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MemoryStore;

	#[test]
	fn test_page_math_45_by_20() {
		let first = Page::of(vec![(); 20], 0, 20, 45);
		assert_eq!(first.total_pages, 3);
		assert!(first.first);
		assert!(!first.last);

		let middle = Page::of(vec![(); 20], 1, 20, 45);
		assert!(!middle.first);
		assert!(!middle.last);

		let final_page = Page::of(vec![(); 5], 2, 20, 45);
		assert!(final_page.last);
	}

	#[test]
	fn test_page_math_empty() {
		let page: Page<()> = Page::of(Vec::new(), 0, 20, 0);
		assert_eq!(page.total_pages, 0);
		assert!(page.first);
		assert!(page.last);
	}

	#[test]
	fn test_page_math_exact_multiple() {
		let page = Page::of(vec![(); 20], 1, 20, 40);
		assert_eq!(page.total_pages, 2);
		assert!(page.last);
	}

	#[test]
	fn test_page_past_end_is_last() {
		let page: Page<()> = Page::of(Vec::new(), 7, 20, 45);
		assert!(page.last);
		assert!(page.content.is_empty());
	}

	#[test]
	fn test_map_keeps_navigation() {
		let page = Page::of(vec![1, 2], 0, 2, 3).map(|n| n * 10);
		assert_eq!(page.content, vec![10, 20]);
		assert_eq!(page.total_pages, 2);
	}

	#[test]
	fn test_page_request_clamps_size() {
		let engine = QueryEngine::new(
			Arc::new(MemoryStore::default()),
			QueryConfig {
				default_page_size: 20,
				max_page_size: 100,
			},
		);

		assert_eq!(engine.page_request(None, None, None, None).size, 20);
		assert_eq!(engine.page_request(None, Some(0), None, None).size, 1);
		assert_eq!(engine.page_request(None, Some(5000), None, None).size, 100);

		let req = engine.page_request(Some(3), Some(10), Some("tenant_id"), Some("asc"));
		assert_eq!(req.page, 3);
		assert_eq!(req.sort_field, SortField::TenantId);
		assert_eq!(req.sort_order, SortOrder::Asc);
	}

	#[tokio::test]
	async fn test_search_wraps_results() {
		let store = Arc::new(MemoryStore::default());
		for i in 0..45 {
			store.push(crate::testing::sample_event(&format!("key-{i}"), "t-1"));
		}
		let engine = QueryEngine::new(store, QueryConfig::default());

		let page = engine
			.list(engine.page_request(Some(2), Some(20), None, None))
			.await
			.unwrap();
		assert_eq!(page.content.len(), 5);
		assert_eq!(page.total_elements, 45);
		assert_eq!(page.total_pages, 3);
		assert!(page.last);
	}

	#[tokio::test]
	async fn test_get_missing_returns_none() {
		let engine = QueryEngine::new(Arc::new(MemoryStore::default()), QueryConfig::default());
		assert!(engine.get(Uuid::new_v4()).await.unwrap().is_none());
	}
}
