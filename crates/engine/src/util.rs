//! Internal helpers for input normalization and paging.
//!
//! These utilities centralize validation so every operation enforces the same
//! rules on names, emails and page bounds.

use base64::Engine as _;
use rand::{RngCore, rngs::OsRng};
use serde::Serialize;

use crate::{EngineError, ResultEngine};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Trim a required name and enforce `1..=max_len` characters.
pub(crate) fn normalize_required_name(
    value: &str,
    label: &str,
    max_len: usize,
) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    if trimmed.chars().count() > max_len {
        return Err(EngineError::InvalidName(format!(
            "{label} name must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Lowercase and sanity-check an email address.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        });
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(EngineError::InvalidValue(format!("invalid email: {value}")));
    }
    Ok(email)
}

/// 32 random bytes, URL-safe base64 without padding.
pub(crate) fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<u64>, page_size: Option<u64>, default_size: u64) -> ResultEngine<Self> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(default_size);
        if page == 0 {
            return Err(EngineError::InvalidValue("page must be >= 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(EngineError::InvalidValue(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, page_size })
    }

    #[must_use]
    pub fn page(self) -> u64 {
        self.page
    }

    #[must_use]
    pub fn page_size(self) -> u64 {
        self.page_size
    }

    /// Zero-based index for `Paginator::fetch_page`.
    pub(crate) fn offset_page(self) -> u64 {
        self.page - 1
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages: total.div_ceil(request.page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_lowercased() {
        assert_eq!(
            normalize_email("  Ravi@Example.COM ").unwrap(),
            "ravi@example.com"
        );
        assert!(normalize_email("ravi").is_err());
        assert!(normalize_email("@example.com").is_err());
    }

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(a, b);
        let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&a)
            .unwrap();
        assert_eq!(raw.len(), 32);
    }

    #[test]
    fn page_bounds() {
        assert!(PageRequest::new(Some(0), None, 20).is_err());
        assert!(PageRequest::new(None, Some(101), 20).is_err());
        assert!(PageRequest::new(Some(1), Some(0), 20).is_err());
        assert_eq!(PageRequest::default().offset_page(), 0);
        let req = PageRequest::new(None, None, 50).unwrap();
        assert_eq!(req.page_size(), 50);
        assert_eq!(req.page(), 1);
        let page: Page<u8> = Page::new(Vec::new(), 101, req);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(
            normalize_required_name("  Sharma family ", "family", 100).unwrap(),
            "Sharma family"
        );
        assert!(normalize_required_name("   ", "family", 100).is_err());
        assert!(normalize_required_name(&"x".repeat(101), "family", 100).is_err());
    }
}
