//! Listing filters, sorting and pagination.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::blood_type::BloodType;
use super::request::{RequestStatus, Urgency};
use super::validation::ValidationError;

/// Column a request listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    CreatedAt,
    Urgency,
    Units,
    ExpiresAt,
}

impl FromStr for SortBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "createdAt" | "created_at" => Ok(SortBy::CreatedAt),
            "urgency" => Ok(SortBy::Urgency),
            "units" => Ok(SortBy::Units),
            "expiresAt" | "expires_at" => Ok(SortBy::ExpiresAt),
            other => Err(ValidationError::new(
                "sortBy",
                format!("unknown sort column {:?}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ValidationError::new(
                "sortOrder",
                format!("unknown sort order {:?}", other),
            )),
        }
    }
}

/// Filters for listing blood requests. `None` fields do not filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub blood_type: Option<BloodType>,
    pub city: Option<String>,
    pub urgency: Option<Urgency>,
    /// Case-insensitive substring over hospital, city and notes
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

/// Filters for browsing donors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DonorFilter {
    pub blood_type: Option<BloodType>,
    pub city: Option<String>,
    pub available_only: bool,
}

/// 1-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }
}
