//! # Link shortener
//!
//! [`LinkService`] holds the shortened links and implements every operation once; the REST
//! router ([`rest`]) and the RPC service ([`rpc`]) are thin adapters over it and share its
//! store.
pub mod rest;
pub mod rpc;

use crate::envelope::Page;
use crate::error::ServiceError;
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use qrlink_core::client::validate;
use serde::Serialize;

const MAX_CUSTOM_CODE_LENGTH: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub short_code: String,
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub clicks: u64,
    pub last_accessed: Option<DateTime<Utc>>,
}

/// A record as exposed to REST callers, with its public short URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    #[serde(flatten)]
    pub record: LinkRecord,
    pub short_url: String,
}

#[derive(Debug)]
pub struct LinkService {
    store: RecordStore<LinkRecord>,
    public_base: String,
}

impl LinkService {
    /// `public_base` is the address short URLs are built on, e.g. `http://localhost:8083`.
    pub fn new(public_base: impl Into<String>) -> Self {
        Self {
            store: RecordStore::new(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn view(&self, record: LinkRecord) -> LinkView {
        let short_url = format!("{}/api/v1/url/{}", self.public_base, record.short_code);
        LinkView { record, short_url }
    }

    /// Stores a new link under `custom_code`, or under a generated code.
    pub fn shorten(
        &self,
        url: &str,
        custom_code: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<LinkRecord, ServiceError> {
        validate::http_url(url).map_err(ServiceError::Validation)?;

        let make = |code: &str| LinkRecord {
            short_code: code.to_string(),
            original_url: url.to_string(),
            user_id: user_id.map(str::to_string),
            created_at: Utc::now(),
            clicks: 0,
            last_accessed: None,
        };

        let record = match custom_code {
            Some(code) => {
                validate_custom_code(code)?;
                let record = make(code);
                if !self.store.insert_new(code, record.clone()) {
                    return Err(ServiceError::Conflict(format!(
                        "Short code '{code}' is already in use"
                    )));
                }
                record
            }
            None => self.store.insert_fresh(make)?,
        };

        tracing::info!(code = %record.short_code, url = %record.original_url, "link created");
        Ok(record)
    }

    /// Looks a link up and counts the access.
    pub fn resolve(&self, code: &str) -> Result<LinkRecord, ServiceError> {
        self.store
            .update(code, |record| {
                record.clicks += 1;
                record.last_accessed = Some(Utc::now());
            })
            .ok_or_else(|| not_found(code))
    }

    /// Original URL behind `code`, empty when the code is unknown. Counts the access.
    pub fn original_url(&self, code: &str) -> String {
        self.resolve(code)
            .map(|record| record.original_url)
            .unwrap_or_default()
    }

    /// Looks a link up without counting an access.
    pub fn stats(&self, code: &str) -> Result<LinkRecord, ServiceError> {
        self.store.lookup(code).ok_or_else(|| not_found(code))
    }

    /// Shortens every URL, or none of them if any is invalid.
    pub fn bulk(
        &self,
        urls: &[String],
        user_id: Option<&str>,
    ) -> Result<Vec<LinkRecord>, ServiceError> {
        validate::batch_len("urls", urls.len()).map_err(ServiceError::Validation)?;
        urls.iter()
            .try_for_each(|url| validate::http_url(url))
            .map_err(ServiceError::Validation)?;

        urls.iter()
            .map(|url| self.shorten(url, None, user_id))
            .collect()
    }

    /// Newest links first, optionally only those of `user_id`.
    pub fn list(
        &self,
        page: u32,
        size: u32,
        user_id: Option<&str>,
    ) -> Result<Page<LinkRecord>, ServiceError> {
        validate::page(page, size).map_err(ServiceError::Validation)?;

        let mut records: Vec<LinkRecord> = self
            .store
            .values()
            .into_iter()
            .filter(|record| user_id.is_none() || record.user_id.as_deref() == user_id)
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.short_code.cmp(&b.short_code))
        });

        Ok(Page::slice(records, page, size))
    }

    pub fn delete(&self, code: &str) -> Result<LinkRecord, ServiceError> {
        let record = self.store.remove(code).ok_or_else(|| not_found(code))?;
        tracing::info!(%code, "link deleted");
        Ok(record)
    }
}

fn validate_custom_code(code: &str) -> Result<(), ServiceError> {
    validate::path_segment("customCode", code).map_err(ServiceError::Validation)?;
    if code.len() > MAX_CUSTOM_CODE_LENGTH {
        return Err(ServiceError::Validation(format!(
            "customCode must be at most {MAX_CUSTOM_CODE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn not_found(code: &str) -> ServiceError {
    ServiceError::NotFound(format!("Short code '{code}' not found"))
}
