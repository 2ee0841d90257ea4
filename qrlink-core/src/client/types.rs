use crate::error::CallError;
use crate::metrics::Metrics;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Normalized result payload, identical in shape whatever the protocol.
pub type Payload = Map<String, Value>;

/// The protocol-independent actions exposed by the clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ShortenUrl,
    ResolveUrl,
    GetUrlStats,
    BulkShortenUrls,
    ListUrls,
    DeleteUrl,
    GenerateQr,
    DecodeQr,
    GenerateQrBatch,
    GetQr,
    ListQrs,
    DeleteQr,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ShortenUrl => "shortenUrl",
            Operation::ResolveUrl => "resolveUrl",
            Operation::GetUrlStats => "getUrlStats",
            Operation::BulkShortenUrls => "bulkShortenUrls",
            Operation::ListUrls => "listUrls",
            Operation::DeleteUrl => "deleteUrl",
            Operation::GenerateQr => "generateQr",
            Operation::DecodeQr => "decodeQr",
            Operation::GenerateQrBatch => "generateQrBatch",
            Operation::GetQr => "getQr",
            Operation::ListQrs => "listQrs",
            Operation::DeleteQr => "deleteQr",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a successful logical operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub payload: Payload,
    pub metrics: Metrics,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QrFormat {
    #[default]
    Png,
    Svg,
}

impl QrFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            QrFormat::Png => "PNG",
            QrFormat::Svg => "SVG",
        }
    }
}

impl FromStr for QrFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PNG" => Ok(QrFormat::Png),
            "SVG" => Ok(QrFormat::Svg),
            other => Err(format!("unknown QR format '{other}', expected PNG or SVG")),
        }
    }
}

impl fmt::Display for QrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// QR error correction level, from 7% (`Low`) to 30% (`High`) recoverable codewords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorCorrection {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

impl ErrorCorrection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCorrection::Low => "LOW",
            ErrorCorrection::Medium => "MEDIUM",
            ErrorCorrection::Quartile => "QUARTILE",
            ErrorCorrection::High => "HIGH",
        }
    }
}

impl FromStr for ErrorCorrection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" | "L" => Ok(ErrorCorrection::Low),
            "MEDIUM" | "M" => Ok(ErrorCorrection::Medium),
            "QUARTILE" | "Q" => Ok(ErrorCorrection::Quartile),
            "HIGH" | "H" => Ok(ErrorCorrection::High),
            other => Err(format!(
                "unknown error correction '{other}', expected LOW, MEDIUM, QUARTILE or HIGH"
            )),
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ShortenUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            custom_code: None,
            user_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShortCode(pub String);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkShorten {
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    /// Only honoured by URL listing.
    pub user_id: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: 10,
            user_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQr {
    pub data: String,
    #[serde(default)]
    pub format: QrFormat,
    #[serde(default = "default_qr_size")]
    pub size: u32,
    #[serde(default)]
    pub error_correction: ErrorCorrection,
}

pub const DEFAULT_QR_SIZE: u32 = 256;

fn default_qr_size() -> u32 {
    DEFAULT_QR_SIZE
}

impl GenerateQr {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            format: QrFormat::default(),
            size: DEFAULT_QR_SIZE,
            error_correction: ErrorCorrection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeQr {
    /// Base64 PNG (or SVG text) as returned by `generateQr`.
    pub qr_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrBatch {
    pub requests: Vec<GenerateQr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QrId(pub String);

/// Checks run on the caller side before anything is sent.
pub trait Validate {
    fn validate(&self) -> Result<(), CallError>;
}

pub mod validate {
    //! Input rules shared by the clients and the services.
    use std::ops::RangeInclusive;

    pub const QR_SIZE: RangeInclusive<u32> = 64..=2048;
    pub const MAX_BATCH: usize = 100;
    pub const PAGE_SIZE: RangeInclusive<u32> = 1..=100;

    /// Accepts absolute `http`/`https` URLs only.
    pub fn http_url(url: &str) -> Result<(), String> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| format!("'{url}' is not a valid URL: {e}"))?;
        match parsed.scheme() {
            "http" | "https" if parsed.has_host() => Ok(()),
            "http" | "https" => Err(format!("'{url}' has no host")),
            scheme => Err(format!("'{url}' uses unsupported scheme '{scheme}'")),
        }
    }

    pub fn not_blank(field: &str, value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err(format!("{field} must not be empty"));
        }
        Ok(())
    }

    /// Short codes and record ids travel as one URL path segment: letters, digits, `-`, `_`.
    pub fn path_segment(field: &str, value: &str) -> Result<(), String> {
        not_blank(field, value)?;
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(format!(
                "{field} '{value}' contains '{c}', only letters, digits, '-' and '_' are allowed"
            ));
        }
        Ok(())
    }

    pub fn qr_size(size: u32) -> Result<(), String> {
        if !QR_SIZE.contains(&size) {
            return Err(format!(
                "size must be between {} and {}, got {size}",
                QR_SIZE.start(),
                QR_SIZE.end()
            ));
        }
        Ok(())
    }

    pub fn batch_len(field: &str, len: usize) -> Result<(), String> {
        if len == 0 || len > MAX_BATCH {
            return Err(format!(
                "{field} must contain between 1 and {MAX_BATCH} entries, got {len}"
            ));
        }
        Ok(())
    }

    pub fn page(page: u32, size: u32) -> Result<(), String> {
        if page == 0 {
            return Err("page must be at least 1".to_string());
        }
        if !PAGE_SIZE.contains(&size) {
            return Err(format!(
                "size must be between {} and {}, got {size}",
                PAGE_SIZE.start(),
                PAGE_SIZE.end()
            ));
        }
        Ok(())
    }
}

impl Validate for ShortenUrl {
    fn validate(&self) -> Result<(), CallError> {
        validate::http_url(&self.url).map_err(CallError::Validation)?;
        if let Some(code) = &self.custom_code {
            validate::path_segment("customCode", code).map_err(CallError::Validation)?;
        }
        Ok(())
    }
}

impl Validate for ShortCode {
    fn validate(&self) -> Result<(), CallError> {
        validate::path_segment("short code", &self.0).map_err(CallError::Validation)
    }
}

impl Validate for BulkShorten {
    fn validate(&self) -> Result<(), CallError> {
        validate::batch_len("urls", self.urls.len()).map_err(CallError::Validation)?;
        self.urls
            .iter()
            .try_for_each(|url| validate::http_url(url))
            .map_err(CallError::Validation)
    }
}

impl Validate for PageRequest {
    fn validate(&self) -> Result<(), CallError> {
        validate::page(self.page, self.size).map_err(CallError::Validation)
    }
}

impl Validate for GenerateQr {
    fn validate(&self) -> Result<(), CallError> {
        validate::not_blank("data", &self.data).map_err(CallError::Validation)?;
        validate::qr_size(self.size).map_err(CallError::Validation)
    }
}

impl Validate for DecodeQr {
    fn validate(&self) -> Result<(), CallError> {
        validate::not_blank("qrCode", &self.qr_code).map_err(CallError::Validation)
    }
}

impl Validate for QrBatch {
    fn validate(&self) -> Result<(), CallError> {
        validate::batch_len("requests", self.requests.len()).map_err(CallError::Validation)?;
        self.requests.iter().try_for_each(Validate::validate)
    }
}

impl Validate for QrId {
    fn validate(&self) -> Result<(), CallError> {
        validate::path_segment("id", &self.0).map_err(CallError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn urls_must_be_absolute_http() {
        assert!(validate::http_url("https://example.com/a?b=c").is_ok());
        assert!(validate::http_url("http://localhost:8080").is_ok());
        assert!(validate::http_url("ftp://example.com").is_err());
        assert!(validate::http_url("example.com").is_err());
        assert!(validate::http_url("").is_err());
    }

    #[test]
    fn codes_and_ids_are_single_path_segments() {
        assert!(ShortCode("aB3_x9".to_string()).validate().is_ok());
        assert!(QrId("qr-1".to_string()).validate().is_ok());

        for bad in ["FyXrQb#nope", "FyXrQb?nope=1", "a/b", "..%2F", "", " "] {
            let result = ShortCode(bad.to_string()).validate();
            assert!(
                matches!(result, Err(CallError::Validation(_))),
                "{bad:?} should be rejected"
            );
            assert!(QrId(bad.to_string()).validate().is_err());
        }

        let custom = ShortenUrl {
            custom_code: Some("my#code".to_string()),
            ..ShortenUrl::new("https://example.com")
        };
        assert!(custom.validate().is_err());
    }

    #[test]
    fn qr_arguments_are_bounded() {
        assert!(GenerateQr::new("hello").validate().is_ok());
        assert!(GenerateQr::new("  ").validate().is_err());

        let mut request = GenerateQr::new("hello");
        request.size = 32;
        assert!(matches!(request.validate(), Err(CallError::Validation(_))));
        request.size = 2048;
        assert!(request.validate().is_ok());

        let batch = QrBatch { requests: vec![] };
        assert!(batch.validate().is_err());
        let batch = QrBatch {
            requests: vec![GenerateQr::new("x"); 101],
        };
        assert!(batch.validate().is_err());
    }

    #[test]
    fn paging_is_bounded() {
        assert!(PageRequest::default().validate().is_ok());
        let zero_page = PageRequest {
            page: 0,
            ..Default::default()
        };
        assert!(zero_page.validate().is_err());
        let huge = PageRequest {
            size: 101,
            ..Default::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn generate_request_uses_wire_names() {
        let request = GenerateQr {
            error_correction: ErrorCorrection::High,
            ..GenerateQr::new("hello")
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"data": "hello", "format": "PNG", "size": 256, "errorCorrection": "HIGH"})
        );

        let parsed: GenerateQr = serde_json::from_value(json!({"data": "x"})).unwrap();
        assert_eq!(parsed, GenerateQr::new("x"));
    }

    #[test]
    fn levels_parse_leniently() {
        let level: ErrorCorrection = "q".parse().unwrap();
        assert_eq!(level, ErrorCorrection::Quartile);
        assert_eq!("svg".parse::<QrFormat>().unwrap(), QrFormat::Svg);
        assert!("jpeg".parse::<QrFormat>().is_err());
        assert_eq!(Operation::BulkShortenUrls.to_string(), "bulkShortenUrls");
    }
}
