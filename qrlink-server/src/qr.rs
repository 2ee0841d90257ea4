//! # QR generator
//!
//! Renders QR codes as base64 PNG images or SVG documents. Every image handed out is
//! remembered, so a code produced here can be decoded back to its data.
pub mod rest;
pub mod rpc;

use crate::envelope::Page;
use crate::error::ServiceError;
use crate::store::RecordStore;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use qrlink_core::client::{ErrorCorrection, GenerateQr, QrFormat, validate};
use serde::Serialize;
use std::io::Cursor;

/// Pixel size of one module in images produced for RPC callers.
const RPC_MODULE_PIXELS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrRecord {
    pub id: String,
    pub data: String,
    pub format: QrFormat,
    pub size: u32,
    pub error_correction: ErrorCorrection,
    /// Base64 PNG, or SVG markup.
    pub qr_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct QrService {
    records: RecordStore<QrRecord>,
    /// Encoded image -> encoded data.
    images: RecordStore<String>,
}

impl QrService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self, request: &GenerateQr) -> Result<QrRecord, ServiceError> {
        check(request)?;
        let qr_code = render(
            &request.data,
            request.format,
            request.size,
            request.error_correction,
        )?;

        let record = self.records.insert_fresh(|id| QrRecord {
            id: id.to_string(),
            data: request.data.clone(),
            format: request.format,
            size: request.size,
            error_correction: request.error_correction,
            qr_code: qr_code.clone(),
            created_at: Utc::now(),
        })?;
        self.images.put(qr_code, request.data.clone());

        tracing::info!(id = %record.id, format = %record.format, "QR code generated");
        Ok(record)
    }

    /// PNG with quartile error correction and fixed module size, as served over RPC.
    pub fn encode(&self, data: &str) -> Result<String, ServiceError> {
        validate::not_blank("url", data).map_err(ServiceError::Validation)?;

        let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::Q)
            .map_err(|e| ServiceError::Validation(format!("Cannot encode data: {e}")))?;
        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(RPC_MODULE_PIXELS, RPC_MODULE_PIXELS)
            .build();
        let qr_code = png_base64(DynamicImage::ImageLuma8(image))?;

        self.images.put(qr_code.clone(), data.to_string());
        Ok(qr_code)
    }

    /// Data encoded by an image this service produced, empty for any other image.
    pub fn decode(&self, qr_code: &str) -> String {
        self.images.get(qr_code)
    }

    /// Generates every code, or none of them if any request is invalid.
    pub fn batch(&self, requests: &[GenerateQr]) -> Result<Vec<QrRecord>, ServiceError> {
        validate::batch_len("requests", requests.len()).map_err(ServiceError::Validation)?;
        requests.iter().try_for_each(check)?;

        requests
            .iter()
            .map(|request| self.generate(request))
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<QrRecord, ServiceError> {
        self.records.lookup(id).ok_or_else(|| not_found(id))
    }

    /// Newest codes first.
    pub fn list(&self, page: u32, size: u32) -> Result<Page<QrRecord>, ServiceError> {
        validate::page(page, size).map_err(ServiceError::Validation)?;

        let mut records = self.records.values();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(Page::slice(records, page, size))
    }

    pub fn delete(&self, id: &str) -> Result<QrRecord, ServiceError> {
        let record = self.records.remove(id).ok_or_else(|| not_found(id))?;
        self.images.remove(&record.qr_code);
        Ok(record)
    }
}

fn check(request: &GenerateQr) -> Result<(), ServiceError> {
    validate::not_blank("data", &request.data).map_err(ServiceError::Validation)?;
    validate::qr_size(request.size).map_err(ServiceError::Validation)
}

fn not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("QR code '{id}' not found"))
}

fn ec_level(level: ErrorCorrection) -> EcLevel {
    match level {
        ErrorCorrection::Low => EcLevel::L,
        ErrorCorrection::Medium => EcLevel::M,
        ErrorCorrection::Quartile => EcLevel::Q,
        ErrorCorrection::High => EcLevel::H,
    }
}

/// Renders `data` at no less than `size` pixels per side.
pub fn render(
    data: &str,
    format: QrFormat,
    size: u32,
    level: ErrorCorrection,
) -> Result<String, ServiceError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), ec_level(level))
        .map_err(|e| ServiceError::Validation(format!("Cannot encode data: {e}")))?;

    match format {
        QrFormat::Png => {
            let image = code.render::<Luma<u8>>().min_dimensions(size, size).build();
            png_base64(DynamicImage::ImageLuma8(image))
        }
        QrFormat::Svg => Ok(code
            .render::<svg::Color>()
            .min_dimensions(size, size)
            .build()),
    }
}

fn png_base64(image: DynamicImage) -> Result<String, ServiceError> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| ServiceError::Internal(format!("Failed to encode PNG: {e}")))?;
    Ok(STANDARD.encode(bytes.into_inner()))
}
