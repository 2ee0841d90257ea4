use qrlink_proto::link_shortener::{CreateLinkReply, CreateLinkRequest, GetUrlReply, GetUrlRequest};
use qrlink_proto::qr_code::{CreateQrReply, CreateQrRequest, DecodeQrReply, DecodeQrRequest};
use qrlink_proto::{LinkShortener, QrCodeGenerator};
use std::time::Duration;
use tonic::{Request, Response, Status};

// Canned answers keyed on the request content, so each test can pick the outcome it needs.
pub struct ScriptedLinks;

pub const SLOW_CODE: &str = "sl0w00";
pub const DOWN_CODE: &str = "d0wn00";

#[tonic::async_trait]
impl LinkShortener for ScriptedLinks {
    async fn create_link(
        &self,
        request: Request<CreateLinkRequest>,
    ) -> Result<Response<CreateLinkReply>, Status> {
        let url = request.into_inner().url;
        if url.contains("rejected") {
            return Err(Status::invalid_argument(format!("'{url}' is not allowed")));
        }
        Ok(Response::new(CreateLinkReply {
            short_url: "aB3_x9".to_string(),
        }))
    }

    async fn get_url(
        &self,
        request: Request<GetUrlRequest>,
    ) -> Result<Response<GetUrlReply>, Status> {
        match request.into_inner().short_url.as_str() {
            SLOW_CODE => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Response::new(GetUrlReply::default()))
            }
            DOWN_CODE => Err(Status::unavailable("backend is down")),
            "aB3_x9" => Ok(Response::new(GetUrlReply {
                url: "https://example.com/long".to_string(),
            })),
            _ => Ok(Response::new(GetUrlReply::default())),
        }
    }
}

pub struct ScriptedQr;

#[tonic::async_trait]
impl QrCodeGenerator for ScriptedQr {
    async fn create_qr(
        &self,
        request: Request<CreateQrRequest>,
    ) -> Result<Response<CreateQrReply>, Status> {
        Ok(Response::new(CreateQrReply {
            qr_code_base64: format!("png:{}", request.into_inner().url),
        }))
    }

    async fn decode_qr(
        &self,
        request: Request<DecodeQrRequest>,
    ) -> Result<Response<DecodeQrReply>, Status> {
        let image = request.into_inner().qr_code_base64;
        Ok(Response::new(DecodeQrReply {
            url: image.strip_prefix("png:").unwrap_or_default().to_string(),
        }))
    }
}
