use super::QrService;
use qrlink_proto::QrCodeGenerator;
use qrlink_proto::qr_code::{CreateQrReply, CreateQrRequest, DecodeQrReply, DecodeQrRequest};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// `qrcode.v1.QrCodeGenerator` over the shared [`QrService`].
#[derive(Debug, Clone)]
pub struct QrRpc {
    service: Arc<QrService>,
}

impl QrRpc {
    pub fn new(service: Arc<QrService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl QrCodeGenerator for QrRpc {
    async fn create_qr(
        &self,
        request: Request<CreateQrRequest>,
    ) -> Result<Response<CreateQrReply>, Status> {
        let qr_code_base64 = self.service.encode(&request.into_inner().url)?;
        Ok(Response::new(CreateQrReply { qr_code_base64 }))
    }

    async fn decode_qr(
        &self,
        request: Request<DecodeQrRequest>,
    ) -> Result<Response<DecodeQrReply>, Status> {
        let url = self.service.decode(&request.into_inner().qr_code_base64);
        Ok(Response::new(DecodeQrReply { url }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_codes_decode_back() {
        let rpc = QrRpc::new(Arc::new(QrService::new()));

        let qr_code_base64 = rpc
            .create_qr(Request::new(CreateQrRequest {
                url: "https://example.com".to_string(),
            }))
            .await
            .unwrap()
            .into_inner()
            .qr_code_base64;
        assert!(!qr_code_base64.is_empty());

        let url = rpc
            .decode_qr(Request::new(DecodeQrRequest { qr_code_base64 }))
            .await
            .unwrap()
            .into_inner()
            .url;
        assert_eq!(url, "https://example.com");
    }
}
