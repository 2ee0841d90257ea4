use super::LinkService;
use qrlink_proto::LinkShortener;
use qrlink_proto::link_shortener::{CreateLinkReply, CreateLinkRequest, GetUrlReply, GetUrlRequest};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// `linkshortener.v1.LinkShortener` over the shared [`LinkService`].
#[derive(Debug, Clone)]
pub struct LinkRpc {
    service: Arc<LinkService>,
}

impl LinkRpc {
    pub fn new(service: Arc<LinkService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl LinkShortener for LinkRpc {
    async fn create_link(
        &self,
        request: Request<CreateLinkRequest>,
    ) -> Result<Response<CreateLinkReply>, Status> {
        let record = self.service.shorten(&request.into_inner().url, None, None)?;

        Ok(Response::new(CreateLinkReply {
            short_url: record.short_code,
        }))
    }

    async fn get_url(
        &self,
        request: Request<GetUrlRequest>,
    ) -> Result<Response<GetUrlReply>, Status> {
        let url = self.service.original_url(&request.into_inner().short_url);
        Ok(Response::new(GetUrlReply { url }))
    }
}
