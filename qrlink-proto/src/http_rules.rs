//! # HTTP transcoding rules
//!
//! Each RPC method is reachable through exactly one `(verb, path)` pair. Path templates
//! use `{field}` segments naming a field of the request message; the rest of the request
//! message is taken from the JSON body.

use crate::{LINK_SHORTENER_SERVICE, QR_CODE_SERVICE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
        }
    }
}

/// Binds an RPC method to an HTTP verb and path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpRule {
    /// Fully qualified service name (e.g. `linkshortener.v1.LinkShortener`).
    pub service: &'static str,
    /// Method name as declared in the proto file (e.g. `CreateLink`).
    pub method: &'static str,
    pub verb: HttpVerb,
    /// Path template, e.g. `/{short_url}`.
    pub path: &'static str,
}

impl HttpRule {
    /// Names of the `{field}` segments of the path template, in order.
    pub fn path_fields(&self) -> impl Iterator<Item = &'static str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
    }

    /// Returns the rules that belong to `service`.
    pub fn for_service(service: &str) -> impl Iterator<Item = &'static HttpRule> {
        HTTP_RULES
            .iter()
            .filter(move |rule| rule.service == service)
    }
}

pub const HTTP_RULES: &[HttpRule] = &[
    HttpRule {
        service: LINK_SHORTENER_SERVICE,
        method: "CreateLink",
        verb: HttpVerb::Post,
        path: "/v1/links",
    },
    HttpRule {
        service: LINK_SHORTENER_SERVICE,
        method: "GetUrl",
        verb: HttpVerb::Get,
        path: "/{short_url}",
    },
    HttpRule {
        service: QR_CODE_SERVICE,
        method: "CreateQr",
        verb: HttpVerb::Post,
        path: "/v1/qrcode/encode",
    },
    HttpRule {
        service: QR_CODE_SERVICE,
        method: "DecodeQr",
        verb: HttpVerb::Post,
        path: "/v1/qrcode/decode",
    },
];
