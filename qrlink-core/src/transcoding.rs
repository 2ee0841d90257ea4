//! # JSON transcoding
//!
//! Resolves an HTTP `(verb, path)` pair to the RPC method bound to it by
//! [`qrlink_proto::HTTP_RULES`], and converts between gRPC statuses and HTTP statuses.
//!
//! The server gateway uses this to expose RPC methods as JSON endpoints; the native RPC
//! transport uses it to send the very same wire requests over gRPC.
use prost_reflect::{DescriptorError, DescriptorPool, MethodDescriptor};
use qrlink_proto::{FILE_DESCRIPTOR_SET, HTTP_RULES, HttpRule, HttpVerb};
use serde_json::{Map, Value, json};
use tonic::{Code, Status};

#[derive(Debug, thiserror::Error)]
pub enum TranscodingError {
    #[error("Failed to decode file descriptor set: '{0}'")]
    Descriptor(#[from] DescriptorError),
    #[error("Method '{service}/{method}' bound by an HTTP rule is missing from the schema")]
    MethodNotFound {
        service: &'static str,
        method: &'static str,
    },
}

/// A rule paired with the descriptor of the method it binds.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    pub rule: &'static HttpRule,
    pub method: MethodDescriptor,
}

/// Every HTTP rule, resolved against a descriptor pool.
#[derive(Debug, Clone)]
pub struct TranscodingTable {
    bindings: Vec<BoundMethod>,
}

impl TranscodingTable {
    /// Builds the table from the descriptor set compiled into `qrlink-proto`.
    pub fn load() -> Result<Self, TranscodingError> {
        Self::from_descriptor_set(FILE_DESCRIPTOR_SET)
    }

    pub fn from_descriptor_set(bytes: &[u8]) -> Result<Self, TranscodingError> {
        let pool = DescriptorPool::decode(bytes)?;

        let bindings = HTTP_RULES
            .iter()
            .map(|rule| {
                pool.get_service_by_name(rule.service)
                    .and_then(|service| service.methods().find(|m| m.name() == rule.method))
                    .map(|method| BoundMethod { rule, method })
                    .ok_or(TranscodingError::MethodNotFound {
                        service: rule.service,
                        method: rule.method,
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { bindings })
    }

    /// Bindings of the methods of one service.
    pub fn for_service<'a>(&'a self, service: &'a str) -> impl Iterator<Item = &'a BoundMethod> {
        self.bindings
            .iter()
            .filter(move |b| b.rule.service == service)
    }

    /// Finds the method bound to `(verb, path)` and extracts its path parameters.
    ///
    /// Rules are tried in declaration order; literal segments must match exactly and
    /// `{field}` segments capture one non-empty segment.
    pub fn resolve(
        &self,
        verb: &http::Method,
        path: &str,
    ) -> Option<(&BoundMethod, Map<String, Value>)> {
        self.bindings.iter().find_map(|binding| {
            if verb_of(binding.rule.verb) != *verb {
                return None;
            }
            match_template(binding.rule.path, path).map(|params| (binding, params))
        })
    }
}

pub fn verb_of(verb: HttpVerb) -> http::Method {
    match verb {
        HttpVerb::Get => http::Method::GET,
        HttpVerb::Post => http::Method::POST,
    }
}

/// Matches `path` against a `/literal/{field}` template.
pub fn match_template(template: &str, path: &str) -> Option<Map<String, Value>> {
    let path = path.split('?').next().unwrap_or_default();
    let template_segments: Vec<&str> = template.trim_start_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    if template_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = Map::new();
    for (expected, actual) in template_segments.iter().zip(&path_segments) {
        match expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(_) if actual.is_empty() => return None,
            Some(field) => {
                params.insert(field.to_string(), Value::String(actual.to_string()));
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

/// Builds the request message from the JSON body and the path parameters.
///
/// Path parameters win over body fields of the same name.
pub fn merge_path_params(body: Option<Value>, params: Map<String, Value>) -> Value {
    let mut message = match body {
        Some(Value::Object(fields)) => fields,
        _ => Map::new(),
    };
    message.extend(params);
    Value::Object(message)
}

/// HTTP status a transcoding gateway answers for a gRPC status code.
pub fn http_status(code: Code) -> u16 {
    match code {
        Code::Ok => 200,
        Code::Cancelled => 499,
        Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => 400,
        Code::Unauthenticated => 401,
        Code::PermissionDenied => 403,
        Code::NotFound => 404,
        Code::AlreadyExists | Code::Aborted => 409,
        Code::ResourceExhausted => 429,
        Code::Unimplemented => 501,
        Code::Unavailable => 503,
        Code::DeadlineExceeded => 504,
        Code::Unknown | Code::Internal | Code::DataLoss => 500,
    }
}

/// JSON error body of a transcoded call.
pub fn status_body(status: &Status) -> Value {
    json!({
        "code": status.code() as i32,
        "message": status.message(),
        "details": [],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_binds_every_rule() {
        let table = TranscodingTable::load().unwrap();
        assert_eq!(table.bindings.len(), HTTP_RULES.len());
        let links = table.for_service(qrlink_proto::LINK_SHORTENER_SERVICE);
        assert_eq!(links.count(), 2);
    }

    #[test]
    fn resolve_extracts_path_parameters() {
        let table = TranscodingTable::load().unwrap();

        let (binding, params) = table.resolve(&http::Method::GET, "/aB3_x9").unwrap();
        assert_eq!(binding.method.name(), "GetUrl");
        assert_eq!(params["short_url"], "aB3_x9");

        let (binding, params) = table.resolve(&http::Method::POST, "/v1/links").unwrap();
        assert_eq!(binding.method.name(), "CreateLink");
        assert!(params.is_empty());
    }

    #[test]
    fn resolve_requires_matching_verb_and_shape() {
        let table = TranscodingTable::load().unwrap();
        assert!(table.resolve(&http::Method::GET, "/v1/links").is_none());
        assert!(table.resolve(&http::Method::DELETE, "/abc").is_none());
        assert!(table.resolve(&http::Method::GET, "/").is_none());
    }

    #[test]
    fn path_params_override_body_fields() {
        let mut params = Map::new();
        params.insert("short_url".to_string(), json!("fromPath"));

        let merged = merge_path_params(Some(json!({"short_url": "fromBody", "x": 1})), params);
        assert_eq!(merged, json!({"short_url": "fromPath", "x": 1}));
        assert_eq!(merge_path_params(None, Map::new()), json!({}));
    }

    #[test]
    fn status_mapping_follows_transcoding_conventions() {
        assert_eq!(http_status(Code::NotFound), 404);
        assert_eq!(http_status(Code::InvalidArgument), 400);
        assert_eq!(http_status(Code::Unimplemented), 501);

        let body = status_body(&Status::invalid_argument("url is required"));
        assert_eq!(body["code"], 3);
        assert_eq!(body["message"], "url is required");
    }
}
