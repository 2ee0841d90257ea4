//! # JSON <-> Protobuf Codec
//!
//! Implements `tonic::codec::Codec` so that `tonic` can carry `serde_json::Value` messages.
//!
//! 1. **Encoder (JSON -> Proto)**: validates the JSON against the input `MessageDescriptor`
//!    through `prost_reflect::DynamicMessage` and writes the Protobuf bytes.
//! 2. **Decoder (Proto -> JSON)**: decodes the bytes into a `DynamicMessage` of the output
//!    descriptor and converts it back into JSON, remembering how many bytes travelled.
//!
//! JSON field names follow the proto3 JSON mapping (`short_url` <-> `shortUrl`); both
//! spellings are accepted on input.
use prost::Message;
use prost::bytes::Buf;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

/// A decoded response together with its size on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub value: serde_json::Value,
    /// Length of the Protobuf encoding of the message.
    pub wire_size: usize,
}

/// Bridges `serde_json::Value` and the Protobuf binary format for one method.
pub struct JsonCodec {
    input: MessageDescriptor,
    output: MessageDescriptor,
}

impl JsonCodec {
    pub fn new(input: MessageDescriptor, output: MessageDescriptor) -> Self {
        Self { input, output }
    }
}

impl Codec for JsonCodec {
    type Encode = serde_json::Value;
    type Decode = DecodedMessage;

    type Encoder = JsonEncoder;
    type Decoder = JsonDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        JsonEncoder(self.input.clone())
    }

    fn decoder(&mut self) -> Self::Decoder {
        JsonDecoder(self.output.clone())
    }
}

pub struct JsonEncoder(MessageDescriptor);

impl Encoder for JsonEncoder {
    type Item = serde_json::Value;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        let msg = DynamicMessage::deserialize(self.0.clone(), item).map_err(|e| {
            Status::invalid_argument(format!(
                "Request does not match message '{}': {}",
                self.0.full_name(),
                e
            ))
        })?;

        msg.encode_raw(dst);
        Ok(())
    }
}

pub struct JsonDecoder(MessageDescriptor);

impl Decoder for JsonDecoder {
    type Item = DecodedMessage;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let wire_size = src.remaining();

        let mut msg = DynamicMessage::new(self.0.clone());
        msg.merge(src)
            .map_err(|e| Status::internal(format!("Failed to decode Protobuf bytes: {}", e)))?;

        let value = serde_json::to_value(&msg)
            .map_err(|e| Status::internal(format!("Failed to map response to JSON: {}", e)))?;

        Ok(Some(DecodedMessage { value, wire_size }))
    }
}
