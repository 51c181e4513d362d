//! Shared method tables and codecs for typerpc-core integration tests

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use typerpc_core::{
    CorrelationResolver, Message, MessageCodec, MethodDescriptor, MethodTable,
    NotificationMessage, RequestMessage, ResponseMessage, TypeHandle,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooResult {
    pub x: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentItem {
    pub uri: String,
    pub language_id: String,
    pub version: i32,
}

/// Methods used across the integration tests
///
/// - `add(int, int) -> FooResult`
/// - `foo(int, int) -> int`
/// - `echo(String) -> String`
/// - `shutdown() -> ()`
/// - `textDocument/didOpen(TextDocumentItem)` notification
pub fn method_table() -> MethodTable {
    MethodTable::try_from_iter([
        MethodDescriptor::request(
            "add",
            TypeHandle::of::<FooResult>(),
            vec![TypeHandle::of::<i32>(), TypeHandle::of::<i32>()],
        ),
        MethodDescriptor::request(
            "foo",
            TypeHandle::of::<i32>(),
            vec![TypeHandle::of::<i32>(), TypeHandle::of::<i32>()],
        ),
        MethodDescriptor::request(
            "echo",
            TypeHandle::of::<String>(),
            vec![TypeHandle::of::<String>()],
        ),
        MethodDescriptor::request("shutdown", TypeHandle::of::<()>(), vec![]),
        MethodDescriptor::notification(
            "textDocument/didOpen",
            vec![TypeHandle::of::<TextDocumentItem>()],
        ),
    ])
    .expect("valid descriptors")
}

/// Codec without correlation: every result stays untyped
pub fn codec() -> MessageCodec {
    MessageCodec::new(Arc::new(method_table()))
}

/// Codec resolving response ids through `resolver`
pub fn correlated_codec(resolver: Arc<dyn CorrelationResolver>) -> MessageCodec {
    codec().with_correlation(resolver)
}

pub fn decode(codec: &MessageCodec, json: &str) -> Message {
    codec
        .decode_str(json)
        .expect("decode should succeed")
        .expect("input should not be null")
}

pub fn expect_request(message: Message) -> RequestMessage {
    match message {
        Message::Request(request) => request,
        other => panic!("Expected request, got {:?}", other),
    }
}

pub fn expect_response(message: Message) -> ResponseMessage {
    match message {
        Message::Response(response) => response,
        other => panic!("Expected response, got {:?}", other),
    }
}

pub fn expect_notification(message: Message) -> NotificationMessage {
    match message {
        Message::Notification(notification) => notification,
        other => panic!("Expected notification, got {:?}", other),
    }
}
