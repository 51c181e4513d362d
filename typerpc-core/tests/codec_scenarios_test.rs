//! End-to-end decode/encode behavior of the message codec

mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use typerpc_core::{
    Error, Message, NotificationMessage, Params, Payload, RequestMessage, ResponseError,
    ResponseMessage,
};

#[test]
fn test_request_with_positional_params() {
    let message = decode(
        &codec(),
        r#"{"jsonrpc":"2.0","id":"1","method":"add","params":[1,2]}"#,
    );
    let request = expect_request(message);

    assert_eq!(request.jsonrpc.as_deref(), Some("2.0"));
    assert_eq!(request.id, "1");
    assert_eq!(request.method, "add");
    assert_eq!(
        request.params,
        Some(Params::Positional(vec![
            Some(Payload::typed(1i32)),
            Some(Payload::typed(2i32)),
        ]))
    );
}

#[test]
fn test_response_result_typed_through_correlation() {
    let codec = correlated_codec(Arc::new(|id: &str| (id == "1").then(|| "add".to_string())));
    let response = expect_response(decode(
        &codec,
        r#"{"jsonrpc":"2.0","id":"1","result":{"x":1}}"#,
    ));

    assert_eq!(response.id, "1");
    assert!(response.error.is_none());
    let result = response.result.expect("result");
    assert_eq!(result.downcast_ref::<FooResult>(), Some(&FooResult { x: 1 }));
}

#[test]
fn test_unregistered_notification_keeps_untyped_params() {
    let notification = expect_notification(decode(
        &codec(),
        r#"{"jsonrpc":"2.0","method":"bar","params":{"a":1}}"#,
    ));

    assert_eq!(notification.method, "bar");
    assert_eq!(notification.params, Some(Params::Untyped(json!({"a": 1}))));
}

#[test]
fn test_error_response() {
    let response = expect_response(decode(
        &codec(),
        r#"{"jsonrpc":"2.0","id":"2","error":{"code":-32601,"message":"Method not found"}}"#,
    ));

    assert_eq!(response.id, "2");
    assert!(response.result.is_none());
    assert_eq!(response.error, Some(ResponseError::new(-32601, "Method not found")));
}

#[test]
fn test_error_response_with_data() {
    let response = expect_response(decode(
        &codec(),
        r#"{"id":"2","error":{"code":-32000,"message":"busy","data":{"retryAfter":3}}}"#,
    ));
    let error = response.error.expect("error");

    assert!(error.is_server_error());
    assert_eq!(error.data, Some(json!({"retryAfter": 3})));
}

#[test]
fn test_empty_object_is_parse_error() {
    assert!(matches!(codec().decode_str("{}"), Err(Error::Parse(_))));
    assert!(matches!(
        codec().decode_str(r#"{"jsonrpc":"2.0","params":[1]}"#),
        Err(Error::Parse(_))
    ));
}

#[test]
fn test_encode_notification_with_null_params() {
    let message: Message = NotificationMessage::new("baz", None).into();
    assert_eq!(
        codec().encode_to_string(&message).unwrap(),
        r#"{"jsonrpc":"2.0","method":"baz","params":null}"#
    );
}

#[test]
fn test_field_order_independence() {
    let codec = codec();
    let orderings = [
        r#"{"jsonrpc":"2.0","id":"7","method":"foo","params":[1,2]}"#,
        r#"{"params":[1,2],"method":"foo","id":"7","jsonrpc":"2.0"}"#,
        r#"{"id":"7","params":[1,2],"jsonrpc":"2.0","method":"foo"}"#,
    ];

    let decoded: Vec<Message> = orderings.iter().map(|json| decode(&codec, json)).collect();
    assert!(decoded.windows(2).all(|pair| pair[0] == pair[1]));

    let request = expect_request(decoded[0].clone());
    assert_eq!(request.params.as_ref().and_then(|p| p.arg_as::<i32>(0)), Some(&1));
}

#[test]
fn test_later_method_wins_and_types_params() {
    let request = expect_request(decode(
        &codec(),
        r#"{"method":"shutdown","params":[1,2],"method":"foo","id":"1"}"#,
    ));

    assert_eq!(request.method, "foo");
    assert_eq!(
        request.params,
        Some(Params::Positional(vec![
            Some(Payload::typed(1i32)),
            Some(Payload::typed(2i32)),
        ]))
    );
}

#[test]
fn test_numeric_ids_keep_their_wire_text() {
    let codec = codec();

    let big = expect_request(decode(
        &codec,
        r#"{"id":123456789012345678901234,"method":"shutdown"}"#,
    ));
    assert_eq!(big.id, "123456789012345678901234");

    let float = expect_request(decode(&codec, r#"{"id":1.0,"method":"shutdown"}"#));
    assert_eq!(float.id, "1.0");
}

#[test]
fn test_notification_single_parameter_object() {
    let notification = expect_notification(decode(
        &codec(),
        r#"{"params":{"uri":"file:///a.rs","languageId":"rust","version":1},"method":"textDocument/didOpen"}"#,
    ));

    let item = notification
        .params
        .as_ref()
        .and_then(|p| p.single_as::<TextDocumentItem>())
        .expect("typed params");
    assert_eq!(item.uri, "file:///a.rs");
    assert_eq!(item.version, 1);
}

#[test]
fn test_single_parameter_accepts_scalar() {
    let request = expect_request(decode(
        &codec(),
        r#"{"id":"1","method":"echo","params":"hello"}"#,
    ));
    assert_eq!(
        request.params.as_ref().and_then(|p| p.single_as::<String>()),
        Some(&"hello".to_string())
    );
}

#[test]
fn test_multi_parameter_padding_and_fallback() {
    let codec = codec();

    let padded = expect_request(decode(&codec, r#"{"id":"1","method":"foo","params":[5]}"#));
    assert_eq!(
        padded.params,
        Some(Params::Positional(vec![Some(Payload::typed(5i32)), None]))
    );

    let named = expect_request(decode(
        &codec,
        r#"{"id":"1","method":"foo","params":{"a":1,"b":2}}"#,
    ));
    assert_eq!(named.params, Some(Params::Untyped(json!({"a": 1, "b": 2}))));
}

#[test]
fn test_zero_parameter_method() {
    let codec = codec();

    let without = expect_request(decode(&codec, r#"{"id":"1","method":"shutdown"}"#));
    assert!(without.params.is_none());

    let with = expect_request(decode(
        &codec,
        r#"{"id":"1","method":"shutdown","params":[true]}"#,
    ));
    assert_eq!(with.params, Some(Params::Untyped(json!([true]))));
}

#[test]
fn test_type_mismatch_is_reported() {
    match codec().decode_str(r#"{"id":"1","method":"foo","params":[1,"two"]}"#) {
        Err(Error::TypeMismatch { expected, reason }) => {
            assert_eq!(expected, "i32");
            assert!(!reason.is_empty());
        }
        other => panic!("Expected type mismatch, got {:?}", other),
    }
}

#[test]
fn test_type_mismatch_maps_to_invalid_params() {
    let error = codec()
        .decode_str(r#"{"id":"1","method":"echo","params":42}"#)
        .unwrap_err();
    let response = ResponseError::from(&error);

    assert_eq!(response.code, typerpc_core::error_codes::INVALID_PARAMS);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let request = expect_request(decode(
        &codec(),
        r#"{"meta":{"trace":[1,2,{"deep":null}]},"id":"1","method":"shutdown","x":true}"#,
    ));
    assert_eq!(request.method, "shutdown");
}

#[test]
fn test_null_input_yields_no_message() {
    assert!(codec().decode_str("null").unwrap().is_none());
    assert!(codec().decode_str("  null  ").unwrap().is_none());
}

#[test]
fn test_round_trip_of_typed_messages() {
    let codec = correlated_codec(Arc::new(|_: &str| Some("add".to_string())));
    let messages: Vec<Message> = vec![
        RequestMessage::new(
            "1",
            "foo",
            Some(Params::Positional(vec![
                Some(Payload::typed(3i32)),
                Some(Payload::typed(4i32)),
            ])),
        )
        .into(),
        RequestMessage::new("2", "echo", Some(Params::single("hi".to_string()))).into(),
        RequestMessage::new("3", "shutdown", None).into(),
        NotificationMessage::new(
            "textDocument/didOpen",
            Some(Params::single(TextDocumentItem {
                uri: "file:///b.rs".into(),
                language_id: "rust".into(),
                version: 2,
            })),
        )
        .into(),
        ResponseMessage::success("4", Some(Payload::typed(FooResult { x: 9 }))).into(),
        ResponseMessage::success("5", None).into(),
        ResponseMessage::failure("6", ResponseError::internal_error("boom")).into(),
    ];

    for message in messages {
        let encoded = codec.encode_to_vec(&message).unwrap();
        let decoded = codec.decode_slice(&encoded).unwrap();
        assert_eq!(decoded.as_ref(), Some(&message), "round trip of {:?}", message);
    }
}

#[test]
fn test_encode_to_value_matches_string() {
    let codec = codec();
    let message: Message =
        RequestMessage::new("9", "echo", Some(Params::single("x".to_string()))).into();

    let value = codec.encode_to_value(&message).unwrap();
    let text = codec.encode_to_string(&message).unwrap();
    assert_eq!(value, serde_json::from_str::<serde_json::Value>(&text).unwrap());
    assert_eq!(value["params"], json!("x"));
}

#[test]
fn test_decode_value_entry_point() {
    let message = codec()
        .decode_value(json!({"method": "textDocument/didOpen", "params": null}))
        .unwrap()
        .unwrap();
    assert!(expect_notification(message).params.is_none());
}
