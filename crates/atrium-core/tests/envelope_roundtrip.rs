use atrium_core::{
    CallId, CallTag, ConnectionId, FailureCode, Frame, Outcome, RequestEnvelope, ResponseEnvelope,
};

#[test]
fn request_frame_roundtrip_cbor() {
    let input = Frame::Request(RequestEnvelope {
        call_id: CallId(42),
        tag: CallTag(20),
        conn: ConnectionId(7),
        payload: vec![0xa1, 0x01, 0x02],
    });

    let encoded = serde_cbor::to_vec(&input).expect("request encode should succeed");
    let decoded: Frame = serde_cbor::from_slice(&encoded).expect("request decode should succeed");

    assert_eq!(decoded, input);
}

#[test]
fn response_frame_roundtrip_cbor() {
    let success = Frame::Response(ResponseEnvelope {
        call_id: CallId(42),
        tag: CallTag(20),
        conn: ConnectionId(7),
        outcome: Outcome::Success,
        payload: vec![0x80],
    });

    let encoded = serde_cbor::to_vec(&success).expect("response encode should succeed");
    let decoded: Frame = serde_cbor::from_slice(&encoded).expect("response decode should succeed");
    assert_eq!(decoded, success);

    let failure = Frame::Response(ResponseEnvelope {
        call_id: CallId(43),
        tag: CallTag(999),
        conn: ConnectionId(7),
        outcome: Outcome::Failure {
            code: FailureCode::UnknownCallType,
            message: "unknown call type 999".to_string(),
        },
        payload: Vec::new(),
    });

    let encoded = serde_cbor::to_vec(&failure).expect("failure encode should succeed");
    let decoded: Frame = serde_cbor::from_slice(&encoded).expect("failure decode should succeed");
    assert_eq!(decoded, failure);
}

#[test]
fn failure_outcome_is_not_success() {
    let outcome = Outcome::Failure {
        code: FailureCode::Timeout,
        message: "call timed out".to_string(),
    };

    assert!(!outcome.is_success());
    assert!(Outcome::Success.is_success());
}
