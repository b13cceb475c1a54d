//! Connect/disconnect semantics of the session service.

use std::time::Duration;

use comet_logic::{
    AnonymousIds, JsonTokenAuthenticator, LogicConfig, MemoryRouteStore, Route, RouteError,
    RouteStore, SessionRpc, key,
};
use comet_proto::operation::NO_ROOM;
use comet_rpc::{
    RpcFault, SessionReply, SessionRequest,
    session::{ConnArg, ConnReply, DisconnArg, DisconnReply},
};

fn config() -> LogicConfig {
    LogicConfig { heartbeat: Duration::from_secs(90), ..LogicConfig::default() }
}

fn service() -> SessionRpc<JsonTokenAuthenticator, MemoryRouteStore> {
    SessionRpc::new(JsonTokenAuthenticator::new(), MemoryRouteStore::new(), &config())
}

fn connect(rpc: &SessionRpc<JsonTokenAuthenticator, impl RouteStore>, token: &str) -> ConnReply {
    let arg = ConnArg { token: token.to_string(), server_id: 4 };
    match rpc.handle(SessionRequest::Connect(Some(arg))) {
        Ok(SessionReply::Connected(reply)) => reply,
        other => panic!("unexpected connect response: {other:?}"),
    }
}

fn disconnect(
    rpc: &SessionRpc<JsonTokenAuthenticator, impl RouteStore>,
    key: &str,
    room_id: i32,
) -> Result<bool, RpcFault> {
    let arg = DisconnArg { key: key.to_string(), room_id };
    match rpc.handle(SessionRequest::Disconnect(Some(arg)))? {
        SessionReply::Disconnected(DisconnReply { has }) => Ok(has),
        other => panic!("unexpected disconnect reply: {other:?}"),
    }
}

#[test]
fn authenticated_connect_records_route() {
    let rpc = service();
    let reply = connect(&rpc, r#"{"userId": 42, "roomId": 7}"#);

    assert_eq!(reply, ConnReply { key: "42_0".to_string(), room_id: 7, heartbeat_secs: 90 });
    assert_eq!(rpc.routes().routes(42), Ok(vec![Route { seq: 0, server_id: 4, room_id: 7 }]));
}

#[test]
fn second_session_gets_next_sequence() {
    let rpc = service();
    connect(&rpc, r#"{"userId": 42, "roomId": 7}"#);
    let reply = connect(&rpc, r#"{"userId": 42, "roomId": 7}"#);

    assert_eq!(reply.key, "42_1");
}

#[test]
fn anonymous_connects_count_up() {
    let rpc = service();

    let uids: Vec<i64> = (0..3)
        .map(|_| connect(&rpc, "guest").key)
        .map(|key| key::decode(&key).unwrap().0)
        .collect();

    let ordinals: Vec<_> = uids.iter().map(|&uid| AnonymousIds::ordinal(uid)).collect();
    assert_eq!(ordinals, vec![Some(1), Some(2), Some(3)]);
    assert!(uids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn disconnect_of_unknown_key_is_false() {
    let rpc = service();
    assert_eq!(disconnect(&rpc, "1234_0", 7), Ok(false));
}

#[test]
fn disconnect_clears_matching_room_only() {
    let rpc = service();
    let reply = connect(&rpc, r#"{"userId": 5, "roomId": 7}"#);

    assert_eq!(disconnect(&rpc, &reply.key, 8), Ok(false));
    assert_eq!(disconnect(&rpc, &reply.key, 7), Ok(true));
    assert_eq!(disconnect(&rpc, &reply.key, 7), Ok(false));
}

#[test]
fn disconnect_with_no_room_clears_any_route() {
    let rpc = service();
    let reply = connect(&rpc, r#"{"userId": 5, "roomId": 7}"#);

    assert_eq!(disconnect(&rpc, &reply.key, NO_ROOM), Ok(true));
    assert_eq!(rpc.routes().online_count(), 0);
}

#[test]
fn malformed_key_changes_nothing() {
    let rpc = service();
    let reply = connect(&rpc, r#"{"userId": 5, "roomId": 7}"#);

    assert_eq!(disconnect(&rpc, "5-0", 7), Err(RpcFault::MalformedKey("5-0".to_string())));
    assert_eq!(rpc.routes().routes(5).unwrap().len(), 1);
    assert_eq!(disconnect(&rpc, &reply.key, 7), Ok(true));
}

#[test]
fn absent_arguments_are_invalid() {
    let rpc = service();
    assert!(matches!(
        rpc.handle(SessionRequest::Connect(None)),
        Err(RpcFault::InvalidArgument(_))
    ));
    assert!(matches!(
        rpc.handle(SessionRequest::Disconnect(None)),
        Err(RpcFault::InvalidArgument(_))
    ));
    assert_eq!(rpc.routes().online_count(), 0);
}

#[derive(Clone)]
struct Unavailable;

impl RouteStore for Unavailable {
    fn record_route(&self, _uid: i64, _server: i32, _room: i32) -> Result<i32, RouteError> {
        Err(RouteError::Unavailable("connection refused".to_string()))
    }

    fn clear_route(&self, _uid: i64, _seq: i32, _room: i32) -> Result<bool, RouteError> {
        Err(RouteError::Unavailable("connection refused".to_string()))
    }

    fn routes(&self, _uid: i64) -> Result<Vec<Route>, RouteError> {
        Ok(Vec::new())
    }
}

#[test]
fn route_store_failures_propagate() {
    let rpc = SessionRpc::new(JsonTokenAuthenticator::new(), Unavailable, &config());
    let expected = RpcFault::Downstream(
        RouteError::Unavailable("connection refused".to_string()).to_string(),
    );

    let arg = ConnArg { token: "{}".to_string(), server_id: 1 };
    assert_eq!(rpc.handle(SessionRequest::Connect(Some(arg))), Err(expected.clone()));
    assert_eq!(disconnect(&rpc, "1_0", 7), Err(expected));
}
