//! Operation codes carried in the frame header.
//!
//! Codes are plain `i32` on the wire and the set is open: applications may
//! define their own. The constants below are the ones the comet tier itself
//! interprets. By convention a reply code is the request code plus one.

/// Client handshake (unused by TCP clients, kept for code stability).
pub const OP_HANDSHAKE: i32 = 0;
/// Reply to [`OP_HANDSHAKE`].
pub const OP_HANDSHAKE_REPLY: i32 = 1;
/// Client heartbeat.
pub const OP_HEARTBEAT: i32 = 2;
/// Reply to [`OP_HEARTBEAT`].
pub const OP_HEARTBEAT_REPLY: i32 = 3;
/// Client-originated message.
pub const OP_SEND_SMS: i32 = 4;
/// Reply to [`OP_SEND_SMS`].
pub const OP_SEND_SMS_REPLY: i32 = 5;
/// Server notice that the session is being closed.
pub const OP_DISCONNECT_REPLY: i32 = 6;
/// Authentication request, body carries the token.
pub const OP_AUTH: i32 = 7;
/// Reply to [`OP_AUTH`].
pub const OP_AUTH_REPLY: i32 = 8;
/// Raw pass-through: the body is already framed and is written verbatim.
pub const OP_RAW: i32 = 9;
/// Internal: connection is ready to flush queued frames.
pub const OP_PROTO_READY: i32 = 10;
/// Internal: connection writer should stop.
pub const OP_PROTO_FINISH: i32 = 11;
/// Move the session to another room.
pub const OP_CHANGE_ROOM: i32 = 12;
/// Reply to [`OP_CHANGE_ROOM`].
pub const OP_CHANGE_ROOM_REPLY: i32 = 13;
/// Register interest in a topic.
pub const OP_REGISTER: i32 = 14;
/// Reply to [`OP_REGISTER`].
pub const OP_REGISTER_REPLY: i32 = 15;
/// Drop interest in a topic.
pub const OP_UNREGISTER: i32 = 16;
/// Reply to [`OP_UNREGISTER`].
pub const OP_UNREGISTER_REPLY: i32 = 17;

/// Room id meaning "not in any room".
pub const NO_ROOM: i32 = -1;

/// Reply code for a request code.
pub const fn reply_of(operation: i32) -> i32 {
    operation.wrapping_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_codes_follow_request_codes() {
        assert_eq!(reply_of(OP_HEARTBEAT), OP_HEARTBEAT_REPLY);
        assert_eq!(reply_of(OP_AUTH), OP_AUTH_REPLY);
        assert_eq!(reply_of(OP_SEND_SMS), OP_SEND_SMS_REPLY);
        assert_eq!(reply_of(OP_CHANGE_ROOM), OP_CHANGE_ROOM_REPLY);
    }
}
