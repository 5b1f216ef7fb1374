//! Drives a real child process speaking the line-delimited protocol.

#![cfg(unix)]

use std::time::Duration;

use mcp::{Error, ServerConfig, ToolSession};
use serde_json::json;

/// A tool host written in POSIX sh. Answers `initialize`, pages `tools/list`
/// across two responses (with a log notification in between), and serves an
/// `echo` tool and a `fail` tool.
///
/// Some unlisted tools misbehave on the wire: `slow` answers after two
/// seconds, `split` sends half a line, pauses, then the rest, `spaced` pads
/// its answer with blank lines, and `flood` answers with a line over 1 MiB.
const FAKE_HOST: &str = r#"
respond() { printf '%s\n' "$1"; }
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      respond '{"jsonrpc":"2.0","id":'"$id"',"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"fake-host","version":"0.0.1"}}}' ;;
    *'"method":"tools/list"'*)
      respond '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info","data":"listing"}}'
      case "$line" in
        *'"cursor"'*)
          respond '{"jsonrpc":"2.0","id":'"$id"',"result":{"tools":[{"name":"fail","description":"Always fails","inputSchema":{"type":"object"}}]}}' ;;
        *)
          respond '{"jsonrpc":"2.0","id":'"$id"',"result":{"tools":[{"name":"echo","description":"Echo text","inputSchema":{"type":"object"}}],"nextCursor":"page-2"}}' ;;
      esac ;;
    *'"name":"echo"'*)
      respond '{"jsonrpc":"2.0","id":'"$id"',"result":{"content":[{"type":"text","text":"pong"}]}}' ;;
    *'"name":"slow"'*)
      sleep 2
      respond '{"jsonrpc":"2.0","id":'"$id"',"result":{"content":[{"type":"text","text":"late"}]}}' ;;
    *'"name":"split"'*)
      printf '%s' '{"jsonrpc":"2.0","id":'"$id"',"result":{"con'
      sleep 2
      respond 'tent":[{"type":"text","text":"late"}]}}' ;;
    *'"name":"spaced"'*)
      printf '\n   \n\n'
      respond '{"jsonrpc":"2.0","id":'"$id"',"result":{"content":[{"type":"text","text":"padded"}]}}' ;;
    *'"name":"flood"'*)
      printf '%s' '{"jsonrpc":"2.0","id":'"$id"',"result":{"content":[{"type":"text","text":"'
      dd if=/dev/zero bs=1024 count=1100 2>/dev/null | tr '\000' 'a'
      respond '"}]}}' ;;
    *'"name":"fail"'*)
      respond '{"jsonrpc":"2.0","id":'"$id"',"result":{"content":[{"type":"text","text":"boom"}],"isError":true}}' ;;
    *'"method":"tools/call"'*)
      respond '{"jsonrpc":"2.0","id":'"$id"',"error":{"code":-32602,"message":"unknown tool"}}' ;;
  esac
done
"#;

fn fake_host() -> ServerConfig {
    ServerConfig::new("sh", ["-c", FAKE_HOST])
        .with_name("fake")
        .with_handshake_timeout(Duration::from_secs(10))
        .with_request_timeout(Duration::from_secs(10))
}

#[tokio::test]
async fn handshake_reports_server_info() {
    let session = ToolSession::open(fake_host()).await.unwrap();
    assert_eq!(session.name(), "fake");
    assert_eq!(session.server_info().unwrap().name, "fake-host");
    assert!(session.is_running());
    session.close();
}

#[tokio::test]
async fn list_tools_follows_pagination() {
    let session = ToolSession::open(fake_host()).await.unwrap();

    let names: Vec<_> = session
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["echo", "fail"]);

    // Discovery is repeatable on the same session.
    assert_eq!(session.list_tools().await.unwrap().len(), 2);
    session.close();
}

#[tokio::test]
async fn call_tool_returns_content() {
    let session = ToolSession::open(fake_host()).await.unwrap();
    let result = session
        .call_tool("echo", Some(json!({ "text": "ping" })))
        .await
        .unwrap();
    assert_eq!(result.text(), "pong");
    assert!(result.is_text_only());
    session.close();
}

#[tokio::test]
async fn tool_failures_are_not_transport_errors() {
    let session = ToolSession::open(fake_host()).await.unwrap();

    let err = session.call_tool("fail", None).await.unwrap_err();
    match &err {
        Error::ToolCallFailed { name, detail } => {
            assert_eq!(name, "fail");
            assert_eq!(detail, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!err.is_transport());

    let err = session.call_tool("missing", None).await.unwrap_err();
    assert!(matches!(err, Error::ToolCallFailed { ref detail, .. } if detail.contains("unknown tool")));

    // The channel is still usable afterwards.
    assert!(session.call_tool("echo", None).await.is_ok());
    session.close();
}

#[tokio::test]
async fn blank_lines_between_messages_are_skipped() {
    let session = ToolSession::open(fake_host()).await.unwrap();
    let result = session.call_tool("spaced", None).await.unwrap();
    assert_eq!(result.text(), "padded");
    session.close();
}

#[tokio::test]
async fn slow_response_times_out_and_is_discarded_later() {
    let session = ToolSession::open(fake_host().with_request_timeout(Duration::from_millis(500)))
        .await
        .unwrap();

    let err = session.call_tool("slow", None).await.unwrap_err();
    assert!(matches!(err, Error::Timeout));
    assert!(err.is_transport());

    // Let the stale answer land; the next request must skip it by id.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    let result = session.call_tool("echo", None).await.unwrap();
    assert_eq!(result.text(), "pong");
    session.close();
}

#[tokio::test]
async fn timeout_mid_line_keeps_the_partial_line() {
    let session = ToolSession::open(fake_host().with_request_timeout(Duration::from_millis(500)))
        .await
        .unwrap();

    let err = session.call_tool("split", None).await.unwrap_err();
    assert!(matches!(err, Error::Timeout));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let result = session.call_tool("echo", None).await.unwrap();
    assert_eq!(result.text(), "pong");
    session.close();
}

#[tokio::test]
async fn oversized_line_is_rejected() {
    let session = ToolSession::open(fake_host()).await.unwrap();
    let err = session.call_tool("flood", None).await.unwrap_err();
    match &err {
        Error::OutputTooLarge { max } => assert_eq!(*max, mcp::MAX_OUTPUT_SIZE),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_transport());
    session.close();
}

#[tokio::test]
async fn close_is_idempotent_and_final() {
    let session = ToolSession::open(fake_host()).await.unwrap();
    session.close();
    session.close();
    assert!(session.is_closed());

    let err = session.list_tools().await.unwrap_err();
    assert!(matches!(err, Error::Closed));
    assert!(err.is_transport());
}

#[tokio::test]
async fn handshake_times_out() {
    let config = ServerConfig::new("sh", ["-c", "sleep 5"])
        .with_handshake_timeout(Duration::from_millis(200));
    let err = ToolSession::open(config).await.err().unwrap();
    assert!(matches!(err, Error::HandshakeTimeout(_)));
}

#[tokio::test]
async fn host_exiting_before_handshake_is_a_transport_error() {
    let config = ServerConfig::new("sh", ["-c", "exit 0"]);
    let err = ToolSession::open(config).await.err().unwrap();
    assert!(err.is_transport());
}

#[tokio::test]
async fn missing_command_fails_to_spawn() {
    let config = ServerConfig::new("tether-no-such-interpreter", ["host.py"]);
    let err = ToolSession::open(config).await.err().unwrap();
    assert!(matches!(err, Error::Spawn(_)));
}
