//! A deterministic fake RP backend for integration tests.
//!
//! Understands a small, fixed set of forms -- enough to exercise
//! connect/eval/session-isolation/error-surfacing end to end without a
//! real language runtime behind it. Located via `CARGO_BIN_EXE_fake_repl_backend`
//! by the integration tests, following the teacher's `mcp_test_server`
//! binary-locator pattern.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use replbridge::rp::codec::{decode_value, encode_value, PushbackReader};
use replbridge::rp::message::RpValue;
use tokio::io::BufReader;
use tokio::net::TcpListener;

type Vars = HashMap<String, HashMap<String, String>>;

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let workspace = args.next().unwrap_or_else(|| ".".to_string());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().unwrap().port();
    tokio::fs::write(format!("{workspace}/.nrepl-port"), port.to_string())
        .await
        .expect("write sentinel");

    let vars: Arc<Mutex<Vars>> = Arc::new(Mutex::new(HashMap::new()));
    let next_session = Arc::new(Mutex::new(0u64));

    loop {
        let (socket, _) = listener.accept().await.expect("accept");
        let vars = vars.clone();
        let next_session = next_session.clone();
        tokio::spawn(async move {
            handle_connection(socket, vars, next_session).await;
        });
    }
}

async fn handle_connection(socket: tokio::net::TcpStream, vars: Arc<Mutex<Vars>>, next_session: Arc<Mutex<u64>>) {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = PushbackReader::new(BufReader::new(read_half));

    loop {
        let value = match decode_value(&mut reader).await {
            Ok(v) => v,
            Err(_) => return,
        };
        let RpValue::Dict(msg) = value else { continue };

        let op = msg.get("op").and_then(RpValue::as_str).unwrap_or("").to_string();
        let id = msg.get("id").and_then(RpValue::as_str).unwrap_or("0").to_string();
        let session = msg.get("session").and_then(RpValue::as_str).map(str::to_string);

        let replies = match op.as_str() {
            "clone" => {
                let mut guard = next_session.lock().unwrap();
                *guard += 1;
                let new_session = format!("session-{guard}");
                vars.lock().unwrap().entry(new_session.clone()).or_default();
                vec![done(&id, &[("new-session", RpValue::Str(new_session))])]
            }
            "describe" => {
                let mut ops = std::collections::BTreeMap::new();
                for name in ["eval", "clone", "close", "describe", "complete", "load-file", "interrupt", "stacktrace"] {
                    ops.insert(name.to_string(), RpValue::Dict(Default::default()));
                }
                vec![done(&id, &[("ops", RpValue::Dict(ops))])]
            }
            "eval" => {
                let code = msg.get("code").and_then(RpValue::as_str).unwrap_or("").to_string();
                eval(&code, session.as_deref(), &vars, &id)
            }
            "interrupt" => vec![done(&id, &[])],
            _ => vec![unknown_op(&id)],
        };

        for reply in replies {
            if encode_value(&RpValue::Dict(reply), &mut write_half).await.is_err() {
                return;
            }
        }
    }
}

fn status(tags: &[&str]) -> RpValue {
    RpValue::List(tags.iter().map(|t| RpValue::Str(t.to_string())).collect())
}

fn done(id: &str, extra: &[(&str, RpValue)]) -> replbridge::rp::message::RpMessage {
    let mut msg: replbridge::rp::message::RpMessage = extra.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    msg.insert("id".to_string(), RpValue::Str(id.to_string()));
    msg.insert("status".to_string(), status(&["done"]));
    msg
}

fn unknown_op(id: &str) -> replbridge::rp::message::RpMessage {
    let mut msg = replbridge::rp::message::RpMessage::new();
    msg.insert("id".to_string(), RpValue::Str(id.to_string()));
    msg.insert("status".to_string(), status(&["done", "unknown-op"]));
    msg
}

fn eval(code: &str, session: Option<&str>, vars: &Arc<Mutex<Vars>>, id: &str) -> Vec<replbridge::rp::message::RpMessage> {
    let session_key = session.unwrap_or("default").to_string();

    if code == "(+ 1 2 3)" {
        return vec![done(id, &[("value", RpValue::Str("6".to_string()))])];
    }
    if code == "(+ 1 1)" {
        return vec![done(id, &[("value", RpValue::Str("2".to_string()))])];
    }
    if code == "(/ 1 0)" {
        return vec![done(
            id,
            &[("ex", RpValue::Str("java.lang.ArithmeticException: Divide by zero".to_string()))],
        )];
    }
    if code.starts_with("(do (println") {
        return vec![
            {
                let mut m = replbridge::rp::message::RpMessage::new();
                m.insert("id".to_string(), RpValue::Str(id.to_string()));
                m.insert("out".to_string(), RpValue::Str("a\nb\n".to_string()));
                m
            },
            done(id, &[("value", RpValue::Str(":ok".to_string()))]),
        ];
    }
    if let Some(rest) = code.strip_prefix("(def x ") {
        let n = rest.trim_end_matches(')');
        vars.lock().unwrap().entry(session_key).or_default().insert("x".to_string(), n.to_string());
        return vec![done(id, &[("value", RpValue::Str("#'user/x".to_string()))])];
    }
    if code == "x" {
        let guard = vars.lock().unwrap();
        return match guard.get(&session_key).and_then(|vs| vs.get("x")) {
            Some(value) => vec![done(id, &[("value", RpValue::Str(value.clone()))])],
            None => vec![done(
                id,
                &[("ex", RpValue::Str("java.lang.RuntimeException: Unable to resolve symbol: x".to_string()))],
            )],
        };
    }

    vec![done(id, &[("value", RpValue::Str("nil".to_string()))])]
}
