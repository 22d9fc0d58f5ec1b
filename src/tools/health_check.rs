//! `health_check` -- an on-demand, six-section diagnostic report. Each
//! section is independently fault-isolated: a failure in one (e.g. the
//! backend being down) still lets the others run and report what they can.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{resolve_session, ToolExecutor};

pub struct HealthCheckTool;

struct Section {
    name: &'static str,
    ok: bool,
    detail: String,
}

impl Section {
    fn render(&self) -> String {
        format!("[{}] {}\n  {}\n", if self.ok { "ok" } else { "fail" }, self.name, self.detail)
    }
}

#[async_trait]
impl ToolExecutor for HealthCheckTool {
    fn name(&self) -> &'static str {
        "health-check"
    }

    fn description(&self) -> &'static str {
        "Run a multi-section diagnostic: environment, connection health, core functionality, tool integration, and configuration. Optionally includes a performance timing pass."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "include_performance": {"type": "boolean", "description": "Also run a timed eval sample (default false)"},
                "verbose": {"type": "boolean", "description": "Include the overall ok/fail summary line (default false)"},
            },
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let include_performance = arguments
            .get("include_performance")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let verbose = arguments.get("verbose").and_then(Value::as_bool).unwrap_or(false);

        let mut sections = vec![
            environment_section(),
            connection_section(state).await,
            core_functionality_section(state, &arguments).await,
            tool_integration_section(state).await,
            configuration_section(state).await,
        ];
        if include_performance {
            sections.push(performance_section(state, &arguments).await);
        }

        let all_ok = sections.iter().all(|s| s.ok);
        let mut text: String = sections.iter().map(Section::render).collect();
        if verbose {
            text.push_str(&format!("\noverall: {}/{} sections ok\n", sections.iter().filter(|s| s.ok).count(), sections.len()));
        }

        Ok(if all_ok {
            CallToolResult::ok_text(text)
        } else {
            CallToolResult::error_text(text)
        })
    }
}

fn environment_section() -> Section {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    Section {
        name: "environment",
        ok: true,
        detail: format!("os={os} arch={arch} cwd={}", std::env::current_dir().map(|p| p.display().to_string()).unwrap_or_else(|_| "?".to_string())),
    }
}

async fn connection_section(state: &StateCore) -> Section {
    let connected = state.rp.is_connected().await;
    let detail = match state.peer().await {
        Some((host, port)) => format!("connected={connected} backend={host}:{port}"),
        None => format!("connected={connected} backend=unknown"),
    };
    Section {
        name: "connection health",
        ok: connected,
        detail,
    }
}

async fn core_functionality_section(state: &StateCore, arguments: &Value) -> Section {
    if !state.rp.is_connected().await {
        return Section {
            name: "core functionality",
            ok: false,
            detail: "skipped: not connected".to_string(),
        };
    }
    let session = resolve_session(state, arguments).await;
    let probes = ["(+ 1 2)", "(str \"a\" \"b\")", "(class 1)", "(do nil)"];
    let mut passed = 0usize;
    let mut details = Vec::new();
    for code in probes {
        let mut fields = vec![("code", RpValue::Str(code.to_string()))];
        if let Some(session) = &session {
            fields.push(("session", RpValue::Str(session.clone())));
        }
        match state.rp.send("eval", &fields).await {
            Ok(reply) if reply.ex.is_none() => {
                passed += 1;
                details.push(format!("{code} => {}", reply.value.unwrap_or_default()));
            }
            Ok(reply) => details.push(format!("{code} raised {}", reply.ex.unwrap_or_default())),
            Err(e) => details.push(format!("{code} failed: {e}")),
        }
    }
    Section {
        name: "core functionality",
        ok: passed == probes.len(),
        detail: format!("{passed}/{} probes passed\n  {}", probes.len(), details.join("\n  ")),
    }
}

async fn tool_integration_section(state: &StateCore) -> Section {
    if !state.rp.is_connected().await {
        return Section {
            name: "tool integration",
            ok: false,
            detail: "skipped: not connected".to_string(),
        };
    }
    match state.rp.send("describe", &[] as &[(&str, RpValue)]).await {
        Ok(reply) => {
            let op_count = reply
                .raw
                .iter()
                .find_map(|m| m.get("ops"))
                .map(|v| matches!(v, RpValue::Dict(m) if !m.is_empty()))
                .unwrap_or(false);
            Section {
                name: "tool integration",
                ok: op_count,
                detail: if op_count {
                    "describe op succeeded and reported ops".to_string()
                } else {
                    "describe op succeeded but reported no ops".to_string()
                },
            }
        }
        Err(e) => Section {
            name: "tool integration",
            ok: false,
            detail: format!("describe op failed: {e}"),
        },
    }
}

async fn configuration_section(state: &StateCore) -> Section {
    let sessions = state.sessions_snapshot().await;
    Section {
        name: "configuration",
        ok: true,
        detail: format!("known sessions={} default={:?}", sessions.len(), state.default_session().await),
    }
}

async fn performance_section(state: &StateCore, arguments: &Value) -> Section {
    if !state.rp.is_connected().await {
        return Section {
            name: "performance",
            ok: false,
            detail: "skipped: not connected".to_string(),
        };
    }
    let session = resolve_session(state, arguments).await;
    let mut samples_ms = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut fields = vec![("code", RpValue::Str("(+ 1 1)".to_string()))];
        if let Some(session) = &session {
            fields.push(("session", RpValue::Str(session.clone())));
        }
        let started = std::time::Instant::now();
        if state.rp.send("eval", &fields).await.is_ok() {
            samples_ms.push(started.elapsed().as_secs_f64() * 1000.0);
        }
    }
    if samples_ms.is_empty() {
        return Section {
            name: "performance",
            ok: false,
            detail: "no samples completed".to_string(),
        };
    }
    samples_ms.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let min = samples_ms.first().unwrap();
    let max = samples_ms.last().unwrap();
    let median = samples_ms[samples_ms.len() / 2];
    Section {
        name: "performance",
        ok: true,
        detail: format!("n={} min={min:.2}ms median={median:.2}ms max={max:.2}ms", samples_ms.len()),
    }
}
