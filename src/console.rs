use canvaslink_graph::GraphEditor;
use canvaslink_session::{Session, SessionCallbacks};
use canvaslink_telemetry::TelemetryGuard;
use serde_json::{json, Value};

pub const HELP: &str = "commands: add | from <id> | to <id> | connect | link <from> <to> | \
nodes | edges | dump | send <json> | endpoint <url> | log <module> <level> | status | help | quit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Add,
    From(String),
    To(String),
    Connect,
    Link(String, String),
    Nodes,
    Edges,
    Dump,
    Send(Value),
    Endpoint(String),
    Log(String, tracing::Level),
    Status,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let command = match word {
        "add" => Command::Add,
        "from" => Command::From(rest.to_string()),
        "to" => Command::To(rest.to_string()),
        "connect" => Command::Connect,
        "link" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(a), Some(b), None) => Command::Link(a.to_string(), b.to_string()),
                _ => return Err("usage: link <from> <to>".into()),
            }
        }
        "nodes" => Command::Nodes,
        "edges" => Command::Edges,
        "dump" => Command::Dump,
        "log" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(module), Some(level), None) => {
                    let level = level
                        .parse()
                        .map_err(|e| format!("invalid level {level}: {e}"))?;
                    Command::Log(module.to_string(), level)
                }
                _ => return Err("usage: log <module> <level>".into()),
            }
        }
        "send" => {
            let payload = serde_json::from_str(rest).map_err(|e| format!("invalid json: {e}"))?;
            Command::Send(payload)
        }
        "endpoint" => Command::Endpoint(rest.to_string()),
        "status" => Command::Status,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other} ({HELP})")),
    };
    Ok(Some(command))
}

/// Callbacks that print channel activity to the terminal.
pub fn callbacks() -> SessionCallbacks {
    SessionCallbacks::new()
        .on_open(|| println!("-- connected"))
        .on_close(|| println!("-- disconnected"))
        .on_error(|e| eprintln!("-- channel error: {e}"))
        .on_message(|v| println!("<- {v}"))
}

/// Run a command and return the lines to print. Graph changes are mirrored
/// to the session when it is connected.
pub fn apply(
    command: Command,
    editor: &mut GraphEditor,
    session: &Session,
    telemetry: &TelemetryGuard,
) -> Vec<String> {
    match command {
        Command::Add => {
            let id = editor.add_node();
            if let Some(node) = editor.model().node(&id) {
                session.send(&json!({"type": "node_added", "node": node}));
            }
            vec![format!("added {id}")]
        }
        Command::From(id) => {
            editor.select_from(id.as_str());
            vec![selection_line(editor)]
        }
        Command::To(id) => {
            editor.select_to(id.as_str());
            vec![selection_line(editor)]
        }
        Command::Connect => {
            if !editor.can_connect() {
                return vec!["select both endpoints first".into()];
            }
            let edge = editor.connect_selected();
            edge_result(editor, session, edge)
        }
        Command::Link(from, to) => {
            let edge = editor
                .model_mut()
                .connect(&from.as_str().into(), &to.as_str().into());
            edge_result(editor, session, edge)
        }
        Command::Nodes => editor
            .nodes()
            .iter()
            .map(|n| format!("{}  {}", n.id, n.label))
            .collect(),
        Command::Edges => editor.edges().iter().map(|e| e.to_string()).collect(),
        Command::Dump => match serde_json::to_string_pretty(&editor.model().snapshot()) {
            Ok(json) => vec![json],
            Err(e) => vec![format!("snapshot failed: {e}")],
        },
        Command::Send(payload) => {
            if session.send(&payload) {
                vec!["sent".into()]
            } else {
                vec!["not connected".into()]
            }
        }
        Command::Endpoint(endpoint) => {
            session.update(endpoint, callbacks());
            vec![format!("endpoint: {}", session.endpoint())]
        }
        Command::Log(module, level) => {
            telemetry.set_module_level(&module, level);
            telemetry
                .module_levels()
                .iter()
                .map(|(m, l)| format!("{m}={l}"))
                .collect()
        }
        Command::Status => vec![format!(
            "{} ({}) nodes={} edges={}",
            session.state(),
            session.endpoint(),
            editor.model().node_count(),
            editor.model().edge_count()
        )],
        Command::Help => vec![HELP.to_string()],
        Command::Quit => Vec::new(),
    }
}

fn edge_result(
    editor: &GraphEditor,
    session: &Session,
    edge: Option<canvaslink_core::ids::EdgeId>,
) -> Vec<String> {
    let Some(edge_id) = edge else {
        return vec!["connect ignored".into()];
    };
    match editor.edges().iter().find(|e| e.id == edge_id) {
        Some(edge) => {
            session.send(&json!({"type": "edge_added", "edge": edge}));
            vec![edge.to_string()]
        }
        None => vec![format!("connected {edge_id}")],
    }
}

fn selection_line(editor: &GraphEditor) -> String {
    let show = |s: &Option<canvaslink_core::ids::NodeId>| {
        s.as_ref().map(|id| id.to_string()).unwrap_or_default()
    };
    let selection = editor.selection();
    format!("from={} to={}", show(&selection.from), show(&selection.to))
}
