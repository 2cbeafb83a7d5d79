//! Command-line interface.
//!
//! Every command prints JSON on stdout so results can be piped into other tools;
//! logs go to stderr.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::parser::{
    parse_person_detail_response, parse_person_response, parse_trace_response, ParsedTrace,
};
use crate::session::{NodeData, SessionStore};
use crate::storage::KeyValueStore;
use crate::trace_api::{TraceClient, TraceQuery};

/// Skip-trace response normalization and session tracking.
#[derive(Parser, Debug)]
#[command(name = "mnuda-trace", version, about)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Parse a saved trace response and print the extracted entities
    Parse {
        /// JSON file with the raw response
        file: PathBuf,

        /// Response shape
        #[arg(long, value_enum, default_value = "auto")]
        kind: PayloadKind,
    },

    /// Record a saved trace response as a node of the current session
    Record {
        /// JSON file with the raw response
        file: PathBuf,

        /// API name stored on the node
        #[arg(long, default_value = "imported")]
        api_name: String,

        /// Description of the lookup
        #[arg(long)]
        query: Option<String>,

        /// Node this lookup expanded from
        #[arg(long)]
        parent: Option<String>,
    },

    /// Query the trace provider and record the result
    Lookup {
        /// Lookup to run
        #[command(subcommand)]
        query: LookupCommands,

        /// Node this lookup expanded from
        #[arg(long, global = true)]
        parent: Option<String>,
    },

    /// Manage investigation sessions
    Session {
        /// Session operation
        #[command(subcommand)]
        command: SessionCommands,
    },
}

/// Shape selector for `parse`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Detect from the payload
    Auto,
    /// Person-detail endpoint
    Detail,
    /// Person-search endpoint
    Search,
}

/// Trace provider lookups.
#[derive(Subcommand, Debug, Clone)]
pub enum LookupCommands {
    /// Search people by name
    ByName {
        /// Full or partial name
        name: String,
        /// "City, ST" or ZIP
        #[arg(long)]
        citystatezip: Option<String>,
    },
    /// Search people by street address
    ByAddress {
        /// Street line
        street: String,
        /// "City, ST" or ZIP
        citystatezip: String,
    },
    /// Search people by phone number
    ByPhone {
        /// Phone number in any format
        phone: String,
    },
    /// Search people by email address
    ByEmail {
        /// Email address
        email: String,
    },
    /// Fetch the detail record of one person
    Details {
        /// Provider person identifier
        person_id: String,
    },
}

impl From<LookupCommands> for TraceQuery {
    fn from(command: LookupCommands) -> Self {
        match command {
            LookupCommands::ByName { name, citystatezip } => {
                TraceQuery::ByName { name, citystatezip }
            }
            LookupCommands::ByAddress {
                street,
                citystatezip,
            } => TraceQuery::ByAddress {
                street,
                citystatezip,
            },
            LookupCommands::ByPhone { phone } => TraceQuery::ByPhone { phone },
            LookupCommands::ByEmail { email } => TraceQuery::ByEmail { email },
            LookupCommands::Details { person_id } => TraceQuery::Details { person_id },
        }
    }
}

/// Session management subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommands {
    /// Create a session and make it current
    New {
        /// Display name (defaults to the creation time)
        #[arg(long)]
        name: Option<String>,
    },
    /// List sessions
    List,
    /// Make a session current
    Use {
        /// Session id
        id: String,
    },
    /// Rename a session
    Rename {
        /// Session id
        id: String,
        /// New display name
        name: String,
    },
    /// Delete a session
    Delete {
        /// Session id
        id: String,
    },
    /// Show the nodes of the current session
    Nodes,
    /// Show entity and lead counts of the current session
    Summary,
    /// Export a session (current by default)
    Export {
        /// Session id
        id: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Remove all persisted session data
    ClearCorrupted,
}

/// Result of CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }

    fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::success(text),
            Err(e) => Self::error(format!("Failed to render output: {}", e)),
        }
    }
}

/// Execute a CLI command.
pub async fn execute_command<S: KeyValueStore>(
    command: Commands,
    sessions: &SessionStore<S>,
    config: &Config,
) -> CliResult {
    let result = match command {
        Commands::Parse { file, kind } => execute_parse(&file, kind),
        Commands::Record {
            file,
            api_name,
            query,
            parent,
        } => execute_record(sessions, &file, api_name, query, parent).await,
        Commands::Lookup { query, parent } => {
            execute_lookup(sessions, config, query.into(), parent).await
        }
        Commands::Session { command } => Ok(execute_session(sessions, command).await),
    };

    result.unwrap_or_else(|e| CliResult::error(e.to_string()))
}

fn read_payload(path: &Path) -> AppResult<Value> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn execute_parse(file: &Path, kind: PayloadKind) -> AppResult<CliResult> {
    let raw = read_payload(file)?;
    let result = match kind {
        PayloadKind::Auto => CliResult::json(&parse_trace_response(&raw)),
        PayloadKind::Detail => CliResult::json(&parse_person_detail_response(&raw)),
        PayloadKind::Search => CliResult::json(&parse_person_response(&raw)),
    };
    Ok(result)
}

async fn execute_record<S: KeyValueStore>(
    sessions: &SessionStore<S>,
    file: &Path,
    api_name: String,
    query: Option<String>,
    parent: Option<String>,
) -> AppResult<CliResult> {
    let raw = read_payload(file)?;
    let session = sessions.ensure_current_session().await;
    let node = build_node(api_name, raw, query, parent);
    record_node(sessions, &session.id, node).await
}

async fn execute_lookup<S: KeyValueStore>(
    sessions: &SessionStore<S>,
    config: &Config,
    query: TraceQuery,
    parent: Option<String>,
) -> AppResult<CliResult> {
    let client = TraceClient::new(&config.trace_api, config.request.clone())?;
    let raw = client.lookup(&query).await?;

    let session = sessions.ensure_current_session().await;
    let node = build_node(query.api_name().to_string(), raw, Some(query.describe()), parent);
    record_node(sessions, &session.id, node).await
}

/// Detail payloads are stored parsed, everything else raw.
fn build_node(
    api_name: String,
    raw: Value,
    query: Option<String>,
    parent: Option<String>,
) -> NodeData {
    let mut node = match parse_trace_response(&raw) {
        ParsedTrace::Detail(data) => NodeData::people_result(api_name, data),
        ParsedTrace::Search(_) => NodeData::api_result(api_name, raw),
    };
    if let Some(query) = query {
        node = node.with_query(query);
    }
    if let Some(parent) = parent {
        node = node.with_parent(parent);
    }
    node
}

async fn record_node<S: KeyValueStore>(
    sessions: &SessionStore<S>,
    session_id: &str,
    node: NodeData,
) -> AppResult<CliResult> {
    let node_id = node.id.clone();
    let entities = node.entities();

    if !sessions.add_node(node).await {
        return Err(AppError::Internal {
            message: "Failed to record node in the current session".to_string(),
        });
    }
    info!(session_id = %session_id, node_id = %node_id, entities = entities.len(), "Node recorded");

    Ok(CliResult::json(&serde_json::json!({
        "sessionId": session_id,
        "nodeId": node_id,
        "totalEntities": entities.len(),
        "entities": entities,
        "summary": sessions.get_entity_summary().await,
    })))
}

async fn execute_session<S: KeyValueStore>(
    sessions: &SessionStore<S>,
    command: SessionCommands,
) -> CliResult {
    match command {
        SessionCommands::New { name } => CliResult::json(&sessions.create_session(name).await),
        SessionCommands::List => {
            let current = sessions.current_session_id().await;
            let listing: Vec<Value> = sessions
                .list_sessions()
                .await
                .into_iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id,
                        "name": s.name,
                        "createdAt": s.created_at,
                        "lastAccessed": s.last_accessed,
                        "nodes": s.nodes.len(),
                        "current": current.as_deref() == Some(s.id.as_str()),
                    })
                })
                .collect();
            CliResult::json(&listing)
        }
        SessionCommands::Use { id } => match sessions.load_session(&id).await {
            Some(session) => CliResult::json(&session),
            None => CliResult::error(format!("Session not found: {}", id)),
        },
        SessionCommands::Rename { id, name } => {
            if sessions.rename_session(&id, &name).await {
                CliResult::success(format!("Renamed session {} to {}", id, name.trim()))
            } else {
                CliResult::error(format!("Could not rename session {}", id))
            }
        }
        SessionCommands::Delete { id } => {
            if sessions.delete_session(&id).await {
                let current = sessions.current_session_id().await.unwrap_or_default();
                CliResult::success(format!("Deleted session {} (current: {})", id, current))
            } else {
                CliResult::error(format!("Session not found: {}", id))
            }
        }
        SessionCommands::Nodes => CliResult::json(&sessions.get_nodes().await),
        SessionCommands::Summary => CliResult::json(&serde_json::json!({
            "summary": sessions.get_entity_summary().await,
            "actionable": sessions.get_actionable_entities().await,
        })),
        SessionCommands::Export { id, output } => {
            let Some(export) = sessions.export_session(id.as_deref()).await else {
                return CliResult::error("No session to export");
            };
            let rendered = CliResult::json(&export);
            match output {
                Some(path) if rendered.exit_code == 0 => {
                    match std::fs::write(&path, &rendered.message) {
                        Ok(()) => CliResult::success(format!("Exported to {}", path.display())),
                        Err(e) => CliResult::error(format!("Failed to write export: {}", e)),
                    }
                }
                _ => rendered,
            }
        }
        SessionCommands::ClearCorrupted => match sessions.clear_corrupted_data().await {
            Ok(()) => CliResult::success("Session data cleared"),
            Err(e) => CliResult::error(format!("Failed to clear session data: {}", e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::io::Write;

    fn write_payload(value: &Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    fn create_sessions() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new(), &SessionConfig::default())
    }

    #[test]
    fn test_cli_parses_lookup() {
        let cli = Cli::try_parse_from([
            "mnuda-trace",
            "lookup",
            "by-name",
            "Jane Doe",
            "--citystatezip",
            "Minneapolis, MN",
        ])
        .unwrap();

        match cli.command {
            Commands::Lookup { query, parent } => {
                assert!(parent.is_none());
                let query: TraceQuery = query.into();
                assert_eq!(query.api_name(), "search-by-name");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_result() {
        let ok = CliResult::success("done");
        assert_eq!(ok.exit_code, 0);
        let err = CliResult::error("failed");
        assert_eq!(err.exit_code, 1);
        assert_eq!(err.message, "failed");
    }

    #[test]
    fn test_parse_command_outputs_entities() {
        let file = write_payload(&json!({"Email Addresses": ["jane@example.com", "bad"]}));
        let result = execute_parse(file.path(), PayloadKind::Detail).unwrap();
        assert_eq!(result.exit_code, 0);

        let output: Value = serde_json::from_str(&result.message).unwrap();
        assert_eq!(output["totalEntities"], 1);
        assert_eq!(output["entityCounts"]["emails"], 1);
    }

    #[test]
    fn test_parse_command_missing_file() {
        let result = execute_parse(Path::new("/nonexistent/payload.json"), PayloadKind::Auto);
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_build_node_stores_detail_parsed() {
        let node = build_node(
            "person-details".to_string(),
            json!({"Person Details": [{"Person_name": "Jane"}]}),
            None,
            Some("n0".to_string()),
        );
        assert!(node.person_data.is_some());
        assert!(node.response.is_none());
        assert_eq!(node.parent_node_id.as_deref(), Some("n0"));

        let node = build_node("search".to_string(), json!({"PeopleDetails": []}), None, None);
        assert!(node.response.is_some());
        assert!(node.person_data.is_none());
    }

    #[tokio::test]
    async fn test_record_creates_session_when_missing() {
        let sessions = create_sessions();
        let file = write_payload(&json!({"All Relatives": [{"Name": "Sam"}]}));

        let result = execute_record(&sessions, file.path(), "imported".to_string(), None, None)
            .await
            .unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(sessions.get_nodes().await.len(), 1);
        assert_eq!(sessions.get_actionable_entities().await.relatives, 1);
    }

    #[tokio::test]
    async fn test_session_commands() {
        let sessions = create_sessions();

        let created = execute_session(
            &sessions,
            SessionCommands::New {
                name: Some("north loop".to_string()),
            },
        )
        .await;
        assert_eq!(created.exit_code, 0);

        let listing = execute_session(&sessions, SessionCommands::List).await;
        let listing: Value = serde_json::from_str(&listing.message).unwrap();
        assert_eq!(listing[0]["name"], "north loop");
        assert_eq!(listing[0]["current"], true);

        let missing = execute_session(
            &sessions,
            SessionCommands::Use {
                id: "missing".to_string(),
            },
        )
        .await;
        assert_eq!(missing.exit_code, 1);

        let summary = execute_session(&sessions, SessionCommands::Summary).await;
        let summary: Value = serde_json::from_str(&summary.message).unwrap();
        assert_eq!(summary["summary"]["total"], 0);
        assert_eq!(summary["actionable"]["total"], 0);
    }
}
