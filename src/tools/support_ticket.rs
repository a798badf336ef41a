use crate::llm::types::FunctionTool;
use serde::Deserialize;
use serde_json::json;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const NAME: &str = "submit_support_ticket";

/// Draws before giving up on finding an unused ticket id.
const MAX_ID_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SubmitSupportTicketArgs {
    pub email_address: String,
    pub description: String,
}

pub fn tool_def() -> FunctionTool {
    FunctionTool {
        kind: "function".to_string(),
        name: NAME.to_string(),
        description: "Submit a support ticket for a technical issue".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "email_address": {"type": "string", "description": "The user's email address"},
                "description": {"type": "string", "description": "A description of the technical issue"}
            },
            "required": ["email_address", "description"],
            "additionalProperties": false
        }),
        strict: true,
    }
}

pub fn ticket_file_name(ticket_id: &str) -> String {
    format!("ticket-{ticket_id}.txt")
}

fn new_ticket_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(6);
    id
}

/// Write a ticket file into `dir` and return the JSON confirmation for the model.
pub fn submit_support_ticket(dir: &Path, args: &SubmitSupportTicketArgs) -> io::Result<String> {
    write_ticket(dir, args, new_ticket_id)
}

pub(crate) fn write_ticket(
    dir: &Path,
    args: &SubmitSupportTicketArgs,
    mut next_id: impl FnMut() -> String,
) -> io::Result<String> {
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let ticket_id = next_id();
        let file_name = ticket_file_name(&ticket_id);
        let path = dir.join(&file_name);

        // create_new never clobbers an earlier ticket with the same id
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(attempt, %file_name, "ticket id already taken");
                continue;
            }
            Err(e) => return Err(e),
        };
        let contents = format!(
            "Support ticket: {ticket_id}\nSubmitted by: {}\nDescription:\n{}",
            args.email_address, args.description
        );
        write_or_remove(&path, file, &contents)?;
        info!(ticket=%ticket_id, path=%path.display(), "support ticket written");

        let message = json!({
            "message": format!(
                "Support ticket {ticket_id} submitted. The ticket file is saved as {file_name}"
            )
        });
        return Ok(message.to_string());
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free ticket id after {MAX_ID_ATTEMPTS} attempts"),
    ))
}

/// Write `contents` to the freshly created `path`; a partial ticket is removed.
fn write_or_remove<W: Write>(path: &Path, mut file: W, contents: &str) -> io::Result<()> {
    let written = file
        .write_all(contents.as_bytes())
        .and_then(|()| file.flush());
    if let Err(e) = written {
        warn!(path=%path.display(), error=%e, "ticket write failed");
        if let Err(rm) = fs::remove_file(path) {
            warn!(path=%path.display(), error=%rm, "cannot remove partial ticket");
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args() -> SubmitSupportTicketArgs {
        SubmitSupportTicketArgs {
            email_address: "a@b.com".into(),
            description: "printer broken".into(),
        }
    }

    fn ticket_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn is_ticket_name(name: &str) -> bool {
        name.strip_prefix("ticket-")
            .and_then(|rest| rest.strip_suffix(".txt"))
            .is_some_and(|id| {
                id.len() == 6 && id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
            })
    }

    #[test]
    fn writes_one_ticket_file_and_reports_it() {
        let dir = tempdir().unwrap();
        let out = submit_support_ticket(dir.path(), &args()).unwrap();

        let files = ticket_files(dir.path());
        assert_eq!(files.len(), 1);
        let file_name = &files[0];
        assert!(is_ticket_name(file_name), "bad name {file_name}");
        let ticket_id = &file_name["ticket-".len()..file_name.len() - ".txt".len()];

        let contents = fs::read_to_string(dir.path().join(file_name)).unwrap();
        assert!(contents.contains(ticket_id));
        assert!(contents.contains("a@b.com"));
        assert!(contents.contains("printer broken"));

        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        let message = v["message"].as_str().unwrap();
        assert!(message.contains(file_name.as_str()));
        assert!(message.contains(&format!("Support ticket {ticket_id} submitted")));
    }

    #[test]
    fn file_layout_matches_expected_lines() {
        let dir = tempdir().unwrap();
        write_ticket(dir.path(), &args(), || "abc123".to_string()).unwrap();
        let contents = fs::read_to_string(dir.path().join("ticket-abc123.txt")).unwrap();
        assert_eq!(
            contents,
            "Support ticket: abc123\nSubmitted by: a@b.com\nDescription:\nprinter broken"
        );
    }

    #[test]
    fn colliding_id_draws_a_new_one() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ticket-aaaaaa.txt"), "existing").unwrap();

        let mut ids = vec!["bbbbbb".to_string(), "aaaaaa".to_string()];
        let out = write_ticket(dir.path(), &args(), || ids.pop().unwrap()).unwrap();

        assert!(out.contains("ticket-bbbbbb.txt"));
        assert_eq!(
            fs::read_to_string(dir.path().join("ticket-aaaaaa.txt")).unwrap(),
            "existing"
        );
    }

    #[test]
    fn gives_up_when_every_id_is_taken() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ticket-000000.txt"), "").unwrap();
        let err = write_ticket(dir.path(), &args(), || "000000".to_string()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(submit_support_ticket(&missing, &args()).is_err());
    }

    #[test]
    fn args_reject_unknown_fields() {
        let ok: Result<SubmitSupportTicketArgs, _> =
            serde_json::from_str(r#"{"email_address":"a@b.com","description":"x"}"#);
        assert!(ok.is_ok());
        let extra: Result<SubmitSupportTicketArgs, _> = serde_json::from_str(
            r#"{"email_address":"a@b.com","description":"x","priority":"high"}"#,
        );
        assert!(extra.is_err());
    }

    struct BrokenDisk;

    impl Write for BrokenDisk {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_leaves_no_ticket_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(ticket_file_name("abc123"));
        fs::write(&path, "Support ticket: abc").unwrap();

        let err = write_or_remove(&path, BrokenDisk, "Support ticket: abc123").unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());
        assert!(ticket_files(dir.path()).is_empty());
    }
}
