//! Terminal command surface.
//!
//! Rows are 1-based positions in the displayed list (pinned notes first),
//! translated to store indices before any mutation.

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};

use crate::error::NoteflowError;
use crate::google_api::{auth, TokenStore};
use crate::guests::GuestDirectory;
use crate::handwriting::{self, PdftoppmRasterizer};
use crate::intelligence::assist;
use crate::notes::{ChecklistItem, NoteDraft, NoteStore};
use crate::state::{self, AppContext, Collaborators};
use crate::sync::SyncOutcome;
use crate::types::{Config, Note, Reminder};
use crate::voice::{intent, normalize_transcript};

#[derive(Debug, Parser)]
#[command(version, about = "Notes with AI assist and Google Drive sync")]
pub struct Cli {
    /// Config file (defaults to ~/.noteflow/config.json)
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,

    /// Run as a guest: nothing is synced
    #[arg(long, global = true, default_value_t = false)]
    pub guest: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct NoteFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub body: Option<String>,
    /// Hex color, e.g. #fff3e0
    #[arg(long)]
    pub color: Option<String>,
    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,
    /// yyyy-MM-dd HH:mm, or empty to clear
    #[arg(long)]
    pub reminder: Option<String>,
    /// Unchecked checklist item (repeatable)
    #[arg(long = "item")]
    pub items: Vec<String>,
    /// Checked checklist item (repeatable)
    #[arg(long = "done")]
    pub done: Vec<String>,
    /// Attached file path (repeatable)
    #[arg(long = "attach")]
    pub attachments: Vec<String>,
    /// Collaborator email (repeatable)
    #[arg(long = "collaborator")]
    pub collaborators: Vec<String>,
    /// Drawing data, or empty to clear
    #[arg(long)]
    pub drawing: Option<String>,
    /// Drop existing attachments before adding any given with --attach
    #[arg(long)]
    pub clear_attachments: bool,
    /// Drop existing collaborators before adding any given with --collaborator
    #[arg(long)]
    pub clear_collaborators: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List notes, pinned first
    List {
        #[arg(long)]
        archived: bool,
    },
    Show {
        row: usize,
    },
    Add {
        #[command(flatten)]
        fields: NoteFields,
    },
    Edit {
        row: usize,
        #[command(flatten)]
        fields: NoteFields,
    },
    Pin {
        row: usize,
    },
    Archive {
        row: usize,
    },
    /// Move an archived note back (row from `list --archived`)
    Unarchive {
        row: usize,
    },
    Delete {
        row: usize,
    },
    DeleteArchived {
        row: usize,
    },
    /// Replace a note's tags
    Tags {
        row: usize,
        tags: String,
    },
    Search {
        query: String,
    },
    /// AI response to a note
    Ask {
        row: usize,
    },
    /// Suggest tags with AI and apply them
    Autotag {
        row: usize,
    },
    /// Reorganize a note with AI
    Organize {
        row: usize,
        /// Replace the note body with the reorganized text
        #[arg(long)]
        apply: bool,
    },
    Chat {
        message: String,
    },
    /// Extract handwritten text from an image or PDF
    Ocr {
        file: PathBuf,
        #[arg(long)]
        summarize: bool,
        /// Save the extracted text as a new note
        #[arg(long)]
        save: bool,
    },
    /// Treat text as a voice transcript (notes and tasks)
    Transcript {
        text: String,
    },
    Signup {
        name: String,
        email: String,
        password: String,
        confirm_password: String,
    },
    Login {
        email: String,
        password: String,
    },
    GoogleLogin,
    GoogleLogout,
    #[command(subcommand)]
    Sync(SyncCommand),
}

#[derive(Debug, Subcommand)]
pub enum SyncCommand {
    Push,
    Pull,
}

fn load_config(cli: &Cli) -> Result<Config, NoteflowError> {
    match &cli.config_file {
        Some(path) => state::load_config_from(path),
        None => state::load_config(),
    }
}

/// Run one command and return what to print.
pub async fn run(cli: Cli) -> Result<String, NoteflowError> {
    let config = load_config(&cli)?;

    // Account commands never load the notes.
    match &cli.command {
        Command::Signup {
            name,
            email,
            password,
            confirm_password,
        } => {
            let user = GuestDirectory::new(config.guest_users_path()).sign_up(
                name,
                email,
                password,
                confirm_password,
            )?;
            return Ok(format!("Logged in as Guest: {} ({})", user.name, user.email));
        }
        Command::Login { email, password } => {
            let user = GuestDirectory::new(config.guest_users_path()).log_in(email, password)?;
            return Ok(format!("Logged in as Guest: {} ({})", user.name, user.email));
        }
        Command::GoogleLogin => return google_login(&cli, config).await,
        Command::GoogleLogout => {
            let tokens = TokenStore::in_dir(&config.data_dir());
            let Some(account) = tokens.peek_account_email() else {
                return Ok("Not signed in to Google".to_string());
            };
            tokens.delete()?;
            return Ok(format!("Signed out of Google ({})", account));
        }
        _ => {}
    }

    let collaborators = Collaborators {
        sync: state::build_sync(&config),
        ai: state::build_ai(&config),
        is_guest: cli.guest,
    };
    let mut ctx = AppContext::startup(config, collaborators).await;
    let (message, changed) = execute(&mut ctx, cli.command).await?;
    if changed {
        if let Some(outcome) = ctx.shutdown().await? {
            log::info!("Sync after save: {:?}", outcome);
        }
    }
    Ok(message)
}

async fn google_login(cli: &Cli, config: Config) -> Result<String, NoteflowError> {
    let credentials = config.google.credentials_path.clone().ok_or_else(|| {
        NoteflowError::Configuration("google.credentialsPath is not set".to_string())
    })?;
    let tokens = TokenStore::in_dir(&config.data_dir());
    let account = auth::run_consent_flow(&PathBuf::from(credentials), &tokens).await?;

    let update = |c: &mut Config| c.google.enabled = true;
    match &cli.config_file {
        Some(path) => state::update_config_at(path, update)?,
        None => state::create_or_update_config(update)?,
    };
    Ok(format!("Logged in as {} ({})", account.name, account.email))
}

/// Execute a note command. Returns the message and whether the notes
/// changed.
pub async fn execute(
    ctx: &mut AppContext,
    command: Command,
) -> Result<(String, bool), NoteflowError> {
    let outcome = match command {
        Command::List { archived } => (render_list(&ctx.store, archived), false),
        Command::Show { row } => {
            let index = resolve_row(&ctx.store, row)?;
            (render_note(ctx.store.get(index)?), false)
        }
        Command::Add { fields } => {
            let draft = apply_fields(NoteDraft::default(), fields)?;
            match ctx.store.save_note(draft, None)? {
                Some(_) => ("Note saved.".to_string(), true),
                None => ("Note is empty, nothing saved.".to_string(), false),
            }
        }
        Command::Edit { row, fields } => {
            let index = resolve_row(&ctx.store, row)?;
            let draft = apply_fields(NoteDraft::from_note(ctx.store.get(index)?), fields)?;
            match ctx.store.save_note(draft, Some(index))? {
                Some(_) => ("Note updated.".to_string(), true),
                None => ("Note is empty, nothing saved.".to_string(), false),
            }
        }
        Command::Pin { row } => {
            let index = resolve_row(&ctx.store, row)?;
            let pinned = ctx.store.toggle_pin(index)?;
            let msg = if pinned { "Note pinned." } else { "Note unpinned." };
            (msg.to_string(), true)
        }
        Command::Archive { row } => {
            let index = resolve_row(&ctx.store, row)?;
            ctx.store.toggle_archive(index)?;
            ("Note archived.".to_string(), true)
        }
        Command::Unarchive { row } => {
            ctx.store.unarchive(archived_index(&ctx.store, row)?)?;
            ("Note restored.".to_string(), true)
        }
        Command::Delete { row } => {
            let index = resolve_row(&ctx.store, row)?;
            let note = ctx.store.delete(index)?;
            (format!("Deleted \"{}\".", note.title), true)
        }
        Command::DeleteArchived { row } => {
            let note = ctx.store.delete_archived(archived_index(&ctx.store, row)?)?;
            (format!("Deleted \"{}\".", note.title), true)
        }
        Command::Tags { row, tags } => {
            let index = resolve_row(&ctx.store, row)?;
            ctx.store.edit_tags(index, tags.trim())?;
            (format!("Manually Added Tags: {}", tags.trim()), true)
        }
        Command::Search { query } => {
            let hits = ctx.store.search_rows(&query);
            if hits.is_empty() {
                ("No matching notes.".to_string(), false)
            } else {
                (render_rows(hits.into_iter()), false)
            }
        }
        Command::Ask { row } => {
            let index = resolve_row(&ctx.store, row)?;
            let content = ctx.store.get(index)?.content.clone();
            let reply = assist::generate_response(ctx.ai()?, &content).await;
            (reply.message, false)
        }
        Command::Autotag { row } => {
            let index = resolve_row(&ctx.store, row)?;
            let content = ctx.store.get(index)?.content.clone();
            let reply = assist::suggest_tags(ctx.ai()?, &content).await;
            match reply.output {
                Some(tags) => {
                    ctx.store.edit_tags(index, tags)?;
                    (reply.message, true)
                }
                None => (reply.message, false),
            }
        }
        Command::Organize { row, apply } => {
            let index = resolve_row(&ctx.store, row)?;
            let note = ctx.store.get(index)?.clone();
            let reply = assist::organize_ideas(ctx.ai()?, &note.content).await;
            match (reply.output, apply) {
                (Some(body), true) => {
                    let mut draft = NoteDraft::from_note(&note);
                    draft.body = body;
                    ctx.store.save_note(draft, Some(index))?;
                    (reply.message, true)
                }
                _ => (reply.message, false),
            }
        }
        Command::Chat { message } => {
            let reply = assist::chat_reply(ctx.ai()?, &message).await;
            (reply.message, false)
        }
        Command::Ocr {
            file,
            summarize,
            save,
        } => {
            let ai = ctx.ai()?;
            let rasterizer = PdftoppmRasterizer::default();
            let text = match handwriting::extract_handwritten_text(ai, &rasterizer, &file).await {
                Ok(text) => text,
                Err(e) => return Ok((e.to_string(), false)),
            };
            let mut message = text.clone();
            if summarize {
                let summary = assist::summarize_handwriting(ai, &text).await;
                message = format!("{}\n\nSummary:\n{}", text, summary.message);
            }
            if save {
                let title = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                ctx.store.add(Note::new(title, text));
            }
            (message, save)
        }
        Command::Transcript { text } => {
            let normalized = normalize_transcript(&text);
            let before = ctx.store.len();
            let status = intent::apply_transcript(
                &mut ctx.store,
                &normalized,
                Local::now().naive_local(),
            );
            (format!("{}\n{}", normalized, status), ctx.store.len() != before)
        }
        Command::Sync(SyncCommand::Push) => {
            ctx.save()?;
            let message = match ctx.push().await? {
                Some(outcome) => sync_message(outcome),
                None => "Sync is not configured for this session.".to_string(),
            };
            (message, false)
        }
        Command::Sync(SyncCommand::Pull) => {
            let message = match ctx.pull().await? {
                Some(outcome) => sync_message(outcome),
                None => "Sync is not configured for this session.".to_string(),
            };
            (message, false)
        }
        Command::Signup { .. }
        | Command::Login { .. }
        | Command::GoogleLogin
        | Command::GoogleLogout => {
            return Err(NoteflowError::Validation(
                "Account commands run before notes are loaded".to_string(),
            ))
        }
    };
    Ok(outcome)
}

fn sync_message(outcome: SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Pushed => "Notes uploaded to Google Drive.",
        SyncOutcome::Pulled => "Notes downloaded from Google Drive.",
        SyncOutcome::LocalKept => "Local notes kept.",
        SyncOutcome::NothingRemote => "No notes found on Google Drive.",
        SyncOutcome::Offline => "No internet connection; sync skipped.",
    }
    .to_string()
}

fn apply_fields(mut draft: NoteDraft, fields: NoteFields) -> Result<NoteDraft, NoteflowError> {
    if let Some(title) = fields.title {
        draft.title = title;
    }
    if let Some(body) = fields.body {
        draft.body = body;
    }
    if let Some(color) = fields.color {
        draft.color = color;
    }
    if let Some(tags) = fields.tags {
        draft.tags = tags;
    }
    if let Some(raw) = fields.reminder {
        draft.reminder = if raw.trim().is_empty() {
            None
        } else {
            Some(Reminder::parse(&raw).ok_or_else(|| {
                NoteflowError::Validation(format!(
                    "Invalid reminder \"{}\". Use yyyy-MM-dd HH:mm",
                    raw
                ))
            })?)
        };
    }
    if !fields.items.is_empty() || !fields.done.is_empty() {
        draft.checklist = fields
            .done
            .into_iter()
            .map(|t| ChecklistItem::new(t, true))
            .chain(fields.items.into_iter().map(|t| ChecklistItem::new(t, false)))
            .collect();
    }
    if let Some(drawing) = fields.drawing {
        draft.drawing = drawing;
    }
    if fields.clear_attachments {
        draft.attached_files.clear();
    }
    if fields.clear_collaborators {
        draft.collaborators.clear();
    }
    draft.attached_files.extend(fields.attachments);
    draft.collaborators.extend(fields.collaborators);
    Ok(draft)
}

/// 1-based display row to active-collection index.
pub fn resolve_row(store: &NoteStore, row: usize) -> Result<usize, NoteflowError> {
    let order = store.sorted_indices();
    row.checked_sub(1)
        .and_then(|r| order.get(r).copied())
        .ok_or(NoteflowError::IndexOutOfRange {
            index: row,
            len: order.len(),
        })
}

fn archived_index(store: &NoteStore, row: usize) -> Result<usize, NoteflowError> {
    let len = store.archived().len();
    match row.checked_sub(1) {
        Some(i) if i < len => Ok(i),
        _ => Err(NoteflowError::IndexOutOfRange { index: row, len }),
    }
}

/// One line per `(row, note)`.
fn render_rows<'a>(rows: impl Iterator<Item = (usize, &'a Note)>) -> String {
    rows.map(|(row, note)| {
        let mut line = format!("{:>3}. ", row);
        if note.pinned {
            line.push_str("📌 ");
        }
        line.push_str(&note.title);
        if !note.tags.trim().is_empty() {
            line.push_str(&format!(" [{}]", note.tags.trim()));
        }
        if let Some(reminder) = note.reminder {
            line.push_str(&format!(" ⏰ {}", reminder));
        }
        line
    })
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn render_list(store: &NoteStore, archived: bool) -> String {
    let rendered = if archived {
        render_rows(store.archived().iter().enumerate().map(|(i, n)| (i + 1, n)))
    } else {
        render_rows(store.sorted_view().into_iter().enumerate().map(|(i, n)| (i + 1, n)))
    };
    if rendered.is_empty() {
        "No notes.".to_string()
    } else {
        rendered
    }
}

fn render_note(note: &Note) -> String {
    let mut out = format!("{}\n{}\n", note.title, "=".repeat(note.title.chars().count()));
    out.push_str(&note.content);
    out.push('\n');
    if !note.tags.is_empty() {
        out.push_str(&format!("\nTags: {}", note.tags));
    }
    if let Some(reminder) = note.reminder {
        out.push_str(&format!("\nReminder: {}", reminder));
    }
    if !note.attached_files.is_empty() {
        out.push_str(&format!("\nFiles: {}", note.attached_files.join(", ")));
    }
    if !note.collaborators.is_empty() {
        out.push_str(&format!("\nCollaborators: {}", note.collaborators.join(", ")));
    }
    out
}

/// Print `result` and pick the process exit code.
pub fn report(result: Result<String, NoteflowError>) -> i32 {
    match result {
        Ok(message) => {
            println!("{}", message);
            0
        }
        Err(e) => {
            eprintln!("{}", e.status_line());
            1
        }
    }
}
