//! CLI module for the contact-suite terminal client.
//!
//! Subcommands drive the same library state machines a graphical client
//! would:
//! - `login` / `register` / `logout` / `whoami` / `passwd` - session management
//! - `contacts list|add|edit|delete` - one-shot contact operations
//! - `browse` - interactive list with debounced search
//! - `config check` - validate configuration file

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::auth::{ChangePasswordForm, RegisterForm};
use crate::config::Config;
use crate::contacts::{
    Contact, ContactForm, ContactListCoordinator, EntryKind, Field, Modal, ProfileModal,
};
use crate::formatting::truncate;
use crate::AppContext;

const NOT_LOGGED_IN: &str = "Not logged in.";

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "contact-suite")]
#[command(author, version, about = "Terminal client for the contact manager API", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "CONTACT_SUITE_CONFIG", default_value = "contact-suite.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to (overrides api.base_url)
    #[arg(long, env = "CONTACT_SUITE_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with an email or phone number
    Login {
        identifier: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        identifier: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Password confirmation (read from stdin when omitted)
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in profile
    Whoami,

    /// Change the account password
    Passwd {
        #[arg(long)]
        old: Option<String>,
        #[arg(long)]
        new: Option<String>,
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Contact management commands
    #[command(subcommand)]
    Contacts(ContactsCommands),

    /// Interactive contact list
    Browse,

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Contacts subcommands
#[derive(Subcommand, Debug)]
pub enum ContactsCommands {
    /// List one page of contacts
    List {
        /// Zero-based page index
        #[arg(long, default_value = "0")]
        page: u32,
        /// Filter text
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a contact
    Add(ContactArgs),
    /// Update an existing contact
    Edit {
        id: i64,
        #[command(flatten)]
        fields: ContactArgs,
    },
    /// Delete a contact
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Contact fields; `--email`/`--phone` take `value` or `label=value` and
/// may repeat
#[derive(Args, Debug, Default)]
pub struct ContactArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long = "email")]
    pub emails: Vec<String>,
    #[arg(long = "phone")]
    pub phones: Vec<String>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command
pub async fn run_command(cli: &Cli, mut config: Config) -> Result<()> {
    if let Commands::Config(ConfigCommands::Check) = &cli.command {
        return cmd_config_check(cli);
    }

    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    let ctx = AppContext::new(config)?;
    let mut input = stdin_lines();

    match &cli.command {
        Commands::Login {
            identifier,
            password,
        } => {
            let password = match password {
                Some(p) => p.clone(),
                None => prompt(&mut input, "Password: ").await?,
            };
            cmd_login(&ctx, identifier, &password).await
        }
        Commands::Register {
            identifier,
            password,
            confirm,
        } => {
            let password = match password {
                Some(p) => p.clone(),
                None => prompt(&mut input, "Password: ").await?,
            };
            let confirm = match confirm {
                Some(p) => p.clone(),
                None => prompt(&mut input, "Confirm password: ").await?,
            };
            cmd_register(&ctx, identifier, &password, &confirm).await
        }
        Commands::Logout => cmd_logout(&ctx),
        Commands::Whoami => cmd_whoami(&ctx),
        Commands::Passwd { old, new, confirm } => {
            require_session(&ctx)?;
            let mut form = ChangePasswordForm::new();
            form.old_password = match old {
                Some(p) => p.clone(),
                None => prompt(&mut input, "Old password: ").await?,
            };
            form.new_password = match new {
                Some(p) => p.clone(),
                None => prompt(&mut input, "New password: ").await?,
            };
            form.confirm_password = match confirm {
                Some(p) => p.clone(),
                None => prompt(&mut input, "Confirm new password: ").await?,
            };
            cmd_passwd(&ctx, form).await
        }
        Commands::Contacts(ContactsCommands::List { page, search }) => {
            cmd_contacts_list(&ctx, *page, search.as_deref().unwrap_or("")).await
        }
        Commands::Contacts(ContactsCommands::Add(fields)) => cmd_contacts_add(&ctx, fields).await,
        Commands::Contacts(ContactsCommands::Edit { id, fields }) => {
            cmd_contacts_edit(&ctx, *id, fields).await
        }
        Commands::Contacts(ContactsCommands::Delete { id, yes }) => {
            cmd_contacts_delete(&ctx, *id, *yes, &mut input).await
        }
        Commands::Browse => cmd_browse(&ctx, &mut input).await,
        Commands::Config(ConfigCommands::Check) => cmd_config_check(cli),
    }
}

type InputLines = Lines<BufReader<Stdin>>;

fn stdin_lines() -> InputLines {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Print a prompt to stderr and read one line
async fn prompt(input: &mut InputLines, label: &str) -> Result<String> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(label.as_bytes()).await?;
    stderr.flush().await?;
    let line = input
        .next_line()
        .await
        .context("Failed to read from stdin")?
        .unwrap_or_default();
    Ok(line.trim_end_matches('\r').to_string())
}

fn require_session(ctx: &AppContext) -> Result<()> {
    if !ctx.session.is_authenticated() {
        anyhow::bail!(NOT_LOGGED_IN);
    }
    Ok(())
}

/// Fail with the recorded reason if the last call ended the session
fn check_forced_logout(ctx: &AppContext) -> Result<()> {
    if let Some(reason) = ctx.session.take_logout_reason() {
        anyhow::bail!(reason);
    }
    Ok(())
}

async fn cmd_login(ctx: &AppContext, identifier: &str, password: &str) -> Result<()> {
    let mut flow = ctx.auth_flow();
    match flow.login(identifier, password).await {
        Ok(session) => {
            println!("[OK] Logged in as {}", session.display_name());
            Ok(())
        }
        Err(message) => anyhow::bail!(message),
    }
}

async fn cmd_register(
    ctx: &AppContext,
    identifier: &str,
    password: &str,
    confirm: &str,
) -> Result<()> {
    let mut flow = ctx.auth_flow();
    let form = RegisterForm {
        identifier: identifier.to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
        ..Default::default()
    };

    form.submit(&mut flow).await.map_err(anyhow::Error::msg)?;
    if let Some(message) = flow.message() {
        println!("[OK] {}", message);
    }
    Ok(())
}

fn cmd_logout(ctx: &AppContext) -> Result<()> {
    let mut flow = ctx.auth_flow();
    flow.logout();
    println!("Logged out.");
    Ok(())
}

fn cmd_whoami(ctx: &AppContext) -> Result<()> {
    let Some(session) = ctx.session.current() else {
        anyhow::bail!(NOT_LOGGED_IN);
    };
    let profile = ProfileModal::new(session.identifier);

    println!();
    println!("Name:       {}", profile.display_name());
    println!("Identifier: {}", profile.identifier());
    println!();
    Ok(())
}

async fn cmd_passwd(ctx: &AppContext, mut form: ChangePasswordForm) -> Result<()> {
    match form.submit(ctx.api.as_ref(), &ctx.session).await {
        Ok(notice) => {
            println!("[OK] {}", notice);
            Ok(())
        }
        Err(message) => anyhow::bail!(message),
    }
}

async fn cmd_contacts_list(ctx: &AppContext, page: u32, search: &str) -> Result<()> {
    require_session(ctx)?;
    let mut list = ctx.contact_list();
    list.load(page, search).await;
    check_forced_logout(ctx)?;

    if let Some(error) = list.list_error() {
        anyhow::bail!(error.to_string());
    }
    print_list(&list);
    Ok(())
}

async fn cmd_contacts_add(ctx: &AppContext, fields: &ContactArgs) -> Result<()> {
    require_session(ctx)?;
    let mut list = ctx.contact_list();
    list.open_create();
    if let Some(form) = list.form_mut() {
        apply_fields(form, fields);
    }

    let result = list.submit_form().await;
    check_forced_logout(ctx)?;
    let contact = result.map_err(|e| anyhow::anyhow!(e.message().to_string()))?;

    println!("[OK] Created contact {} ({})", contact.full_name(), contact.id);
    Ok(())
}

async fn cmd_contacts_edit(ctx: &AppContext, id: i64, fields: &ContactArgs) -> Result<()> {
    require_session(ctx)?;
    let mut list = ctx.contact_list();
    let contact = find_contact(ctx, &mut list, id).await?;

    list.open_edit(&contact);
    if let Some(form) = list.form_mut() {
        apply_fields(form, fields);
    }

    let result = list.submit_form().await;
    check_forced_logout(ctx)?;
    let contact = result.map_err(|e| anyhow::anyhow!(e.message().to_string()))?;

    println!("[OK] Updated contact {} ({})", contact.full_name(), contact.id);
    Ok(())
}

async fn cmd_contacts_delete(
    ctx: &AppContext,
    id: i64,
    yes: bool,
    input: &mut InputLines,
) -> Result<()> {
    require_session(ctx)?;
    let mut list = ctx.contact_list();
    let contact = find_contact(ctx, &mut list, id).await?;

    list.open_delete(&contact);
    if !yes && !confirm_delete(&list, input).await? {
        list.close_modal();
        println!("Cancelled.");
        return Ok(());
    }

    list.confirm_delete().await;
    check_forced_logout(ctx)?;
    if let Some(error) = list.action_error() {
        anyhow::bail!(error.to_string());
    }
    println!("[OK] Deleted contact {}", id);
    Ok(())
}

/// Show the dialog prompt and read a y/N answer
async fn confirm_delete(list: &ContactListCoordinator, input: &mut InputLines) -> Result<bool> {
    let Some(Modal::Delete(dialog)) = list.modal() else {
        return Ok(false);
    };
    println!("{}", dialog.prompt());
    let answer = prompt(input, "[y/N] ").await?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Page through the unfiltered list until `id` turns up
async fn find_contact(
    ctx: &AppContext,
    list: &mut ContactListCoordinator,
    id: i64,
) -> Result<Contact> {
    let mut page = 0;
    loop {
        list.load(page, "").await;
        check_forced_logout(ctx)?;
        if let Some(error) = list.list_error() {
            anyhow::bail!(error.to_string());
        }
        if let Some(contact) = list.contacts().iter().find(|c| c.id == id) {
            return Ok(contact.clone());
        }
        if list.is_last_page() || list.contacts().is_empty() {
            anyhow::bail!("Contact not found: {}", id);
        }
        page += 1;
    }
}

/// Copy command-line fields into an open form. Repeated entries replace the
/// form's existing ones.
fn apply_fields(form: &mut ContactForm, fields: &ContactArgs) {
    if let Some(v) = &fields.first_name {
        form.set(Field::FirstName, v.as_str());
    }
    if let Some(v) = &fields.last_name {
        form.set(Field::LastName, v.as_str());
    }
    if let Some(v) = &fields.title {
        form.set(Field::Title, v.as_str());
    }
    if !fields.emails.is_empty() {
        replace_entries(form, EntryKind::Email, &fields.emails);
    }
    if !fields.phones.is_empty() {
        replace_entries(form, EntryKind::Phone, &fields.phones);
    }
}

fn replace_entries(form: &mut ContactForm, kind: EntryKind, values: &[String]) {
    let len = |form: &ContactForm| match kind {
        EntryKind::Email => form.emails().len(),
        EntryKind::Phone => form.phones().len(),
    };
    while len(form) > 1 {
        form.remove(kind, len(form) - 1);
    }

    for (i, raw) in values.iter().enumerate() {
        if i > 0 {
            form.add(kind);
        }
        let (label, value) = split_entry(raw);
        let (label_field, value_field) = match kind {
            EntryKind::Email => (Field::EmailLabel(i), Field::Email(i)),
            EntryKind::Phone => (Field::PhoneLabel(i), Field::PhoneNumber(i)),
        };
        form.set(label_field, label);
        form.set(value_field, value);
    }
}

/// `Work=a@b.com` -> ("Work", "a@b.com"); a bare value has an empty label
fn split_entry(raw: &str) -> (&str, &str) {
    match raw.split_once('=') {
        Some((label, value)) => (label.trim(), value.trim()),
        None => ("", raw.trim()),
    }
}

// ============================================================================
// Interactive browsing
// ============================================================================

const BROWSE_HELP: &str = "/text search, n next, p previous, d <row> delete, r refresh, q quit";

async fn cmd_browse(ctx: &AppContext, input: &mut InputLines) -> Result<()> {
    require_session(ctx)?;
    let mut list = ctx.contact_list();
    list.mount().await;
    print_list(&list);
    println!("{}", BROWSE_HELP);

    loop {
        if !ctx.session.is_authenticated() {
            list.teardown();
            check_forced_logout(ctx)?;
            return Ok(());
        }

        tokio::select! {
            text = list.search_settled() => {
                list.apply_search(text).await;
                print_list(&list);
            }
            line = input.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                if !browse_step(&mut list, line.trim(), input).await? {
                    break;
                }
            }
        }
    }

    list.teardown();
    Ok(())
}

/// Handle one input line. Returns false to quit.
async fn browse_step(
    list: &mut ContactListCoordinator,
    line: &str,
    input: &mut InputLines,
) -> Result<bool> {
    if let Some(text) = line.strip_prefix('/') {
        list.on_search_input(text);
        return Ok(true);
    }

    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("q") => return Ok(false),
        Some("n") => {
            list.next_page().await;
            print_list(list);
        }
        Some("p") => {
            list.prev_page().await;
            print_list(list);
        }
        Some("r") => {
            list.fetch().await;
            print_list(list);
        }
        Some("d") => {
            let row = parts.next().and_then(|r| r.parse::<usize>().ok());
            let Some(contact) = row
                .and_then(|r| r.checked_sub(1))
                .and_then(|i| list.contacts().get(i))
                .cloned()
            else {
                println!("Usage: d <row>");
                return Ok(true);
            };

            list.open_delete(&contact);
            if confirm_delete(list, input).await? {
                list.confirm_delete().await;
            } else {
                list.close_modal();
            }
            print_list(list);
        }
        Some(_) => println!("{}", BROWSE_HELP),
        None => {}
    }
    Ok(true)
}

// ============================================================================
// Output
// ============================================================================

fn print_list(list: &ContactListCoordinator) {
    println!();
    if let Some(notice) = list.notice() {
        println!("[OK] {}", notice);
    }
    if let Some(error) = list.action_error() {
        println!("[!!] {}", error);
    }
    if let Some(error) = list.list_error() {
        println!("[!!] {}", error);
        return;
    }
    if !list.search().is_empty() {
        println!("Search: {}", list.search());
    }

    if let Some(message) = list.empty_message() {
        println!("{}", message);
    } else {
        for line in render_rows(list.contacts()) {
            println!("{}", line);
        }
    }

    if list.shows_pagination() {
        println!();
        println!(
            "Page {}{}{}",
            list.page() + 1,
            if list.page() > 0 { "  [p] prev" } else { "" },
            if list.is_last_page() { "" } else { "  [n] next" },
        );
    }
    println!();
}

fn render_rows(contacts: &[Contact]) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{:<4} {:<8} {:<24} {:<16} {:<32} {:<24}",
            "#", "ID", "NAME", "TITLE", "EMAILS", "PHONES"
        ),
        "-".repeat(113),
    ];
    for (i, contact) in contacts.iter().enumerate() {
        lines.push(format!(
            "{:<4} {:<8} {:<24} {:<16} {:<32} {:<24}",
            i + 1,
            contact.id,
            truncate(&contact.full_name(), 24),
            truncate(&contact.title, 16),
            truncate(&contact.emails_summary(), 32),
            truncate(&contact.phones_summary(), 24),
        ));
    }
    lines
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("API:");
            println!("  Base URL:     {}", config.api.base_url);
            println!("  Timeout:      {}s", config.api.timeout_secs);
            println!();
            println!("Session:");
            println!("  File:         {}", config.session.path.display());
            println!();
            println!("Contacts:");
            println!("  Page Size:    {}", config.contacts.page_size);
            println!("  Debounce:     {}ms", config.contacts.search_debounce_ms);
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            println!();

            if config.api.base_url.starts_with("http://")
                && !config.api.base_url.contains("localhost")
                && !config.api.base_url.contains("127.0.0.1")
            {
                println!("Warnings:");
                println!("  [!] API URL is not HTTPS - credentials will be sent in plaintext");
                println!();
            }
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            anyhow::bail!("Invalid configuration file");
        }
    }
}
