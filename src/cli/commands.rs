use std::error::Error;
use std::path::Path;

use colored::{ColoredString, Colorize};
use console_rules::highlight::{self, TokenKind};
use console_rules::search::{filter_by_name, find_snippet};
use console_rules::{RunError, Session, Snippet, StoreError};

/// Lists snippets in collection order, optionally narrowed by a name filter
pub fn list_snippets(session: &Session, filter: Option<&str>) {
    let snippets = session.store.snippets();
    let visible = filter_by_name(snippets, filter.unwrap_or_default());

    println!(
        "{}  {} ({}/{})",
        "┃".bright_magenta(),
        session.translator.t("savedSnippets").bright_green().bold(),
        visible.len(),
        snippets.len()
    );
    println!("{}", "─".repeat(60).bright_magenta());

    if visible.is_empty() {
        println!(
            "{}  {}",
            "┃".bright_magenta(),
            session.translator.t("noSnippets").bright_black()
        );
        return;
    }

    for snippet in visible {
        let index = session.store.position(&snippet.id).unwrap_or_default();
        println!(
            "{}  {:>3}. {}  {}  {}",
            "┃".bright_magenta(),
            index.to_string().yellow(),
            snippet.id.bright_black(),
            snippet.name.bright_white(),
            snippet.formatted_time().bright_black()
        );
    }
}

/// Shows the content of a specific snippet by ID or name
pub fn show_snippet(session: &Session, id_or_name: &str) {
    match find_snippet(session.store.snippets(), id_or_name) {
        Some(snippet) => display_snippet_content(snippet),
        None => not_found(session, id_or_name),
    }
}

fn display_snippet_content(snippet: &Snippet) {
    println!(
        "{}  {} {}",
        "┃".bright_magenta(),
        "SNIPPET".bright_green().bold(),
        snippet.name.bold()
    );
    println!("{}", "─".repeat(60).bright_magenta());
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "ID".bright_black(),
        snippet.id
    );
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "Updated".bright_cyan(),
        snippet.formatted_time()
    );
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "Lines".bright_yellow(),
        snippet.line_count()
    );
    println!("{}", "─".repeat(60).bright_magenta());

    for tokens in highlight::token_lines(&snippet.code) {
        let line: String = tokens
            .iter()
            .map(|token| paint(token.kind, token.text).to_string())
            .collect();
        println!("{}  {}", "┃".bright_magenta(), line);
    }
}

fn paint(kind: TokenKind, text: &str) -> ColoredString {
    match kind {
        TokenKind::Comment => text.bright_black().italic(),
        TokenKind::String => text.yellow(),
        TokenKind::Keyword => text.cyan().bold(),
        TokenKind::Number => text.bright_red(),
        TokenKind::Plain => text.normal(),
    }
}

pub async fn new_snippet(
    session: &mut Session,
    name: Option<String>,
    file: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let code = match &file {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };

    let result = match name {
        Some(name) => session.store.create(name, code).await,
        None if code.is_empty() => session.store.create_blank().await,
        None => {
            let name = session.store.labels().new_name.clone();
            session.store.create(name, code).await
        }
    };
    let snippet = check(session, result)?;

    success(&format!(
        "{}: {} ({})",
        session.translator.t("snippetCreated"),
        snippet.name,
        snippet.id
    ));
    Ok(())
}

pub async fn save_snippet(
    session: &mut Session,
    id_or_name: &str,
    name: Option<String>,
    file: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let Some(existing) = find_snippet(session.store.snippets(), id_or_name).cloned() else {
        not_found(session, id_or_name);
        return Ok(());
    };

    let name = name.unwrap_or(existing.name);
    let code = match &file {
        Some(path) => std::fs::read_to_string(path)?,
        None => existing.code,
    };

    let result = session.store.update(&existing.id, &name, &code).await;
    let snippet = check(session, result)?;
    success(&format!(
        "{}: {}",
        session.translator.t("snippetSaved"),
        snippet.name
    ));
    Ok(())
}

pub async fn duplicate_snippet(
    session: &mut Session,
    id_or_name: &str,
) -> Result<(), Box<dyn Error>> {
    let Some(id) = resolve_id(session, id_or_name) else {
        return Ok(());
    };

    let result = session.store.duplicate(&id).await;
    let copy = check(session, result)?;
    success(&format!(
        "{}: {} ({})",
        session.translator.t("snippetDuplicated"),
        copy.name,
        copy.id
    ));
    Ok(())
}

pub async fn remove_snippet(session: &mut Session, id_or_name: &str) -> Result<(), Box<dyn Error>> {
    let Some(id) = resolve_id(session, id_or_name) else {
        return Ok(());
    };

    let result = session.store.remove(&id).await;
    match check(session, result)? {
        Some(removed) => success(&format!(
            "{}: {}",
            session.translator.t("snippetDeleted"),
            removed.name
        )),
        None => not_found(session, id_or_name),
    }
    Ok(())
}

pub async fn move_snippet(
    session: &mut Session,
    id_or_name: &str,
    index: usize,
) -> Result<(), Box<dyn Error>> {
    let Some(id) = resolve_id(session, id_or_name) else {
        return Ok(());
    };

    let result = session.store.reorder(&id, index).await;
    check(session, result)?;
    success(&session.translator.t("orderUpdated"));
    Ok(())
}

/// Runs the stored version of a snippet and reports the outcome
pub async fn run_snippet(session: &mut Session, id_or_name: &str) -> Result<(), Box<dyn Error>> {
    let Some(snippet) = find_snippet(session.store.snippets(), id_or_name).cloned() else {
        not_found(session, id_or_name);
        return Ok(());
    };

    let ticket = match session.runner.try_begin() {
        Ok(ticket) => ticket,
        Err(RunError::AlreadyRunning) => {
            return Err(session.translator.t("alreadyRunning").into());
        }
        Err(e) => return Err(e.into()),
    };

    let outcome = ticket.execute(&snippet).await;
    let status = outcome.status(&session.translator);
    if !outcome.is_success() {
        return Err(status.into());
    }

    for line in outcome.output_lines() {
        match line.strip_prefix('⇒') {
            Some(result) => println!("{}  {}{}", "┃".bright_magenta(), "⇒".bright_cyan(), result),
            None => println!("{}  {}", "┃".bright_magenta(), line),
        }
    }
    success(&status);
    Ok(())
}

pub async fn export_snippets(session: &Session, path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let path = session.export_to(path.map(Path::new)).await?;
    let path = path.display().to_string();
    success(
        &session
            .translator
            .t_with("exportedTo", &[("path", &path)]),
    );
    Ok(())
}

pub async fn import_snippets(session: &mut Session, path: &str) -> Result<(), Box<dyn Error>> {
    let result = session.import_from(Path::new(path)).await;
    let status = session.import_status(&result);

    match result {
        Ok(imported) => {
            success(&status);
            for snippet in imported {
                println!(
                    "{}  {}  {}",
                    "┃".bright_magenta(),
                    snippet.id.bright_black(),
                    snippet.name.bright_white()
                );
            }
            Ok(())
        }
        Err(_) => Err(status.into()),
    }
}

/// Shows the current language, or switches to `code`
pub async fn language(session: &mut Session, code: Option<&str>) -> Result<(), Box<dyn Error>> {
    let Some(code) = code else {
        println!(
            "{}  {}: {} ({})",
            "┃".bright_magenta(),
            session.translator.t("language").bright_yellow(),
            session.translator.language(),
            console_rules::i18n::Translator::supported_languages().join(", ")
        );
        return Ok(());
    };

    if session.set_language(code).await? {
        let language = session.translator.language().to_string();
        success(
            &session
                .translator
                .t_with("languageChanged", &[("language", &language)]),
        );
    } else {
        println!(
            "{}  Unsupported language: {} (supported: {})",
            "┃".bright_magenta(),
            code,
            console_rules::i18n::Translator::supported_languages().join(", ")
        );
    }
    Ok(())
}

/// Prints the highlighter markup for a file
pub fn highlight_file(path: &str) -> Result<(), Box<dyn Error>> {
    let code = std::fs::read_to_string(path)?;
    println!("{}", highlight::highlight(&code));
    Ok(())
}

fn resolve_id(session: &Session, id_or_name: &str) -> Option<String> {
    match find_snippet(session.store.snippets(), id_or_name) {
        Some(snippet) => Some(snippet.id.clone()),
        None => {
            not_found(session, id_or_name);
            None
        }
    }
}

/// Turns a store failure into the localized status, as an error.
fn check<T>(session: &Session, result: Result<T, StoreError>) -> Result<T, Box<dyn Error>> {
    result.map_err(|e| session.translator.store_error(&e).into())
}

fn success(message: &str) {
    println!("{}  {}", "┃".bright_magenta(), message.bright_green());
}

fn not_found(session: &Session, id_or_name: &str) {
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        session.translator.t("snippetNotFound"),
        id_or_name
    );

    let snippets = session.store.snippets();
    if snippets.is_empty() {
        return;
    }

    println!("{}  Available snippets:", "┃".bright_magenta());
    println!("{}", "─".repeat(60).bright_magenta());
    for (idx, snippet) in snippets.iter().enumerate().take(10) {
        println!(
            "{}  {}. {}",
            "┃".bright_magenta(),
            (idx + 1).to_string().yellow(),
            snippet.name.bright_white()
        );
    }
    if snippets.len() > 10 {
        println!(
            "{}  ... and {} more",
            "┃".bright_magenta(),
            snippets.len() - 10
        );
    }
}
