use std::fmt::Write as _;

use postdeck::application::error::AppError;
use postdeck::application::notifications::NotificationCenter;
use postdeck::domain::preferences::ViewMode;
use postdeck::domain::view::author_label;
use postdeck::infra::error::InfraError;
use postdeck_api_types::{Post, User};
use serde::Serialize;

const EXCERPT_CHARS: usize = 100;
const TITLE_COLUMN_CHARS: usize = 48;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value).map_err(InfraError::from)?;
    println!("{out}");
    Ok(())
}

/// Echo the session's notifications to stderr, oldest first.
pub fn notices(center: &NotificationCenter) {
    for notification in center.visible().iter().rev() {
        eprintln!("[{}] {}", notification.level, notification.message);
    }
}

pub fn render_posts(posts: &[Post], users: &[User], mode: ViewMode) -> String {
    if posts.is_empty() {
        return "No posts found\n".to_string();
    }
    match mode {
        ViewMode::Grid => render_grid(posts, users),
        ViewMode::Table => render_table(posts, users),
    }
}

fn render_grid(posts: &[Post], users: &[User]) -> String {
    let mut out = String::new();
    for post in posts {
        let _ = writeln!(out, "#{} {}", post.id, post.title);
        let _ = writeln!(out, "   by {}", author_label(users, post.user_id));
        let _ = writeln!(out, "   {}", truncate(&post.body.replace('\n', " "), EXCERPT_CHARS));
        out.push('\n');
    }
    out
}

fn render_table(posts: &[Post], users: &[User]) -> String {
    let id_width = posts
        .iter()
        .map(|p| p.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<id_width$}  {:<TITLE_COLUMN_CHARS$}  AUTHOR",
        "ID", "TITLE"
    );
    for post in posts {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<TITLE_COLUMN_CHARS$}  {}",
            post.id,
            truncate(&post.title, TITLE_COLUMN_CHARS),
            author_label(users, post.user_id)
        );
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}
