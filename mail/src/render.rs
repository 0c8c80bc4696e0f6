//! Markdown-to-HTML email rendering.
//!
//! A template renders Markdown whose first line is a `# Title` heading. The
//! heading becomes the subject; the remaining Markdown is converted to HTML
//! and wrapped in the base layout.

use crate::catalogue::Email;
use crate::error::{MailError, Result};
use askama::Template;
use pulldown_cmark::{Options, Parser, html};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A fully rendered email body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEmail {
    /// Subject line, taken from the leading heading.
    pub title: String,
    /// Complete HTML document.
    pub html: String,
}

#[derive(Template)]
#[template(path = "emails/base.html")]
struct BaseLayout<'a> {
    title: &'a str,
    content: &'a str,
}

/// Renders catalogue emails, optionally caching static ones.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    cache_static: bool,
    cache: Arc<Mutex<HashMap<&'static str, RenderedEmail>>>,
}

impl Renderer {
    /// Create a renderer. With `cache_static`, emails without state are
    /// rendered once and reused.
    #[must_use]
    pub fn new(cache_static: bool) -> Self {
        Self {
            cache_static,
            cache: Arc::default(),
        }
    }

    /// Render `email` to a subject and HTML body.
    ///
    /// # Errors
    ///
    /// - [`MailError::MissingTitle`] if the Markdown does not start with `#`
    /// - [`MailError::Render`] if a template fails to render
    pub fn render(&self, email: &Email) -> Result<RenderedEmail> {
        let cacheable = self.cache_static && email.is_static();
        if cacheable {
            if let Some(hit) = self.cached(email.name()) {
                return Ok(hit);
            }
        }

        let markdown = email.render_markdown()?;
        let (title, body) = split_title(&markdown).ok_or(MailError::MissingTitle {
            email: email.name(),
        })?;

        let content = markdown_to_html(body);
        let html = BaseLayout {
            title: &title,
            content: &content,
        }
        .render()?;

        let rendered = RenderedEmail { title, html };

        if cacheable {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(email.name(), rendered.clone());
            }
        }

        Ok(rendered)
    }

    fn cached(&self, name: &str) -> Option<RenderedEmail> {
        self.cache.lock().ok()?.get(name).cloned()
    }
}

/// Split `# Title` off the first line.
fn split_title(markdown: &str) -> Option<(String, &str)> {
    let markdown = markdown.trim_start_matches('\u{feff}');
    if !markdown.starts_with('#') {
        return None;
    }
    let (first, rest) = markdown.split_once('\n').unwrap_or((markdown, ""));
    let title = first.trim_start_matches('#').trim().to_string();
    Some((title, rest))
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_title() {
        let (title, rest) = split_title("# Hello there \nBody\nmore").unwrap();
        assert_eq!(title, "Hello there");
        assert_eq!(rest, "Body\nmore");

        assert!(split_title("Hello\n# Later").is_none());
        assert_eq!(split_title("# Only").unwrap(), ("Only".to_string(), ""));
    }

    #[test]
    fn test_markdown_to_html() {
        let out = markdown_to_html("Some **bold** text\n\n[link](https://x.test)");
        assert!(out.contains("<strong>bold</strong>"));
        assert!(out.contains(r#"<a href="https://x.test">link</a>"#));
    }

    #[test]
    fn test_render_login_email() {
        let renderer = Renderer::new(false);
        let email = Email::EmailLogin {
            url: "https://app.test/email-login?signature=abc".into(),
        };
        let rendered = renderer.render(&email).unwrap();

        assert_eq!(rendered.title, "Sign in to your account");
        assert!(rendered.html.contains("<title>Sign in to your account</title>"));
        assert!(rendered.html.contains("https://app.test/email-login?signature=abc"));
        assert!(!rendered.html.contains("# Sign in"));
    }

    #[test]
    fn test_static_emails_cached_only_when_enabled() {
        let renderer = Renderer::new(true);
        renderer.render(&Email::Welcome).unwrap();
        renderer
            .render(&Email::EmailLogin { url: "u".into() })
            .unwrap();

        let cache = renderer.cache.lock().unwrap();
        assert!(cache.contains_key("welcome"));
        assert!(!cache.contains_key("email_login"));
        drop(cache);

        let uncached = Renderer::new(false);
        uncached.render(&Email::Welcome).unwrap();
        assert!(uncached.cache.lock().unwrap().is_empty());
    }
}
