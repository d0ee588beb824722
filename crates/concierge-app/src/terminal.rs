//! Terminal host: draws the conversation as plain text and turns typed
//! lines into engine calls.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use concierge_chat::Renderer;
use concierge_core::types::Message;

/// [`Renderer`] that writes the conversation to a text stream.
pub struct TerminalRenderer<W: Write + Send> {
    out: Mutex<W>,
    follow_ups: Mutex<Vec<String>>,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            follow_ups: Mutex::new(Vec::new()),
        }
    }

    /// The follow-up shown under `number` (1-based) in the last reply.
    pub fn follow_up(&self, number: usize) -> Option<String> {
        let follow_ups = lock(&self.follow_ups);
        number
            .checked_sub(1)
            .and_then(|i| follow_ups.get(i))
            .cloned()
    }

    fn write_line(&self, line: &str) {
        let mut out = lock(&self.out);
        // Write errors are ignored.
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

impl TerminalRenderer<Vec<u8>> {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.out)).into_owned()
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn append_message(&self, message: &Message) {
        let who = if message.is_from_user { "you" } else { "concierge" };
        self.write_line(&format!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M"),
            who,
            message.text
        ));
    }

    fn show_typing(&self) {
        lock(&self.follow_ups).clear();
        self.write_line("  concierge is typing...");
    }

    fn hide_typing(&self) {}

    fn show_follow_ups(&self, follow_ups: &[String]) {
        *lock(&self.follow_ups) = follow_ups.to_vec();
        let options: Vec<String> = follow_ups
            .iter()
            .enumerate()
            .map(|(i, label)| format!("[{}] {}", i + 1, label))
            .collect();
        self.write_line(&format!("  {}", options.join("  ")));
    }

    fn request_action(&self, action: &str) {
        if action == "capture_email" {
            self.write_line("  (type your email address to subscribe)");
        }
    }

    fn reset(&self, notice: &str) {
        lock(&self.follow_ups).clear();
        self.write_line("----");
        self.write_line(notice);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Clear,
    Export,
    Quit,
    /// A number picking one of the last reply's follow-ups.
    FollowUp(usize),
    Say(String),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "/open" => Self::Open,
            "/close" => Self::Close,
            "/clear" => Self::Clear,
            "/export" => Self::Export,
            "/quit" | "/exit" => Self::Quit,
            _ if line.starts_with('/') => Self::Unknown(line.to_string()),
            _ => match line.parse::<usize>() {
                Ok(n) => Self::FollowUp(n),
                Err(_) => Self::Say(line.to_string()),
            },
        }
    }
}

pub const HELP: &str = "Commands: /open /close /clear /export /quit. Type a number to pick a suggestion.";
