//! Console chat against a local bot.

use anyhow::Result;
use habot_bot::Bot;
use habot_dialog::{Activity, Attachment, Outbound};
use tokio::io::{AsyncBufReadExt, BufReader};

const CONVERSATION_ID: &str = "console";
const DEFAULT_CONTENT_TYPE: &str = "audio/wav";

/// One line of console input.
#[derive(Debug, PartialEq)]
enum Input {
    Quit,
    Send(Activity),
    Usage(&'static str),
}

fn parse_line(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line == "/quit" || line == "/exit" {
        return Some(Input::Quit);
    }
    if let Some(rest) = line.strip_prefix("/attach") {
        let mut parts = rest.split_whitespace();
        let Some(url) = parts.next() else {
            return Some(Input::Usage("usage: /attach <url> [content-type]"));
        };
        let content_type = parts.next().unwrap_or(DEFAULT_CONTENT_TYPE);
        return Some(Input::Send(Activity::attachment(
            CONVERSATION_ID,
            Attachment::new(content_type, url),
        )));
    }
    Some(Input::Send(Activity::message(CONVERSATION_ID, line)))
}

fn render(reply: &Outbound) -> String {
    let mut out = format!("bot> {}", reply.text);
    for (i, action) in reply.suggested_actions.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", i + 1, action));
    }
    out
}

/// Reads lines from stdin until EOF or `/quit`.
pub async fn run(bot: &Bot) -> Result<()> {
    println!("Type a message to start. /attach <url> [content-type] sends a file, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let activity = match parse_line(&line) {
            None => continue,
            Some(Input::Quit) => break,
            Some(Input::Usage(usage)) => {
                println!("{usage}");
                continue;
            }
            Some(Input::Send(activity)) => activity,
        };
        for reply in bot.on_turn(activity).await? {
            println!("{}", render(&reply));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text() {
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("/quit"), Some(Input::Quit));
        assert_eq!(
            parse_line(" hello "),
            Some(Input::Send(Activity::message(CONVERSATION_ID, "hello")))
        );
    }

    #[test]
    fn test_parse_attach() {
        assert_eq!(
            parse_line("/attach https://example.com/a.wav"),
            Some(Input::Send(Activity::attachment(
                CONVERSATION_ID,
                Attachment::new("audio/wav", "https://example.com/a.wav"),
            )))
        );
        assert_eq!(
            parse_line("/attach https://example.com/a.png image/png"),
            Some(Input::Send(Activity::attachment(
                CONVERSATION_ID,
                Attachment::new("image/png", "https://example.com/a.png"),
            )))
        );
        assert!(matches!(parse_line("/attach"), Some(Input::Usage(_))));
    }

    #[test]
    fn test_render_actions() {
        let reply = Outbound::with_actions("Pick", vec!["A".into(), "B".into()]);
        assert_eq!(render(&reply), "bot> Pick\n  1. A\n  2. B");
        assert_eq!(render(&Outbound::text("Hi")), "bot> Hi");
    }
}
