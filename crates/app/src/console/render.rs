use threadline_chat::{ChatEvent, Message, Sender, SessionSummary};

pub const DEFAULT_VIEW_WIDTH: usize = 72;

/// Turns controller events into plain-text bubbles.
///
/// User bubbles hug the right edge, AI bubbles the left. A bubble never takes
/// more than two thirds of the view width.
#[derive(Debug, Clone, Copy)]
pub struct BubbleRenderer {
    width: usize,
}

impl Default for BubbleRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_WIDTH)
    }
}

impl BubbleRenderer {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(12),
        }
    }

    pub fn render_event(&self, event: &ChatEvent) -> Vec<String> {
        match event {
            ChatEvent::SessionCreated { index, id } => {
                vec![format!("+ session #{index} \"{id}\" created")]
            }
            ChatEvent::LoadStarted { index } => {
                vec![self.rule(&format!("session #{index}")), "  loading...".to_string()]
            }
            ChatEvent::LoadFinished { messages, .. } => {
                if messages.is_empty() {
                    return vec!["  (no messages yet)".to_string()];
                }
                messages
                    .iter()
                    .flat_map(|message| self.render_message(message))
                    .collect()
            }
            ChatEvent::MessageAdded { message, .. } => self.render_message(message),
        }
    }

    pub fn render_message(&self, message: &Message) -> Vec<String> {
        let max_line = self.width * 2 / 3;
        let lines = wrap(message.text(), max_line);
        let bubble_width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        let mut rendered = Vec::with_capacity(lines.len() + 1);
        match message.sender() {
            Sender::User => {
                rendered.push(format!("{:>width$}", "you", width = self.width));
                for line in lines {
                    let padded = format!("{line:<bubble_width$}");
                    rendered.push(format!("{padded:>width$}", width = self.width));
                }
            }
            Sender::Ai => {
                rendered.push("ai".to_string());
                rendered.extend(lines);
            }
        }
        rendered
    }

    pub fn render_sessions(&self, rows: &[SessionSummary]) -> Vec<String> {
        if rows.is_empty() {
            return vec!["  no sessions, create one with /new <id>".to_string()];
        }

        rows.iter()
            .map(|row| {
                let marker = if row.active { '*' } else { ' ' };
                format!(
                    "{marker} {:>2}  {}  ({} messages)",
                    row.index, row.id, row.message_count
                )
            })
            .collect()
    }

    fn rule(&self, title: &str) -> String {
        let title = format!("-- {title} ");
        let fill = self.width.saturating_sub(title.chars().count());
        format!("{title}{}", "-".repeat(fill))
    }
}

/// Greedy word wrap on character counts. Explicit newlines are kept and words
/// longer than `max` are split.
fn wrap(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > max {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width_and_newlines() {
        assert_eq!(wrap("one two three", 7), ["one two", "three"]);
        assert_eq!(wrap("a\nb", 10), ["a", "b"]);
        assert_eq!(wrap("abcdefghij", 4), ["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 4), [""]);
    }

    #[test]
    fn user_bubbles_align_right_and_ai_left() {
        let renderer = BubbleRenderer::new(30);

        let user = renderer.render_message(&Message::user("hi"));
        assert_eq!(user[0].chars().count(), 30);
        assert!(user[0].ends_with("you"));
        assert!(user[1].ends_with("hi"));
        assert!(user[1].starts_with(' '));

        let ai = renderer.render_message(&Message::ai("Echo: hi"));
        assert_eq!(ai, ["ai", "Echo: hi"]);
    }

    #[test]
    fn load_events_show_indicator_then_history() {
        let renderer = BubbleRenderer::new(40);

        let started = renderer.render_event(&ChatEvent::LoadStarted { index: 1 });
        assert!(started[0].starts_with("-- session #1 "));
        assert_eq!(started[0].chars().count(), 40);
        assert_eq!(started[1], "  loading...");

        let empty = renderer.render_event(&ChatEvent::LoadFinished {
            index: 1,
            messages: Vec::new(),
        });
        assert_eq!(empty, ["  (no messages yet)"]);

        let full = renderer.render_event(&ChatEvent::LoadFinished {
            index: 1,
            messages: vec![Message::user("q"), Message::ai("a")],
        });
        assert_eq!(full.len(), 4);
        assert_eq!(full[3], "a");
    }

    #[test]
    fn session_rows_mark_active() {
        let renderer = BubbleRenderer::default();
        let rows = renderer.render_sessions(&[
            SessionSummary {
                index: 0,
                id: "General".to_string(),
                message_count: 2,
                active: true,
            },
            SessionSummary {
                index: 1,
                id: "Scratch".to_string(),
                message_count: 0,
                active: false,
            },
        ]);
        assert_eq!(rows[0], "*  0  General  (2 messages)");
        assert_eq!(rows[1], "   1  Scratch  (0 messages)");
    }
}
