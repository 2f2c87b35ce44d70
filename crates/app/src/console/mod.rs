pub mod command;
pub mod render;

use std::io::{self, Write};
use std::sync::Arc;

use threadline_chat::{ChatEvent, ChatHandle, EventStream, LoadState};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::settings::SettingsStore;

pub use command::{ConsoleCommand, HELP_TEXT, parse};
pub use render::{BubbleRenderer, DEFAULT_VIEW_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Terminal view: forwards line commands to the controller and prints its events.
pub struct Console<W> {
    handle: ChatHandle,
    renderer: BubbleRenderer,
    settings: Option<SettingsStore>,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(handle: ChatHandle, renderer: BubbleRenderer, out: W) -> Self {
        Self {
            handle,
            renderer,
            settings: None,
            out,
        }
    }

    /// Enables `/reload` against `settings`.
    pub fn with_settings(mut self, settings: SettingsStore) -> Self {
        self.settings = Some(settings);
        self
    }

    pub async fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let result = match parse(line) {
            ConsoleCommand::Quit => return Ok(Flow::Quit),
            ConsoleCommand::Help => {
                writeln!(self.out, "{HELP_TEXT}")?;
                Ok(())
            }
            ConsoleCommand::Invalid(hint) => {
                writeln!(self.out, "  {hint}")?;
                Ok(())
            }
            ConsoleCommand::List => match self.handle.sessions().await {
                Ok(rows) => {
                    let lines = self.renderer.render_sessions(&rows);
                    self.write_lines(&lines)?;
                    Ok(())
                }
                Err(error) => Err(error),
            },
            ConsoleCommand::Reload => {
                self.reload_settings().await?;
                Ok(())
            }
            ConsoleCommand::New(id) => self.handle.create_session(id).await.map(|_| ()),
            ConsoleCommand::Select(index) => self.handle.select_session(index).await,
            ConsoleCommand::Submit(text) => self.handle.submit_message(text).await,
        };

        if let Err(error) = result {
            tracing::debug!(%error, "console command failed");
            writeln!(self.out, "  error: {error}")?;
        }
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    pub fn show_event(&mut self, event: &ChatEvent) -> io::Result<()> {
        let lines = self.renderer.render_event(event);
        self.write_lines(&lines)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    async fn reload_settings(&mut self) -> io::Result<()> {
        let Some(store) = &self.settings else {
            return writeln!(self.out, "  settings reload is not available");
        };

        match store.reload() {
            Ok(settings) => {
                let reconfigured = self
                    .handle
                    .reconfigure(
                        settings.controller_config(),
                        Arc::new(settings.reply_generator()),
                    )
                    .await;
                match reconfigured {
                    Ok(()) => writeln!(self.out, "  settings reloaded"),
                    Err(error) => writeln!(self.out, "  error: {error}"),
                }
            }
            Err(error) => {
                tracing::warn!(%error, "settings reload failed");
                writeln!(self.out, "  error: {error}")
            }
        }
    }

    /// Prints events until no session load is pending, then whatever is queued.
    async fn finish_pending_load(&mut self, events: &mut EventStream) -> io::Result<()> {
        while let Ok(LoadState::Loading(_)) = self.handle.load_state().await {
            let Some(event) = events.recv().await else {
                return Ok(());
            };
            self.show_event(&event)?;
        }
        while let Some(event) = events.try_recv() {
            self.show_event(&event)?;
        }
        Ok(())
    }

    fn write_lines(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    /// Runs until `/quit`, end of input, or the controller stopping.
    ///
    /// At end of input a load still in flight is waited for and rendered.
    pub async fn run<R>(mut self, input: R, mut events: EventStream) -> io::Result<W>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        writeln!(self.out, "type /help for commands")?;
        self.out.flush()?;

        loop {
            tokio::select! {
                biased;

                event = events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    self.show_event(&event)?;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        self.finish_pending_load(&mut events).await?;
                        break;
                    };
                    if self.handle_line(&line).await? == Flow::Quit {
                        break;
                    }
                }
            }
        }

        self.handle.shutdown();
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use threadline_chat::{ChatRuntime, ControllerConfig, EchoResponder, SessionStore};

    use super::*;

    fn spawn(ids: &[&str]) -> (Console<Vec<u8>>, EventStream) {
        let store = SessionStore::with_sessions(ids.iter().copied()).unwrap();
        let (handle, events) = ChatRuntime::spawn(
            store,
            ControllerConfig::default().with_load_delay(Duration::from_millis(50)),
            Arc::new(EchoResponder::new()),
        );
        (
            Console::new(handle, BubbleRenderer::new(40), Vec::new()),
            events,
        )
    }

    fn output(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn controller_errors_are_printed_not_fatal() {
        let (mut console, _events) = spawn(&["A"]);

        assert_eq!(console.handle_line("hello").await.unwrap(), Flow::Continue);
        assert_eq!(console.handle_line("/select 4").await.unwrap(), Flow::Continue);
        assert_eq!(console.handle_line("/new A").await.unwrap(), Flow::Continue);

        let text = output(console);
        assert!(text.contains("error: no session is active"));
        assert!(text.contains("error: session index 4 is out of range"));
        assert!(text.contains("error: session id 'A' already exists"));
    }

    #[tokio::test(start_paused = true)]
    async fn quit_stops_the_loop() {
        let (mut console, _events) = spawn(&["A"]);
        assert_eq!(console.handle_line("/quit").await.unwrap(), Flow::Quit);
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_session_renders_bubbles() {
        let (console, events) = spawn(&["A", "B"]);
        let script: &[u8] = b"/select 1\nhello\n";

        let out = console.run(script, events).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(text.contains("-- session #1"));
        assert!(text.contains("loading..."));
        let user = lines
            .iter()
            .position(|line| line.trim() == "hello")
            .unwrap();
        assert_eq!(lines[user - 1], format!("{:>40}", "you"));
        assert_eq!(lines[user], format!("{:>40}", "hello"));
        assert_eq!(lines[user + 1], "ai");
        assert_eq!(lines[user + 2], "Echo: hello");
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_input_waits_for_pending_load() {
        let (console, events) = spawn(&["A"]);
        let script: &[u8] = b"/select 0\nhello\n";

        let out = console.run(script, events).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        // once live, once in the finished history
        assert_eq!(text.matches("Echo: hello").count(), 2);
        assert!(text.find("loading...") < text.rfind("Echo: hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_session_history_is_rendered_after_end_of_input() {
        let (console, events) = spawn(&["A"]);
        let script: &[u8] = b"/select 0\n";

        let out = console.run(script, events).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("(no messages yet)"));
    }

    #[tokio::test(start_paused = true)]
    async fn reload_applies_new_reply_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "reply_prefix": "one: " }"#).unwrap();

        let (console, mut events) = spawn(&["A"]);
        let mut console = console.with_settings(SettingsStore::new(path.clone()));
        console.handle_line("/s 0").await.unwrap();
        std::fs::write(&path, r#"{ "reply_prefix": "two: " }"#).unwrap();
        console.handle_line("/reload").await.unwrap();
        console.handle_line("hi").await.unwrap();
        while let Some(event) = events.try_recv() {
            console.show_event(&event).unwrap();
        }

        let text = output(console);
        assert!(text.contains("settings reloaded"));
        assert!(text.contains("two: hi"));
    }

    #[tokio::test(start_paused = true)]
    async fn reload_without_settings_is_reported() {
        let (mut console, _events) = spawn(&["A"]);
        console.handle_line("/reload").await.unwrap();
        assert!(output(console).contains("settings reload is not available"));
    }

    #[tokio::test(start_paused = true)]
    async fn list_shows_sessions_with_active_marker() {
        let (mut console, mut events) = spawn(&["A", "B"]);

        console.handle_line("/s 1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        console.handle_line("ping").await.unwrap();
        while let Some(event) = events.try_recv() {
            console.show_event(&event).unwrap();
        }
        console.handle_line("/list").await.unwrap();

        let text = output(console);
        assert!(text.contains("  (no messages yet)"));
        assert!(text.contains("Echo: ping"));
        assert!(text.contains("*  1  B  (2 messages)"));
        assert!(text.contains("   0  A  (0 messages)"));
    }
}
