use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::{self, stdin};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use skimr::config::{Config, ConfigStore, FileConfigStore};
use skimr::emphasis::{emphasize, EmphasizedWord};
use skimr::platform::{Clipboard, SessionHistory, SystemClipboard};
use skimr::runtime::{CrosstermEventSource, Event, Runner};
use skimr::session::{ReadingSession, Tick};
use skimr::share;
use skimr::ui::{self, Focus, View};

const TICK_RATE_MS: u64 = 25;

/// sleek speed-reading tui
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A sleek speed-reading TUI: paste text, set a words-per-minute pace, and read it one flashed word at a time with a focal letter emphasized. The text can be copied out as a shareable link and restored from one."
)]
pub struct Cli {
    /// reading rate in words per minute
    #[clap(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..))]
    wpm: Option<u32>,

    /// text to read
    #[clap(short = 't', long)]
    text: Option<String>,

    /// file to load text from
    #[clap(short = 'f', long)]
    file: Option<PathBuf>,

    /// shareable link to restore text from
    #[clap(short = 'u', long)]
    url: Option<String>,

    /// write debug logs to skimr.log
    #[clap(long)]
    debug: bool,
}

impl Cli {
    /// Resolve the starting text: explicit flag, then file, then the link's
    /// data payload (whose decode failures are logged, never fatal).
    fn initial_text(&self, history: &SessionHistory) -> io::Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return fs::read_to_string(path);
        }
        Ok(share::restore_text(history.location()))
    }
}

/// Outcome of one input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App<C: Clipboard> {
    pub session: ReadingSession,
    pub focus: Focus,
    pub rate_input: String,
    pub flash: Option<EmphasizedWord>,
    pub history: SessionHistory,
    pub clipboard: C,
    pub status: Option<String>,
}

impl<C: Clipboard> App<C> {
    pub fn new(session: ReadingSession, history: SessionHistory, clipboard: C) -> Self {
        let rate_input = session.wpm().to_string();
        Self {
            session,
            focus: Focus::Text,
            rate_input,
            flash: None,
            history,
            clipboard,
            status: None,
        }
    }

    fn view(&self) -> View<'_> {
        View {
            session: &self.session,
            flash: self.flash.as_ref(),
            focus: self.focus,
            rate_input: &self.rate_input,
            rate_valid: self.rate_value().is_some(),
            status: self.status.as_deref(),
        }
    }

    /// Parsed rate field; `None` while it does not hold a positive number.
    fn rate_value(&self) -> Option<u32> {
        match self.rate_input.parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => None,
        }
    }

    /// Keep the session's rate in step with a valid rate field so the
    /// estimated reading time tracks what the user sees.
    fn commit_rate(&mut self) {
        if let Some(wpm) = self.rate_value() {
            self.session.set_wpm(wpm);
        }
    }

    /// Reroll the emphasized letter for the word under the cursor. Called
    /// only when the displayed word changes, so redraws in between do not
    /// make the emphasis flicker.
    fn reroll_flash(&mut self) {
        self.flash = self.session.current_word().map(emphasize);
    }

    fn start(&mut self, now: Instant) {
        let wpm = match self.rate_value() {
            Some(wpm) => wpm,
            None => {
                self.status = Some("set a positive WPM before starting".to_string());
                return;
            }
        };
        self.session.set_wpm(wpm);
        self.session.start(now);
        self.reroll_flash();
        self.status = None;
    }

    fn stop(&mut self) {
        self.session.stop();
        self.flash = None;
    }

    fn save(&mut self) {
        share::save(self.session.text(), &mut self.history, &mut self.clipboard);
        self.status = Some("share link copied to clipboard".to_string());
    }

    fn on_tick(&mut self, now: Instant) {
        match self.session.on_tick(now) {
            Tick::Advanced => self.reroll_flash(),
            Tick::Finished => {
                self.flash = None;
                self.status = Some("finished reading".to_string());
            }
            Tick::Quiet => {}
        }
    }

    fn on_paste(&mut self, data: &str) {
        if self.focus == Focus::Text {
            self.session.push_input(data);
        }
    }
}

fn handle_key<C: Clipboard>(app: &mut App<C>, key: KeyEvent, now: Instant) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return handle_chord(app, key.code, now);
    }

    if app.session.is_playing() {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('s') | KeyCode::Esc => app.stop(),
            KeyCode::Char('f') => app.session.toggle_fullscreen(),
            KeyCode::Char('q') => return Action::Quit,
            _ => {}
        }
        return Action::Continue;
    }

    match key.code {
        KeyCode::Esc => return Action::Quit,
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::Text => Focus::Rate,
                Focus::Rate => Focus::Text,
            };
        }
        KeyCode::Enter => {
            if app.focus == Focus::Text {
                app.session.push_char('\n');
            }
        }
        KeyCode::Backspace => match app.focus {
            Focus::Text => {
                app.session.pop_char();
            }
            Focus::Rate => {
                app.rate_input.pop();
                app.commit_rate();
            }
        },
        KeyCode::Char(c) => match app.focus {
            Focus::Text => {
                app.session.push_char(c);
            }
            Focus::Rate => {
                if c.is_ascii_digit() {
                    app.rate_input.push(c);
                    app.commit_rate();
                }
            }
        },
        _ => {}
    }
    Action::Continue
}

fn handle_chord<C: Clipboard>(app: &mut App<C>, code: KeyCode, now: Instant) -> Action {
    match code {
        KeyCode::Char('c') | KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('r') => {
            if !app.session.is_playing() {
                app.start(now);
            }
        }
        KeyCode::Char('f') => app.session.toggle_fullscreen(),
        KeyCode::Char('s') => {
            // The save chord only fires while the text field holds focus,
            // and the text field is only focusable while idle.
            if !app.session.is_playing() && app.focus == Focus::Text {
                app.save();
            }
        }
        _ => {}
    }
    Action::Continue
}

fn init_logging(debug: bool) {
    if debug {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("skimr.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
                info!(
                    "skimr {} starting (debug mode, logging to skimr.log)",
                    env!("CARGO_PKG_VERSION")
                );
            }
            Err(e) => {
                eprintln!("warning: could not open skimr.log: {}", e);
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }
    } else {
        // Raw-mode terminal: keep stderr quiet unless something is wrong.
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    init_logging(cli.debug);

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = store.load();

    let history = match &cli.url {
        Some(url) => SessionHistory::starting_at(url.clone()),
        None => SessionHistory::new(),
    };

    let text = match cli.initial_text(&history) {
        Ok(text) => text,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, format!("could not load text: {}", e))
                .exit();
        }
    };

    let wpm = cli.wpm.unwrap_or(config.wpm);
    let session = ReadingSession::new(text, wpm);
    let mut app = App::new(session, history, SystemClipboard);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = store.save(&Config {
        wpm: app.session.wpm(),
    }) {
        warn!("could not persist preferences: {}", e);
    }

    result
}

fn run<B: Backend, C: Clipboard>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| ui::draw(f, &app.view()))?;

        match runner.step() {
            Event::Tick => app.on_tick(Instant::now()),
            Event::Resize => {}
            Event::Paste(data) => app.on_paste(&data),
            Event::Key(key) => {
                if handle_key(app, key, Instant::now()) == Action::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skimr::platform::FakeClipboard;

    fn app_with(text: &str, wpm: u32) -> App<FakeClipboard> {
        App::new(
            ReadingSession::new(text.to_string(), wpm),
            SessionHistory::new(),
            FakeClipboard::default(),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["skimr"]);

        assert_eq!(cli.wpm, None);
        assert_eq!(cli.text, None);
        assert_eq!(cli.file, None);
        assert_eq!(cli.url, None);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_wpm() {
        let cli = Cli::parse_from(["skimr", "-r", "300"]);
        assert_eq!(cli.wpm, Some(300));

        let cli = Cli::parse_from(["skimr", "--wpm", "450"]);
        assert_eq!(cli.wpm, Some(450));
    }

    #[test]
    fn test_cli_rejects_zero_wpm() {
        assert!(Cli::try_parse_from(["skimr", "--wpm", "0"]).is_err());
    }

    #[test]
    fn test_cli_text_and_url() {
        let cli = Cli::parse_from(["skimr", "-t", "hello there"]);
        assert_eq!(cli.text.as_deref(), Some("hello there"));

        let cli = Cli::parse_from(["skimr", "-u", "skimr://paste?data=abc"]);
        assert_eq!(cli.url.as_deref(), Some("skimr://paste?data=abc"));
    }

    #[test]
    fn test_initial_text_prefers_explicit_flag() {
        let cli = Cli::parse_from(["skimr", "-t", "explicit"]);
        let history =
            SessionHistory::starting_at(share::share_url("skimr://paste", "from the link"));

        assert_eq!(cli.initial_text(&history).unwrap(), "explicit");
    }

    #[test]
    fn test_initial_text_restores_from_link() {
        let cli = Cli::parse_from(["skimr"]);
        let history =
            SessionHistory::starting_at(share::share_url("skimr://paste", "from the link"));

        assert_eq!(cli.initial_text(&history).unwrap(), "from the link");
    }

    #[test]
    fn test_initial_text_survives_malformed_link() {
        let cli = Cli::parse_from(["skimr"]);
        let history = SessionHistory::starting_at("skimr://paste?data=!!bogus!!".to_string());

        assert_eq!(cli.initial_text(&history).unwrap(), "");
    }

    #[test]
    fn test_initial_text_reports_missing_file() {
        let cli = Cli::parse_from(["skimr", "-f", "/no/such/file.txt"]);
        assert!(cli.initial_text(&SessionHistory::new()).is_err());
    }

    #[test]
    fn test_typing_edits_the_text() {
        let mut app = app_with("", 600);

        let now = Instant::now();
        handle_key(&mut app, key(KeyCode::Char('h')), now);
        handle_key(&mut app, key(KeyCode::Char('i')), now);
        handle_key(&mut app, key(KeyCode::Enter), now);
        handle_key(&mut app, key(KeyCode::Char('!')), now);
        handle_key(&mut app, key(KeyCode::Backspace), now);

        assert_eq!(app.session.text(), "hi\n");
    }

    #[test]
    fn test_tab_switches_focus() {
        let mut app = app_with("", 600);
        assert_eq!(app.focus, Focus::Text);

        handle_key(&mut app, key(KeyCode::Tab), Instant::now());
        assert_eq!(app.focus, Focus::Rate);

        handle_key(&mut app, key(KeyCode::Tab), Instant::now());
        assert_eq!(app.focus, Focus::Text);
    }

    #[test]
    fn test_rate_field_accepts_only_digits() {
        let mut app = app_with("", 600);
        app.focus = Focus::Rate;
        app.rate_input.clear();

        let now = Instant::now();
        handle_key(&mut app, key(KeyCode::Char('3')), now);
        handle_key(&mut app, key(KeyCode::Char('x')), now);
        handle_key(&mut app, key(KeyCode::Char('0')), now);
        handle_key(&mut app, key(KeyCode::Char('0')), now);

        assert_eq!(app.rate_input, "300");
        assert_eq!(app.session.wpm(), 300);
    }

    #[test]
    fn test_start_uses_the_edited_rate() {
        let mut app = app_with("a b c", 600);
        app.focus = Focus::Rate;
        app.rate_input = "120".to_string();

        handle_key(&mut app, ctrl('r'), Instant::now());

        assert!(app.session.is_playing());
        assert_eq!(app.session.wpm(), 120);
        assert_eq!(app.session.position(), 0);
        assert!(app.flash.is_some());
    }

    #[test]
    fn test_start_refused_while_rate_invalid() {
        let mut app = app_with("a b c", 600);
        app.rate_input = String::new();

        handle_key(&mut app, ctrl('r'), Instant::now());

        assert!(!app.session.is_playing());
        assert!(app.status.is_some());
    }

    #[test]
    fn test_empty_rate_field_marks_view_invalid() {
        let mut app = app_with("", 600);
        app.rate_input = String::new();
        assert!(!app.view().rate_valid);

        app.rate_input = "0".to_string();
        assert!(!app.view().rate_valid);

        app.rate_input = "250".to_string();
        assert!(app.view().rate_valid);
    }

    #[test]
    fn test_stop_keys_reset_playback() {
        for code in [KeyCode::Char(' '), KeyCode::Char('s'), KeyCode::Esc] {
            let mut app = app_with("a b c", 600);
            let t0 = Instant::now();
            app.start(t0);
            app.on_tick(t0 + app.session.cadence());
            assert_eq!(app.session.position(), 1);

            handle_key(&mut app, key(code), t0);

            assert!(!app.session.is_playing());
            assert_eq!(app.session.position(), 0);
            assert!(app.flash.is_none());
        }
    }

    #[test]
    fn test_editing_keys_ignored_while_playing() {
        let mut app = app_with("keep this", 600);
        app.start(Instant::now());

        handle_key(&mut app, key(KeyCode::Char('x')), Instant::now());
        handle_key(&mut app, key(KeyCode::Backspace), Instant::now());
        handle_key(&mut app, key(KeyCode::Enter), Instant::now());

        assert_eq!(app.session.text(), "keep this");
        assert!(app.session.is_playing());
    }

    #[test]
    fn test_fullscreen_toggle_in_both_states() {
        let mut app = app_with("a b", 600);

        handle_key(&mut app, ctrl('f'), Instant::now());
        assert!(app.session.fullscreen());

        app.start(Instant::now());
        handle_key(&mut app, key(KeyCode::Char('f')), Instant::now());
        assert!(!app.session.fullscreen());
        assert!(app.session.is_playing());
    }

    #[test]
    fn test_save_chord_requires_text_focus() {
        let mut app = app_with("share me", 600);
        app.focus = Focus::Rate;

        handle_key(&mut app, ctrl('s'), Instant::now());
        assert_eq!(app.clipboard.contents, None);
        assert_eq!(app.history.depth(), 1);

        app.focus = Focus::Text;
        handle_key(&mut app, ctrl('s'), Instant::now());

        assert!(app.clipboard.contents.is_some());
        assert_eq!(app.history.depth(), 2);
        assert_eq!(app.status.as_deref(), Some("share link copied to clipboard"));
        assert_eq!(share::restore_text(app.history.location()), "share me");
    }

    #[test]
    fn test_save_chord_ignored_while_playing() {
        let mut app = app_with("share me", 600);
        app.start(Instant::now());

        handle_key(&mut app, ctrl('s'), Instant::now());

        assert_eq!(app.clipboard.contents, None);
        assert_eq!(app.history.depth(), 1);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with("", 600);
        assert_eq!(
            handle_key(&mut app, key(KeyCode::Esc), Instant::now()),
            Action::Quit
        );
        assert_eq!(
            handle_key(&mut app, ctrl('c'), Instant::now()),
            Action::Quit
        );

        app.start(Instant::now());
        assert_eq!(
            handle_key(&mut app, key(KeyCode::Char('q')), Instant::now()),
            Action::Quit
        );
    }

    #[test]
    fn test_paste_appends_to_text_field_only() {
        let mut app = app_with("start", 600);
        app.on_paste(" pasted");
        assert_eq!(app.session.text(), "start pasted");

        app.focus = Focus::Rate;
        app.on_paste(" nope");
        assert_eq!(app.session.text(), "start pasted");
    }

    #[test]
    fn test_paste_ignored_while_playing() {
        let mut app = app_with("fixed", 600);
        app.start(Instant::now());
        app.on_paste(" extra");
        assert_eq!(app.session.text(), "fixed");
    }

    #[test]
    fn test_flash_rerolls_only_when_the_word_changes() {
        let mut app = app_with("one two three", 600);
        let t0 = Instant::now();
        app.start(t0);
        let first = app.flash.clone().unwrap();
        assert_eq!(first.word(), "one");

        // A quiet tick must not touch the cached emphasis.
        app.on_tick(t0 + Duration::from_millis(10));
        assert_eq!(app.flash.clone().unwrap(), first);

        app.on_tick(t0 + app.session.cadence());
        assert_eq!(app.flash.clone().unwrap().word(), "two");
    }

    #[test]
    fn test_finish_clears_flash_and_reports() {
        let mut app = app_with("solo", 600);
        let t0 = Instant::now();
        app.start(t0);
        assert_eq!(app.flash.clone().unwrap().word(), "solo");

        app.on_tick(t0 + app.session.cadence());

        assert!(!app.session.is_playing());
        assert!(app.flash.is_none());
        assert_eq!(app.status.as_deref(), Some("finished reading"));
        // The deliberate asymmetry: finishing leaves the cursor on the last
        // word, only an explicit stop rewinds it.
        assert_eq!(app.session.position(), 0);
    }

    #[test]
    fn test_start_on_empty_text_is_allowed() {
        let mut app = app_with("", 600);
        let t0 = Instant::now();
        app.start(t0);

        assert!(app.session.is_playing());
        assert!(app.flash.is_none());

        app.on_tick(t0 + app.session.cadence());
        assert!(!app.session.is_playing());
    }
}
