//! Viewer runtime: owns the terminal and runs the event loop.
//!
//! The loop is synchronous. Navigations run as tokio tasks and report back
//! through an inbox channel the loop drains every frame. Highlight repaints
//! happen in the engine's own tasks; the loop notices them by comparing a
//! [`Snapshot`] of what was last drawn.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tfind_engine::config::paths;
use tfind_engine::controller::FindStatus;
use tfind_engine::logging::{self, Verbosity};
use tfind_engine::transcript::load;
use tfind_engine::{
    Config, Direction, FindController, FindCoordinator, FindPanel, FindTarget, PanelId,
    RenderSurface, Transcript, VisibleWindow,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, info, warn};

use crate::cell::CellOptions;
use crate::find_bar::{FindAction, FindBar};
use crate::render::{self, BarInfo};
use crate::surface::ViewSurface;
use crate::terminal::Screen;
use crate::view::TranscriptView;

/// Poll interval while a navigation is in flight.
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll interval when nothing is pending.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

const PANEL: &str = "transcript";

pub struct ViewerOptions {
    /// File the transcript was loaded from; re-read when following.
    pub path: PathBuf,
    pub transcript: Transcript,
    pub config: Config,
    /// Search to run as soon as the viewer opens.
    pub initial_term: Option<String>,
    /// Pick up events appended to the file.
    pub follow: bool,
    pub verbosity: Verbosity,
}

/// Opens the full-screen viewer and blocks until the user quits.
///
/// Must run on a multi-threaded runtime: the event loop blocks its worker
/// while navigations run on the others.
pub async fn run_viewer(options: ViewerOptions) -> Result<()> {
    if !io::stdout().is_terminal() || !io::stdin().is_terminal() {
        bail!("The viewer needs a terminal. Use `tfind count` or `tfind locate` instead.");
    }
    let _log_guard = logging::init_file(
        &paths::log_dir()?,
        options.verbosity,
        &options.config.log.level,
    )?;
    info!(path = %options.path.display(), "viewer starting");

    let handle = Handle::current();
    task::block_in_place(move || Viewer::new(options, handle).run())
}

/// Results sent back to the loop by spawned tasks.
#[derive(Debug)]
enum InboxEvent {
    Navigated { found: bool },
}

/// What the last frame showed. A difference means redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    status: FindStatus,
    window: VisibleWindow,
    layout: u64,
    highlights: u64,
    following: bool,
}

struct Viewer {
    path: PathBuf,
    transcript: Transcript,
    surface: Arc<ViewSurface>,
    controller: Arc<FindController>,
    find: FindBar,
    initial_term: Option<String>,
    follow_file: bool,
    follow_poll: Duration,
    next_follow_poll: Instant,
    handle: Handle,
    inbox_tx: mpsc::UnboundedSender<InboxEvent>,
    inbox_rx: mpsc::UnboundedReceiver<InboxEvent>,
    navigations: usize,
    notice: Option<String>,
    should_quit: bool,
}

impl Viewer {
    fn new(options: ViewerOptions, handle: Handle) -> Self {
        let ViewerOptions {
            path,
            transcript,
            config,
            initial_term,
            follow,
            ..
        } = options;

        let view = TranscriptView::new(transcript.clone(), CellOptions::from(&config.view));
        let surface = ViewSurface::new(view);
        let panel = FindPanel::new(
            PanelId::new(PANEL),
            transcript.clone(),
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            &config.find,
        );
        let coordinator = FindCoordinator::new();
        coordinator.register(PanelId::new(PANEL), panel as Arc<dyn FindTarget>);
        let controller = Arc::new(FindController::new(
            coordinator,
            PanelId::new(PANEL),
            &config.find,
        ));
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Self {
            path,
            transcript,
            surface,
            controller,
            find: FindBar::default(),
            initial_term,
            follow_file: follow,
            follow_poll: config.view.follow_poll(),
            next_follow_poll: Instant::now() + config.view.follow_poll(),
            handle,
            inbox_tx,
            inbox_rx,
            navigations: 0,
            notice: None,
            should_quit: false,
        }
    }

    fn run(mut self) -> Result<()> {
        let mut screen = Screen::enter()?;
        let size = screen.terminal().size()?;
        self.resize(size.width, size.height);

        if let Some(term) = self.initial_term.take().filter(|term| !term.is_empty()) {
            self.find.set_query(&term);
            self.navigate(Direction::Forward);
        }

        let mut drawn: Option<Snapshot> = None;
        while !self.should_quit {
            let snapshot = self.snapshot();
            if drawn.as_ref() != Some(&snapshot) {
                let info = BarInfo {
                    notice: self.notice.as_deref(),
                };
                screen.terminal().draw(|frame| {
                    render::render(frame, &self.surface, &self.find, &snapshot.status, &info);
                })?;
                drawn = Some(snapshot);
            }

            if event::poll(self.poll_timeout())? {
                loop {
                    if self.handle_terminal_event(event::read()?) {
                        drawn = None;
                    }
                    if self.should_quit || !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }

            let now = Instant::now();
            if let Some(total) = self.controller.poll(now) {
                debug!(total, "search committed");
            }
            while let Ok(event) = self.inbox_rx.try_recv() {
                self.handle_inbox(event);
                drawn = None;
            }
            if self.follow_file && now >= self.next_follow_poll {
                self.next_follow_poll = now + self.follow_poll;
                self.reload();
            }
        }

        self.controller.clear();
        info!("viewer closed");
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        let status = self.controller.status();
        let view = self.surface.view();
        Snapshot {
            status,
            window: view.visible_window(),
            layout: view.layout_generation(),
            highlights: view.highlight_revision(),
            following: view.is_following(),
        }
    }

    /// Sleeps no longer than the next debounce commit or file poll.
    fn poll_timeout(&self) -> Duration {
        let base = if self.navigations > 0 {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };
        let now = Instant::now();
        let mut timeout = base;
        if let Some(deadline) = self.controller.poll_deadline() {
            timeout = timeout.min(deadline.saturating_duration_since(now));
        }
        if self.follow_file {
            timeout = timeout.min(self.next_follow_poll.saturating_duration_since(now));
        }
        timeout
    }

    fn resize(&self, width: u16, height: u16) {
        let height = render::viewport_height(height);
        self.surface
            .update(|view| view.resize(usize::from(width), height));
    }

    /// Returns whether the frame must be redrawn even if nothing the
    /// snapshot tracks changed.
    fn handle_terminal_event(&mut self, event: TermEvent) -> bool {
        match event {
            TermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                self.notice = None;
                if self.find.is_open() {
                    self.handle_find_key(key);
                } else {
                    self.handle_key(key);
                }
                true
            }
            TermEvent::Resize(width, height) => {
                self.resize(width, height);
                true
            }
            _ => false,
        }
    }

    fn handle_find_key(&mut self, key: KeyEvent) {
        match self.find.handle_key(key) {
            FindAction::None | FindAction::Close => {}
            FindAction::Changed(term) => self.controller.input(&term, Instant::now()),
            FindAction::Next => self.navigate(Direction::Forward),
            FindAction::Previous => self.navigate(Direction::Backward),
            FindAction::Cancel => self.controller.clear(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('f') if ctrl => self.find.open(),
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.controller.status().term.is_some() {
                    self.find.set_query("");
                    self.controller.clear();
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('/') => self.find.open(),
            KeyCode::Char('n') => self.navigate(Direction::Forward),
            KeyCode::Char('N') => self.navigate(Direction::Backward),
            KeyCode::Char('j') | KeyCode::Down => self.surface.update(|view| view.scroll_down(1)),
            KeyCode::Char('k') | KeyCode::Up => self.surface.update(|view| view.scroll_up(1)),
            KeyCode::PageDown | KeyCode::Char(' ') => self.surface.update(TranscriptView::page_down),
            KeyCode::PageUp => self.surface.update(TranscriptView::page_up),
            KeyCode::Char('g') | KeyCode::Home => self.surface.update(TranscriptView::to_top),
            KeyCode::Char('G') | KeyCode::End => {
                self.surface.update(|view| view.set_following(true));
            }
            KeyCode::Char('e') => {
                self.surface.update(|view| {
                    let expand = !view.expand_tool_args();
                    view.set_expand_tool_args(expand);
                });
            }
            KeyCode::Char('f') => {
                self.follow_file = !self.follow_file;
                self.next_follow_poll = Instant::now();
                info!(follow = self.follow_file, "file follow toggled");
            }
            _ => {}
        }
    }

    /// Starts a navigation for the find bar's query.
    fn navigate(&mut self, direction: Direction) {
        let term = self.find.query().to_string();
        if term.is_empty() {
            return;
        }
        let controller = Arc::clone(&self.controller);
        let inbox = self.inbox_tx.clone();
        self.navigations += 1;
        self.handle.spawn(async move {
            let found = match direction {
                Direction::Forward => controller.go_to_next(&term).await,
                Direction::Backward => controller.go_to_previous(&term).await,
            };
            let _ = inbox.send(InboxEvent::Navigated { found });
        });
    }

    fn handle_inbox(&mut self, event: InboxEvent) {
        match event {
            InboxEvent::Navigated { found } => {
                self.navigations = self.navigations.saturating_sub(1);
                let status = self.controller.status();
                if !found && status.total > 0 && self.navigations == 0 {
                    self.notice = Some("match could not be shown".to_string());
                }
            }
        }
    }

    /// Re-reads the file and applies what changed. A shorter file than
    /// before means it was rewritten, so the transcript starts over.
    fn reload(&mut self) {
        let events = match load::read_events(&self.path) {
            Ok(events) => events,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "transcript reload failed");
                return;
            }
        };
        let consumed = self.transcript.source_position();
        if events.len() == consumed {
            return;
        }
        if events.len() < consumed {
            info!(events = events.len(), consumed, "transcript shrank, reloading");
            self.transcript.reset();
            self.transcript.append_events(events);
        } else {
            let added = self.transcript.append_events(events.into_iter().skip(consumed));
            debug!(added, "transcript grew");
        }
        self.surface.update(TranscriptView::sync);
        self.controller.recount();
    }
}
