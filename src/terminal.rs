// SPDX-License-Identifier: GPL-3.0-only

//! Terminal camera menu
//!
//! Lists the cameras with a check mark on the selected one while the
//! preview window shows the live, mirrored image. The menu only talks to
//! the session actor through its handle.

use crate::app::{
    self, SessionActor, SessionEvent, SessionHandle, SessionSnapshot, SessionState,
};
use crate::backends::camera::CaptureSession;
use crate::config::Config;
use crate::constants::timing;
use crate::errors::{AppError, AppResult};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

/// Run the camera menu until the user quits
pub fn run(config: &Config) -> AppResult<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let (actor, handle) = app::build_session(config)?;

    supervise(&rt, actor, &handle, |actor_finished| {
        let mut terminal = setup_terminal()?;
        let result = run_menu(&mut terminal, &handle, actor_finished);
        let restored = restore_terminal(&mut terminal);
        result.and(restored)
    })
}

/// Run `menu` next to the session actor
///
/// The actor is shut down and joined however the menu ends, so the camera
/// is released before any error is reported.
fn supervise<S: CaptureSession + 'static>(
    rt: &tokio::runtime::Runtime,
    actor: SessionActor<S>,
    handle: &SessionHandle,
    menu: impl FnOnce(&dyn Fn() -> bool) -> AppResult<()>,
) -> AppResult<()> {
    let actor_task = rt.spawn(actor.run());

    let result = menu(&|| actor_task.is_finished());

    // Fails only when the actor already ended
    let _ = handle.shutdown();
    let session = rt
        .block_on(actor_task)
        .map_err(|e| AppError::Other(format!("Session task failed: {}", e)))?;

    result.and(session)
}

fn setup_terminal() -> AppResult<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let terminal = execute!(stdout(), EnterAlternateScreen)
        .and_then(|_| Terminal::new(CrosstermBackend::new(stdout())));
    terminal.map_err(|e| {
        // Leave the shell usable
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen);
        e.into()
    })
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> AppResult<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_menu(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    handle: &SessionHandle,
    actor_finished: &dyn Fn() -> bool,
) -> AppResult<()> {
    let mut events = handle.subscribe();
    let mut menu = Menu::default();

    while !actor_finished() {
        menu.drain_events(&mut events);
        let snapshot = handle.snapshot();
        menu.sync(&snapshot);

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let list_area = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };
            f.render_widget(
                CameraList {
                    snapshot: &snapshot,
                    cursor: menu.cursor,
                },
                list_area,
            );

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            let message = status_message(&snapshot, menu.last_error.as_deref());
            f.render_widget(StatusBar { message: &message }, status_area);
        })?;

        // Handle input with timeout so session changes show up
        if event::poll(timing::MENU_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match menu.handle_key(key, &snapshot) {
                Some(MenuRequest::Quit) => {
                    info!("Quitting camera menu");
                    break;
                }
                Some(request) => request.send(handle)?,
                None => {}
            }
        }
    }

    Ok(())
}

/// What a key press asks the session for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuRequest {
    Select(usize),
    Refresh,
    Stop,
    Prepare,
    Quit,
}

impl MenuRequest {
    fn send(self, handle: &SessionHandle) -> AppResult<()> {
        match self {
            MenuRequest::Select(index) => handle.select(index),
            MenuRequest::Refresh => handle.refresh(),
            MenuRequest::Stop => handle.stop(),
            MenuRequest::Prepare => handle.prepare(),
            MenuRequest::Quit => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct Menu {
    cursor: usize,
    last_error: Option<String>,
    selected: Option<usize>,
}

impl Menu {
    /// Follow the committed selection and keep the cursor on the list
    fn sync(&mut self, snapshot: &SessionSnapshot) {
        if snapshot.selected_index != self.selected {
            self.selected = snapshot.selected_index;
            if let Some(index) = self.selected {
                self.cursor = index;
            }
        }
        self.cursor = self
            .cursor
            .min(snapshot.device_names.len().saturating_sub(1));
    }

    fn drain_events(&mut self, events: &mut broadcast::Receiver<SessionEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Camera menu fell behind session events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::DeviceUnavailable(e) => self.last_error = Some(e.to_string()),
            SessionEvent::StateChanged(SessionState::Running(_)) => self.last_error = None,
            SessionEvent::PermissionChanged { granted: false } => {
                self.last_error = Some("Camera access denied".to_string());
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, snapshot: &SessionSnapshot) -> Option<MenuRequest> {
        let count = snapshot.device_names.len();

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(MenuRequest::Quit)
            }
            KeyCode::Char('q') | KeyCode::Esc => Some(MenuRequest::Quit),
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                if self.cursor + 1 < count {
                    self.cursor += 1;
                }
                None
            }
            KeyCode::Enter if count > 0 => Some(MenuRequest::Select(self.cursor)),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                (index < count).then(|| {
                    self.cursor = index;
                    MenuRequest::Select(index)
                })
            }
            KeyCode::Char('r') => Some(MenuRequest::Refresh),
            KeyCode::Char('s') if snapshot.state.is_running() => Some(MenuRequest::Stop),
            KeyCode::Char('s') if snapshot.current_device.is_some() => Some(MenuRequest::Prepare),
            _ => None,
        }
    }
}

fn status_message(snapshot: &SessionSnapshot, last_error: Option<&str>) -> String {
    let mut msg = match snapshot.state.device() {
        Some(device) => format!("{}: {}", snapshot.state.label(), device.name),
        None => snapshot.state.label().to_string(),
    };
    if let Some(error) = last_error {
        msg.push_str(" | ");
        msg.push_str(error);
    }
    msg.push_str(" | ↑↓/1-9 select | 's' stop/start | 'r' rescan | 'q' quit");
    msg
}

/// Camera names with the selected one checked
struct CameraList<'a> {
    snapshot: &'a SessionSnapshot,
    cursor: usize,
}

impl Widget for CameraList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let title = if self.snapshot.permission_granted {
            "Cameras"
        } else {
            "Cameras (no camera access)"
        };
        buf.set_string(
            area.x,
            area.y,
            title,
            Style::default().add_modifier(Modifier::BOLD),
        );

        if self.snapshot.device_names.is_empty() {
            if area.height > 2 {
                buf.set_string(
                    area.x + 2,
                    area.y + 2,
                    "No cameras found, press 'r' to rescan",
                    Style::default(),
                );
            }
            return;
        }

        let rows = area.height.saturating_sub(2) as usize;
        for (index, name) in self.snapshot.device_names.iter().enumerate().take(rows) {
            let mark = if self.snapshot.selected_index == Some(index) {
                '✓'
            } else {
                ' '
            };
            let line = format!("{} {}. {}", mark, index + 1, name);

            let style = if index == self.cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            buf.set_stringn(
                area.x + 2,
                area.y + 2 + index as u16,
                line,
                area.width.saturating_sub(2) as usize,
                style,
            );
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_stringn(area.x, area.y, self.message, area.width as usize, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{CaptureSessionController, PermissionGate};
    use crate::backends::camera::{BackendResult, CameraDevice, DeviceEnumerator};
    use crate::backends::permission::{AccessRequest, PermissionService, PermissionStatus};
    use crate::constants::SessionPreset;
    use crate::errors::{AuthorizationError, DeviceUnavailableError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct OneCamera;

    impl DeviceEnumerator for OneCamera {
        fn enumerate(&self) -> BackendResult<Vec<CameraDevice>> {
            Ok(vec![CameraDevice::new("a", "A", "/dev/video0")])
        }
    }

    /// Session that only tracks whether a camera is attached
    #[derive(Default)]
    struct FlagSession {
        attached: Arc<AtomicBool>,
        bound_once: Arc<AtomicBool>,
        running: bool,
    }

    impl CaptureSession for FlagSession {
        type Input = ();

        fn create_input(&mut self, _device: &CameraDevice) -> BackendResult<()> {
            Ok(())
        }

        fn can_add_input(&self, _input: &()) -> bool {
            !self.attached.load(Ordering::SeqCst)
        }

        fn add_input(&mut self, _input: ()) -> BackendResult<()> {
            self.attached.store(true, Ordering::SeqCst);
            self.bound_once.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn remove_input(&mut self) -> bool {
            self.running = false;
            self.attached.swap(false, Ordering::SeqCst)
        }

        fn set_preset(&mut self, _preset: SessionPreset) {}

        fn start_running(&mut self) -> BackendResult<()> {
            self.running = true;
            Ok(())
        }

        fn stop_running(&mut self) {
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    struct AlwaysGranted;

    impl PermissionService for AlwaysGranted {
        fn status(&self) -> Result<PermissionStatus, AuthorizationError> {
            Ok(PermissionStatus::Granted)
        }

        fn request_access(&self) -> AccessRequest {
            Box::pin(futures::future::ready(Ok(true)))
        }
    }

    fn snapshot(names: &[&str], selected: Option<usize>, state: SessionState) -> SessionSnapshot {
        SessionSnapshot {
            current_device: selected.map(|i| CameraDevice::new(names[i], names[i], "/dev/video0")),
            selected_index: selected,
            device_names: names.iter().map(|n| n.to_string()).collect(),
            state,
            permission_granted: true,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cursor_moves_within_list() {
        let snap = snapshot(&["A", "B"], Some(0), SessionState::Idle);
        let mut menu = Menu::default();
        menu.sync(&snap);

        assert_eq!(menu.handle_key(key(KeyCode::Down), &snap), None);
        assert_eq!(menu.cursor, 1);
        menu.handle_key(key(KeyCode::Down), &snap);
        assert_eq!(menu.cursor, 1);
        assert_eq!(
            menu.handle_key(key(KeyCode::Enter), &snap),
            Some(MenuRequest::Select(1))
        );
        menu.handle_key(key(KeyCode::Up), &snap);
        menu.handle_key(key(KeyCode::Up), &snap);
        assert_eq!(menu.cursor, 0);
    }

    #[test]
    fn test_digit_selects_only_existing_cameras() {
        let snap = snapshot(&["A", "B"], Some(0), SessionState::Idle);
        let mut menu = Menu::default();

        assert_eq!(
            menu.handle_key(key(KeyCode::Char('2')), &snap),
            Some(MenuRequest::Select(1))
        );
        assert_eq!(menu.handle_key(key(KeyCode::Char('3')), &snap), None);
    }

    #[test]
    fn test_toggle_follows_session_state() {
        let device = CameraDevice::new("A", "A", "/dev/video0");
        let mut menu = Menu::default();

        let running = snapshot(&["A"], Some(0), SessionState::Running(device.clone()));
        assert_eq!(
            menu.handle_key(key(KeyCode::Char('s')), &running),
            Some(MenuRequest::Stop)
        );

        let stopped = snapshot(&["A"], Some(0), SessionState::Bound(device));
        assert_eq!(
            menu.handle_key(key(KeyCode::Char('s')), &stopped),
            Some(MenuRequest::Prepare)
        );

        let empty = snapshot(&[], None, SessionState::Idle);
        assert_eq!(menu.handle_key(key(KeyCode::Char('s')), &empty), None);
        assert_eq!(menu.handle_key(key(KeyCode::Enter), &empty), None);
    }

    #[test]
    fn test_quit_keys() {
        let snap = snapshot(&[], None, SessionState::Idle);
        let mut menu = Menu::default();

        assert_eq!(menu.handle_key(key(KeyCode::Esc), &snap), Some(MenuRequest::Quit));
        assert_eq!(
            menu.handle_key(key(KeyCode::Char('q')), &snap),
            Some(MenuRequest::Quit)
        );
        assert_eq!(
            menu.handle_key(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &snap
            ),
            Some(MenuRequest::Quit)
        );
    }

    #[test]
    fn test_error_cleared_once_running() {
        let mut menu = Menu::default();
        menu.apply_event(SessionEvent::DeviceUnavailable(DeviceUnavailableError {
            device: "B".into(),
            reason: "busy".into(),
        }));
        assert!(menu.last_error.as_deref().unwrap().contains("busy"));

        let device = CameraDevice::new("A", "A", "/dev/video0");
        menu.apply_event(SessionEvent::StateChanged(SessionState::Running(device)));
        assert_eq!(menu.last_error, None);
    }

    #[test]
    fn test_list_marks_selected_camera() {
        let snap = snapshot(&["Front", "Back"], Some(1), SessionState::Idle);
        let area = Rect::new(0, 0, 30, 5);
        let mut buf = Buffer::empty(area);

        CameraList {
            snapshot: &snap,
            cursor: 1,
        }
        .render(area, &mut buf);

        let row = |y: u16| {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect::<String>()
        };
        assert!(row(2).starts_with("    1. Front"));
        assert!(row(3).starts_with("  ✓ 2. Back"));
    }

    #[test]
    fn test_failed_menu_still_releases_camera() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let session = FlagSession::default();
        let attached = Arc::clone(&session.attached);
        let bound_once = Arc::clone(&session.bound_once);
        let controller =
            CaptureSessionController::new(session, Box::new(OneCamera), SessionPreset::High);
        let (actor, handle) =
            SessionActor::new(controller, PermissionGate::new(Box::new(AlwaysGranted)));

        let result = supervise(&rt, actor, &handle, |_| {
            Err(AppError::Io("terminal unavailable".into()))
        });

        assert!(matches!(result, Err(AppError::Io(_))));
        assert!(bound_once.load(Ordering::SeqCst));
        assert!(!attached.load(Ordering::SeqCst));
        // The actor is gone
        assert!(handle.shutdown().is_err());
        assert_eq!(handle.snapshot().state, SessionState::Idle);
    }
}
