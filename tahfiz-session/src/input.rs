//! Keyboard input loop
//!
//! A single dispatcher owns every key binding; no stage-specific key
//! handling exists anywhere else. Keys are routed by consulting the typing
//! handle: while a dictation is active, printable keys, Backspace, Enter,
//! and Esc belong to it; otherwise Space is the one advance key and q (or
//! Ctrl+C) quits.
//!
//! The loop polls crossterm on a blocking thread (`spawn_blocking`) and
//! feeds the engine's command channel; it never touches session state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::events::EngineCommand;
use crate::speech::TypingHandle;

/// Restores the terminal on drop, whatever way the loop exits
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> std::io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

/// Spawn the keyboard loop; it runs until `shutdown` is set or quit is sent
pub fn spawn_input_loop(
    commands: UnboundedSender<EngineCommand>,
    typing: TypingHandle,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let _guard = match RawModeGuard::enable() {
            Ok(guard) => guard,
            Err(e) => {
                warn!(error = %e, "cannot enable raw terminal mode, keyboard input disabled");
                return;
            }
        };

        while !shutdown.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(50)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(error = %e, "keyboard poll failed");
                    break;
                }
            }
            let key = match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => key,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "keyboard read failed");
                    break;
                }
            };

            if is_quit(&key) {
                let _ = commands.send(EngineCommand::Quit);
                break;
            }

            if typing.is_active() {
                dispatch_typing(&typing, &key);
            } else {
                match key.code {
                    KeyCode::Char(' ') => {
                        if commands.send(EngineCommand::AdvanceKey).is_err() {
                            break;
                        }
                    }
                    KeyCode::Char('q') => {
                        let _ = commands.send(EngineCommand::Quit);
                        break;
                    }
                    _ => debug!(?key, "key ignored"),
                }
            }
        }
    })
}

/// Ctrl+C quits even while a dictation is consuming letters; q only quits
/// from the control branch below
fn is_quit(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Route a key into the active dictation
fn dispatch_typing(typing: &TypingHandle, key: &KeyEvent) {
    match key.code {
        KeyCode::Enter => typing.submit(),
        KeyCode::Esc => typing.cancel(),
        KeyCode::Backspace => typing.backspace(),
        KeyCode::Char(c)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            typing.push_char(c)
        }
        _ => {}
    }
}
