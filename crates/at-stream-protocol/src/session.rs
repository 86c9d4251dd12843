//! Half-duplex AT session over a borrowed transport.
//!
//! A session allows one command in flight at a time:
//!
//! ```text
//! Idle ──execute──▶ AwaitingResponse ──OK/ERROR/FAIL──▶ ResponseReady
//!                        │    ▲                               │
//!                        │    └──────────execute──────────────┘
//!                        └──buffer overflow──▶ Idle
//! ```
//!
//! Nothing here blocks except the `wait_*` helpers, which spin on
//! [`AtSession::is_ready`] and yield between polls. There is no way to cancel
//! an exchange: if the peer never sends a terminal line the session stays in
//! [`SessionState::AwaitingResponse`].

use std::borrow::Cow;
use std::time::{Duration, Instant};

use crate::argument::{serialize_arguments, Argument};
use crate::assembler::{Feed, LineAssembler};
use crate::config::SessionConfig;
use crate::error::{AtError, AtResult, BufferKind, Outcome};
use crate::transport::Transport;

/// Prefix of every outgoing command.
pub const COMMAND_PREFIX: &str = "AT+";

/// Terminator of every outgoing command.
pub const COMMAND_TERMINATOR: &str = "\r\n";

/// Where the session is in the command/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No command sent yet, or the last exchange was aborted.
    Idle,
    /// A command was sent and no terminal line has arrived.
    AwaitingResponse,
    /// A terminal line arrived; the response body is readable.
    ResponseReady,
}

/// Receives response lines that are not terminal status lines.
pub trait LineHandler {
    /// Called once per non-terminal line received while a command is in flight.
    fn on_line(&mut self, line: &str);

    /// Called once per line received while no command is in flight.
    fn on_unsolicited(&mut self, line: &str) {
        let _ = line;
    }
}

impl<F: FnMut(&str)> LineHandler for F {
    fn on_line(&mut self, line: &str) {
        self(line)
    }
}

/// An AT command session.
///
/// The transport is borrowed for the session's lifetime; the line and body
/// buffers are owned by the session and sized from its [`SessionConfig`].
pub struct AtSession<'t, T: Transport + ?Sized> {
    transport: &'t mut T,
    config: SessionConfig,
    assembler: LineAssembler,
    state: SessionState,
    outcome: Option<Outcome>,
    last_command: Option<String>,
    handler: Option<Box<dyn LineHandler + 't>>,
}

impl<'t, T: Transport + ?Sized> AtSession<'t, T> {
    /// Create a session with the default buffer limits.
    pub fn new(transport: &'t mut T) -> Self {
        Self::build(transport, SessionConfig::default())
    }

    /// Create a session with explicit buffer limits.
    pub fn with_config(transport: &'t mut T, config: SessionConfig) -> AtResult<Self> {
        config.validate()?;
        Ok(Self::build(transport, config))
    }

    fn build(transport: &'t mut T, config: SessionConfig) -> Self {
        AtSession {
            transport,
            config,
            assembler: LineAssembler::new(config.max_response_len, config.max_line_len),
            state: SessionState::Idle,
            outcome: None,
            last_command: None,
            handler: None,
        }
    }

    /// Install a handler for non-terminal lines, replacing any previous one.
    pub fn set_line_handler(&mut self, handler: impl LineHandler + 't) {
        self.handler = Some(Box::new(handler));
    }

    /// Remove the line handler.
    pub fn clear_line_handler(&mut self) {
        self.handler = None;
    }

    /// Send `AT+<name>[=<args>]\r\n`.
    ///
    /// `Ok(())` means the command was written and the session is now awaiting
    /// its response; completion is observed through [`poll`](Self::poll) or
    /// [`is_ready`](Self::is_ready). The `=` is present whenever `args` is
    /// non-empty, even if every argument is null.
    ///
    /// Fails with [`AtError::Busy`] without writing anything if a command is
    /// already in flight. Rejections are also recorded in [`outcome`](Self::outcome).
    pub fn execute(&mut self, name: &str, args: &[Argument<'_>]) -> AtResult<()> {
        if self.state == SessionState::AwaitingResponse {
            log::debug!("rejecting AT+{}: a command is already in flight", name);
            self.outcome = Some(Outcome::Busy);
            return Err(AtError::Busy);
        }

        let line = match Self::command_line(name, args) {
            Ok(line) => line,
            Err(e) => {
                self.reject(&e);
                return Err(e);
            }
        };

        self.last_command = Some(name.to_string());
        log::trace!("--> {}", line.trim_end());

        if let Err(e) = self.transport.write_all(line.as_bytes()) {
            self.set_state(SessionState::Idle);
            self.outcome = None;
            return Err(e.into());
        }

        self.assembler.begin_response();
        self.outcome = None;
        self.set_state(SessionState::AwaitingResponse);
        Ok(())
    }

    /// Build the full command line for `name` and `args`.
    pub fn command_line(name: &str, args: &[Argument<'_>]) -> AtResult<String> {
        validate_command_name(name)?;

        let arguments = serialize_arguments(args)?;
        let len = COMMAND_PREFIX.len() + name.len() + 1 + arguments.len() + COMMAND_TERMINATOR.len();

        let mut line = String::new();
        line.try_reserve_exact(len).map_err(|_| AtError::AllocationFailure {
            buffer: BufferKind::Command,
            limit: len,
        })?;

        line.push_str(COMMAND_PREFIX);
        line.push_str(name);
        if !args.is_empty() {
            line.push('=');
            line.push_str(&arguments);
        }
        line.push_str(COMMAND_TERMINATOR);

        Ok(line)
    }

    /// Drain every byte the transport has ready through the line assembler.
    ///
    /// Returns whether any byte was processed. Never waits for data.
    pub fn poll(&mut self) -> AtResult<bool> {
        let mut processed = false;
        while self.transport.available()? > 0 {
            let byte = self.transport.read_byte()?;
            processed = true;
            self.process_byte(byte);
        }
        Ok(processed)
    }

    /// Poll once, then report whether a new command may be sent.
    pub fn is_ready(&mut self) -> AtResult<bool> {
        self.poll()?;
        Ok(self.state != SessionState::AwaitingResponse)
    }

    /// Spin on [`is_ready`](Self::is_ready) until the exchange ends.
    ///
    /// Has no timeout: a peer that never answers keeps this looping.
    pub fn wait_until_ready(&mut self) -> AtResult<()> {
        while !self.is_ready()? {
            std::thread::yield_now();
        }
        Ok(())
    }

    /// Like [`wait_until_ready`](Self::wait_until_ready) but gives up after `timeout`.
    ///
    /// On [`AtError::Timeout`] the command is still in flight; a late terminal
    /// line will complete it on a later poll.
    pub fn wait_until_ready_timeout(&mut self, timeout: Duration) -> AtResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_ready()? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                log::debug!(
                    "timed out after {:?} waiting for AT+{}",
                    timeout,
                    self.last_command.as_deref().unwrap_or("")
                );
                return Err(AtError::Timeout);
            }
            std::thread::yield_now();
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Outcome of the last completed or rejected command.
    ///
    /// `None` before the first command and after a command is sent, until its
    /// terminal line arrives. A [`AtError::Busy`] rejection during that wait
    /// sets `Some(Outcome::Busy)`, which the terminal line later overwrites.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// The response body of the last completed exchange.
    ///
    /// Every non-terminal line, each followed by `\n`. `None` unless the
    /// session is in [`SessionState::ResponseReady`].
    pub fn response(&self) -> Option<Cow<'_, str>> {
        self.response_bytes().map(String::from_utf8_lossy)
    }

    /// Raw bytes of [`response`](Self::response).
    pub fn response_bytes(&self) -> Option<&[u8]> {
        match self.state {
            SessionState::ResponseReady => Some(self.assembler.body().as_bytes()),
            _ => None,
        }
    }

    /// Name of the last command accepted for sending.
    ///
    /// Set even when the transport write then failed. Not changed by a
    /// [`AtError::Busy`] rejection.
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    /// The active buffer limits.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &*self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut *self.transport
    }

    fn process_byte(&mut self, byte: u8) {
        let in_flight = self.state == SessionState::AwaitingResponse;

        match self.assembler.feed(byte) {
            Feed::Pending => {}
            Feed::Line => {
                let line = String::from_utf8_lossy(self.assembler.completed_line());
                log::trace!("<-- {}", line);
                if let Some(handler) = self.handler.as_mut() {
                    if in_flight {
                        handler.on_line(&line);
                    } else {
                        handler.on_unsolicited(&line);
                    }
                }
            }
            Feed::Complete(outcome) => {
                log::trace!("<-- {}", outcome);
                if in_flight {
                    self.outcome = Some(outcome);
                    self.set_state(SessionState::ResponseReady);
                } else {
                    log::debug!("ignoring {} with no command in flight", outcome);
                }
            }
            Feed::Overflow(buffer) => {
                if in_flight {
                    log::warn!(
                        "{} buffer overflow while awaiting AT+{}, aborting exchange",
                        buffer,
                        self.last_command.as_deref().unwrap_or("")
                    );
                    self.outcome = Some(Outcome::AllocationFailure);
                    self.set_state(SessionState::Idle);
                } else {
                    log::debug!("{} buffer overflow with no command in flight", buffer);
                }
            }
        }
    }

    // Nothing was written, so the previous exchange's state and body stand.
    fn reject(&mut self, error: &AtError) {
        log::debug!("rejecting command: {}", error);
        self.outcome = error.outcome();
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            log::debug!("session {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

impl<T: Transport + ?Sized> std::fmt::Debug for AtSession<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtSession")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("outcome", &self.outcome)
            .field("last_command", &self.last_command)
            .finish_non_exhaustive()
    }
}

/// Command names must be non-empty printable ASCII without `=`.
fn validate_command_name(name: &str) -> AtResult<()> {
    if name.is_empty() {
        return Err(AtError::MalformedCommand("empty command name".to_string()));
    }
    if let Some(c) = name.chars().find(|c| !c.is_ascii_graphic() || *c == '=') {
        return Err(AtError::MalformedCommand(format!(
            "invalid character {:?} in command name {:?}",
            c, name
        )));
    }
    Ok(())
}
