//! Executes scripted commands against a transport.

use std::time::Duration;

use at_stream_protocol::{AtError, AtSession, LineHandler, Outcome, SessionConfig, Transport};
use tracing::{debug, info, warn};

use crate::error::CliAppError;
use crate::script::ScriptCommand;

/// Result of one scripted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeReport {
    /// The command name.
    pub command: String,
    /// Outcome, or `None` if the exchange timed out.
    pub outcome: Option<Outcome>,
    /// Response body (empty unless the exchange completed).
    pub body: String,
}

impl ExchangeReport {
    /// Whether the peer answered `OK`.
    pub fn succeeded(&self) -> bool {
        self.outcome == Some(Outcome::Ok)
    }
}

/// Logs lines that arrive with no command in flight.
struct UnsolicitedLogger;

impl LineHandler for UnsolicitedLogger {
    fn on_line(&mut self, line: &str) {
        debug!(line, "response line");
    }

    fn on_unsolicited(&mut self, line: &str) {
        info!(line, "unsolicited line");
    }
}

/// Run `commands` in order, waiting up to `timeout` for each response.
///
/// Stops after a timeout, since the session is then still busy with the
/// unanswered command. Engine rejections (malformed command, overflow) are
/// reported and the next command is tried.
pub fn run_commands<T: Transport + ?Sized>(
    transport: &mut T,
    config: SessionConfig,
    commands: &[ScriptCommand],
    timeout: Duration,
) -> Result<Vec<ExchangeReport>, CliAppError> {
    let mut session = AtSession::with_config(transport, config)?;
    session.set_line_handler(UnsolicitedLogger);

    let mut reports = Vec::with_capacity(commands.len());

    for command in commands {
        let args = command.arguments();

        match session.execute(&command.name, &args) {
            Ok(()) => {}
            Err(AtError::Transport(e)) => return Err(AtError::Transport(e).into()),
            Err(e) => {
                warn!(command = %command.name, error = %e, "command rejected");
                reports.push(ExchangeReport {
                    command: command.name.clone(),
                    outcome: e.outcome(),
                    body: String::new(),
                });
                continue;
            }
        }

        match session.wait_until_ready_timeout(timeout) {
            Ok(()) => {}
            Err(AtError::Timeout) => {
                warn!(command = %command.name, ?timeout, "no response");
                reports.push(ExchangeReport {
                    command: command.name.clone(),
                    outcome: None,
                    body: String::new(),
                });
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let report = ExchangeReport {
            command: command.name.clone(),
            outcome: session.outcome(),
            body: session.response().map(|b| b.into_owned()).unwrap_or_default(),
        };
        debug!(command = %report.command, outcome = ?report.outcome, "exchange complete");
        reports.push(report);
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptArgument;
    use at_stream_protocol::MockTransport;

    fn command(name: &str, args: Vec<ScriptArgument>) -> ScriptCommand {
        ScriptCommand {
            name: name.to_string(),
            args,
        }
    }

    #[test]
    fn test_runs_commands_in_order() {
        let mut mock = MockTransport::new();
        mock.expect(b"AT+VERSION\r\n", b"1.2.3\r\nOK\r\n");
        mock.expect(b"AT+SETVER=\"version\",2\r\n", b"ERROR\r\n");

        let commands = vec![
            command("VERSION", vec![]),
            command(
                "SETVER",
                vec![ScriptArgument::Text("version".into()), ScriptArgument::Integer(2)],
            ),
        ];
        let reports = run_commands(
            &mut mock,
            SessionConfig::default(),
            &commands,
            Duration::from_millis(50),
        )
        .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports[0].succeeded());
        assert_eq!(reports[0].body, "1.2.3\n");
        assert_eq!(reports[1].outcome, Some(Outcome::ErrorStatus));
        assert!(!reports[1].succeeded());
    }

    #[test]
    fn test_timeout_stops_run() {
        let mut mock = MockTransport::new();
        let commands = vec![command("SLOW", vec![]), command("NEVER", vec![])];

        let reports = run_commands(
            &mut mock,
            SessionConfig::default(),
            &commands,
            Duration::from_millis(5),
        )
        .unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, None);
        assert_eq!(mock.write_count(), 1);
    }

    #[test]
    fn test_rejected_command_does_not_stop_run() {
        let mut mock = MockTransport::new();
        mock.expect(b"AT+OK\r\n", b"OK\r\n");
        let commands = vec![command("BAD NAME", vec![]), command("OK", vec![])];

        let reports = run_commands(
            &mut mock,
            SessionConfig::default(),
            &commands,
            Duration::from_millis(50),
        )
        .unwrap();

        assert_eq!(reports[0].outcome, Some(Outcome::MalformedCommand));
        assert!(reports[1].succeeded());
    }

    #[test]
    fn test_transport_failure_is_fatal() {
        let mut mock = MockTransport::new();
        mock.set_fail_writes(true);
        let result = run_commands(
            &mut mock,
            SessionConfig::default(),
            &[command("VERSION", vec![])],
            Duration::from_millis(5),
        );
        assert!(matches!(result, Err(CliAppError::Protocol(AtError::Transport(_)))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut mock = MockTransport::new();
        let result = run_commands(
            &mut mock,
            SessionConfig::default().with_max_response_len(0),
            &[],
            Duration::from_millis(5),
        );
        assert!(matches!(result, Err(CliAppError::Protocol(AtError::InvalidConfig(_)))));
    }
}
