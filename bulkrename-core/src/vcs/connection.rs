use super::charset::Charset;
use super::record::{parse_tagged, RecordSet};
use super::{VcsSession, VcsTransport};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Server endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsConfig {
    /// Allow version-control aware renames at all
    pub enabled: bool,
    /// Client program to spawn
    pub program: String,
    pub port: String,
    pub user: String,
    pub client: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            program: "p4".to_string(),
            port: String::new(),
            user: String::new(),
            client: String::new(),
            password: String::new(),
        }
    }
}

impl VcsConfig {
    pub fn validate(&self) -> Result<(), ConnectError> {
        if self.program.trim().is_empty() {
            return Err(ConnectError::InvalidConfig(
                "no client program configured".to_string(),
            ));
        }
        if self.port.trim().is_empty() {
            return Err(ConnectError::InvalidConfig("no server port configured".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(ConnectError::InvalidConfig("no user configured".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Invalid version control configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot reach version control server: {0}")]
    Transport(#[source] io::Error),

    #[error("Invalid connection to server: {0}")]
    Info(String),

    #[error("Login failed: {}", .0.join("; "))]
    Login(Vec<String>),
}

#[derive(Debug, Error)]
#[error("Failed to run `{command}`: {source}")]
pub struct CommandError {
    pub command: String,
    #[source]
    pub source: io::Error,
}

/// One command handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: String,
    pub args: Vec<String>,
    /// Bytes written to the command's prompt
    pub stdin: Option<Vec<u8>>,
    pub charset: Charset,
}

/// Raw bytes a transport call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// An authenticated session with the version-control server.
#[derive(Debug)]
pub struct VcsConnection<T> {
    transport: T,
    charset: Charset,
    last: RecordSet,
}

impl<T: VcsTransport> VcsConnection<T> {
    /// Validate the endpoint, probe the server with `info` and log in.
    ///
    /// Switches to UTF-8 when the server runs in unicode mode. The password
    /// is answered to the login prompt, never passed on the command line.
    pub fn init(transport: T, config: &VcsConfig) -> Result<Self, ConnectError> {
        config.validate()?;
        let mut connection = Self {
            transport,
            charset: Charset::Latin1,
            last: RecordSet::default(),
        };

        let info = connection
            .call("info", &[], None)
            .map_err(|e| ConnectError::Transport(e.source))?;
        let Some(server) = info.first() else {
            let reason = if info.errors.is_empty() {
                "server returned no records".to_string()
            } else {
                info.errors.join("; ")
            };
            return Err(ConnectError::Info(reason));
        };
        if server.contains_key("unicode") {
            connection.charset = Charset::Utf8;
        }

        let mut answer = connection.charset.encode(&config.password);
        answer.push(b'\n');
        let login = connection
            .call("login", &["-a".to_string()], Some(answer))
            .map_err(|e| ConnectError::Transport(e.source))?;
        if login.has_errors() {
            return Err(ConnectError::Login(login.errors));
        }

        Ok(connection)
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Records of the last command run.
    pub fn last_records(&self) -> &RecordSet {
        &self.last
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn call(
        &mut self,
        command: &str,
        args: &[String],
        stdin: Option<Vec<u8>>,
    ) -> Result<RecordSet, CommandError> {
        let request = Request {
            command: command.to_string(),
            args: args.to_vec(),
            stdin,
            charset: self.charset,
        };
        let output = self
            .transport
            .execute(&request)
            .map_err(|source| CommandError {
                command: command.to_string(),
                source,
            })?;
        let records = parse_tagged(
            &self.charset.decode(&output.stdout),
            &self.charset.decode(&output.stderr),
        );
        self.last = records.clone();
        Ok(records)
    }
}

impl<T: VcsTransport> VcsSession for VcsConnection<T> {
    /// Zero records is not an error here; callers decide what it means.
    fn run_command(&mut self, name: &str, args: &[String]) -> Result<RecordSet, CommandError> {
        self.call(name, args, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned outputs and remembers every request.
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        replies: VecDeque<io::Result<RawOutput>>,
        requests: Vec<Request>,
    }

    impl ScriptedTransport {
        fn reply(mut self, stdout: &str, stderr: &str) -> Self {
            self.replies.push_back(Ok(RawOutput {
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
            }));
            self
        }
    }

    impl VcsTransport for ScriptedTransport {
        fn execute(&mut self, request: &Request) -> io::Result<RawOutput> {
            self.requests.push(request.clone());
            self.replies
                .pop_front()
                .unwrap_or_else(|| Ok(RawOutput::default()))
        }
    }

    fn config() -> VcsConfig {
        VcsConfig {
            enabled: true,
            port: "ssl:perforce:1666".to_string(),
            user: "alice".to_string(),
            client: "ws".to_string(),
            password: "secret".to_string(),
            ..VcsConfig::default()
        }
    }

    #[test]
    fn test_unicode_server_switches_charset() {
        let transport = ScriptedTransport::default()
            .reply("... userName alice\n... unicode enabled\n", "")
            .reply("... User alice\n", "");
        let connection = VcsConnection::init(transport, &config()).unwrap();

        assert_eq!(connection.charset(), Charset::Utf8);
        let requests = &connection.transport().requests;
        assert_eq!(requests[0].command, "info");
        assert_eq!(requests[1].command, "login");
        assert_eq!(requests[1].args, vec!["-a".to_string()]);
        assert_eq!(requests[1].stdin.as_deref(), Some(b"secret\n".as_slice()));
        assert_eq!(requests[1].charset, Charset::Utf8);
    }

    #[test]
    fn test_plain_server_stays_latin1() {
        let transport = ScriptedTransport::default()
            .reply("... userName alice\n", "")
            .reply("", "");
        let connection = VcsConnection::init(transport, &config()).unwrap();
        assert_eq!(connection.charset(), Charset::Latin1);
    }

    #[test]
    fn test_login_error_aborts() {
        let transport = ScriptedTransport::default()
            .reply("... userName alice\n", "")
            .reply("", "Password invalid.\n");
        let err = VcsConnection::init(transport, &config()).unwrap_err();
        match err {
            ConnectError::Login(messages) => assert_eq!(messages, vec!["Password invalid."]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_info_without_records_aborts() {
        let transport = ScriptedTransport::default().reply("", "Connect to server failed\n");
        let err = VcsConnection::init(transport, &config()).unwrap_err();
        assert!(matches!(err, ConnectError::Info(ref m) if m.contains("Connect to server failed")));
    }

    #[test]
    fn test_transport_failure_aborts() {
        let mut transport = ScriptedTransport::default();
        transport
            .replies
            .push_back(Err(io::Error::new(io::ErrorKind::NotFound, "p4 not found")));
        let err = VcsConnection::init(transport, &config()).unwrap_err();
        assert!(matches!(err, ConnectError::Transport(_)));
    }

    #[test]
    fn test_invalid_config_never_runs() {
        let mut bad = config();
        bad.port.clear();
        let err = VcsConnection::init(ScriptedTransport::default(), &bad).unwrap_err();
        assert!(matches!(err, ConnectError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_records_is_not_an_error() {
        let transport = ScriptedTransport::default()
            .reply("... userName alice\n", "")
            .reply("", "")
            .reply("", "");
        let mut connection = VcsConnection::init(transport, &config()).unwrap();
        let set = connection
            .run_command("edit", &["/ws/a.txt".to_string()])
            .unwrap();
        assert!(set.is_empty());
        assert!(connection.last_records().is_empty());
    }
}
