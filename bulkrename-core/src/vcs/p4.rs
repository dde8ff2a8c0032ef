use super::charset::Charset;
use super::connection::{ConnectError, RawOutput, Request, VcsConfig, VcsConnection};
use super::{VcsConnector, VcsSession, VcsTransport};
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::{Command, Stdio};

/// Runs the `p4` command-line client in tagged mode.
#[derive(Debug, Clone)]
pub struct P4Cli {
    config: VcsConfig,
}

impl P4Cli {
    pub fn new(config: VcsConfig) -> Self {
        Self { config }
    }

    /// Global flags placed before the command name.
    pub fn global_args(&self, charset: Charset) -> Vec<String> {
        let mut args = vec!["-ztag".to_string()];
        for (flag, value) in [
            ("-p", &self.config.port),
            ("-u", &self.config.user),
            ("-c", &self.config.client),
        ] {
            if !value.is_empty() {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        if charset == Charset::Utf8 {
            args.push("-C".to_string());
            args.push("utf8".to_string());
        }
        args
    }
}

impl VcsTransport for P4Cli {
    fn execute(&mut self, request: &Request) -> io::Result<RawOutput> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(self.global_args(request.charset))
            .arg(&request.command)
            .args(request.args.iter().map(|arg| encode_arg(request.charset, arg)))
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        if let Some(input) = &request.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input)?;
            }
        }
        let output = child.wait_with_output()?;
        Ok(RawOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Command-line bytes for one argument in the session's charset.
#[cfg(unix)]
fn encode_arg(charset: Charset, arg: &str) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(charset.encode(arg))
}

// Windows command lines are UTF-16; the client converts them itself.
#[cfg(not(unix))]
fn encode_arg(_charset: Charset, arg: &str) -> OsString {
    OsString::from(arg)
}

/// Opens `p4` sessions from configuration.
#[derive(Debug, Clone)]
pub struct P4Connector {
    config: VcsConfig,
}

impl P4Connector {
    pub fn new(config: VcsConfig) -> Self {
        Self { config }
    }
}

impl VcsConnector for P4Connector {
    fn connect(&self) -> Result<Box<dyn VcsSession>, ConnectError> {
        let transport = P4Cli::new(self.config.clone());
        let connection = VcsConnection::init(transport, &self.config)?;
        Ok(Box::new(connection))
    }
}
