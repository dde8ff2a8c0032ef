//! Version-control plumbing: a transport that runs commands, a connection
//! that logs in and parses tagged records, and the session traits the
//! orchestrator talks to.

mod charset;
mod connection;
mod p4;
mod record;

pub use charset::Charset;
pub use connection::{
    CommandError, ConnectError, RawOutput, Request, VcsConfig, VcsConnection,
};
pub use p4::{P4Cli, P4Connector};
pub use record::{parse_tagged, Record, RecordSet};

use std::io;

/// Runs one command against the server and returns its raw output.
pub trait VcsTransport {
    fn execute(&mut self, request: &Request) -> io::Result<RawOutput>;
}

/// An open, authenticated session.
pub trait VcsSession {
    fn run_command(&mut self, name: &str, args: &[String]) -> Result<RecordSet, CommandError>;
}

/// Opens sessions. Connecting is deferred until a batch actually needs one.
pub trait VcsConnector {
    fn connect(&self) -> Result<Box<dyn VcsSession>, ConnectError>;
}
