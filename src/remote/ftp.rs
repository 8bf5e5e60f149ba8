//! FTP over explicit TLS backend

use std::io::Read;
use std::net::ToSocketAddrs;
use std::time::Duration;

use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{FtpError, NativeTlsConnector, NativeTlsFtpStream};
use tracing::debug;

use super::{entry_name, RemoteFs, RemoteResult};
use crate::error::{MirrorError, RemoteError};

/// Everything needed to open an FTPS session
#[derive(Clone)]
pub struct FtpSettings {
	pub host: String,
	pub port: u16,
	pub user: String,
	pub password: String,
	pub connect_timeout: Duration,
}

impl std::fmt::Debug for FtpSettings {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FtpSettings")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("user", &self.user)
			.field("connect_timeout", &self.connect_timeout)
			.finish()
	}
}

/// A logged-in FTPS session
pub struct FtpRemote {
	stream: NativeTlsFtpStream,
}

impl FtpRemote {
	/// Connect, upgrade to TLS, log in and switch to binary transfers
	pub fn connect(settings: &FtpSettings) -> Result<Self, MirrorError> {
		let fail = |source: RemoteError| MirrorError::Connection {
			host: settings.host.clone(),
			source,
		};

		let addr = (settings.host.as_str(), settings.port)
			.to_socket_addrs()
			.map_err(|e| fail(e.into()))?
			.next()
			.ok_or_else(|| fail(RemoteError::transport("host did not resolve to any address")))?;

		debug!("Connecting to {} ({})", settings.host, addr);
		let stream = NativeTlsFtpStream::connect_timeout(addr, settings.connect_timeout)
			.map_err(|e| fail(remote_error(e)))?;

		let connector =
			TlsConnector::new().map_err(|e| fail(RemoteError::transport(e.to_string())))?;
		let mut stream = stream
			.into_secure(NativeTlsConnector::from(connector), &settings.host)
			.map_err(|e| fail(remote_error(e)))?;

		stream
			.login(settings.user.as_str(), settings.password.as_str())
			.map_err(|e| fail(remote_error(e)))?;
		stream.transfer_type(FileType::Binary).map_err(|e| fail(remote_error(e)))?;

		debug!("Logged in to {} as {}", settings.host, settings.user);
		Ok(FtpRemote { stream })
	}
}

impl RemoteFs for FtpRemote {
	fn pwd(&mut self) -> RemoteResult<String> {
		self.stream.pwd().map_err(remote_error)
	}

	fn cwd(&mut self, path: &str) -> RemoteResult<()> {
		self.stream.cwd(path).map_err(remote_error)
	}

	fn cdup(&mut self) -> RemoteResult<()> {
		self.stream.cdup().map_err(remote_error)
	}

	fn list(&mut self) -> RemoteResult<Vec<String>> {
		let entries = self.stream.nlst(None).map_err(remote_error)?;
		Ok(entries.iter().map(|e| entry_name(e).to_string()).filter(|e| !e.is_empty()).collect())
	}

	fn mkdir(&mut self, name: &str) -> RemoteResult<()> {
		self.stream.mkdir(name).map_err(remote_error)
	}

	fn rmdir(&mut self, name: &str) -> RemoteResult<()> {
		self.stream.rmdir(name).map_err(remote_error)
	}

	fn delete(&mut self, name: &str) -> RemoteResult<()> {
		self.stream.rm(name).map_err(remote_error)
	}

	fn store(&mut self, name: &str, reader: &mut dyn Read) -> RemoteResult<u64> {
		let mut reader = reader;
		self.stream.put_file(name, &mut reader).map_err(remote_error)
	}

	fn quit(&mut self) -> RemoteResult<()> {
		self.stream.quit().map_err(remote_error)
	}
}

/// A reply from the server is a refusal; anything else is a broken link
fn remote_error(err: FtpError) -> RemoteError {
	match &err {
		FtpError::UnexpectedResponse(_) => RemoteError::rejected(err.to_string()),
		_ => RemoteError::transport(err.to_string()),
	}
}

// vim: ts=4
