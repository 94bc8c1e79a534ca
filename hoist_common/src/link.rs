//! Fixed-record, one-directional channels between hoist processes.
//!
//! Every channel is a named FIFO carrying records of one fixed size:
//!
//! | Channel | Direction | Record |
//! |---|---|---|
//! | CommandLink(axis) | issuer → motor | `i32` command code |
//! | PositionLink(axis) | motor → console | `f32` estimated position |
//! | PidHandoff | issuer → console | `i32` issuer pid |
//!
//! Records are at most `PIPE_BUF` bytes, so the kernel writes them
//! atomically. Readers never block in steady state: [`LinkReader::try_read`]
//! drains whatever is available and returns only the newest record
//! (last-write-wins, no queue).

use nix::errno::Errno;
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use static_assertions::const_assert;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::marker::PhantomData;
use std::os::fd::AsFd;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Largest record any channel carries.
const MAX_RECORD: usize = 8;

const_assert!(MAX_RECORD <= libc::PIPE_BUF);
const_assert!(core::mem::size_of::<f32>() <= MAX_RECORD);
const_assert!(core::mem::size_of::<i32>() <= MAX_RECORD);

/// A value that travels over a channel as a fixed number of bytes.
///
/// Encoding is native-endian: both ends run on the same host.
pub trait Record: Copy {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Write exactly `SIZE` bytes into `buf`.
    fn encode(&self, buf: &mut [u8]);

    /// Read a value from exactly `SIZE` bytes.
    fn decode(buf: &[u8]) -> Self;
}

impl Record for f32 {
    const SIZE: usize = 4;

    fn encode(&self, buf: &mut [u8]) {
        buf.copy_from_slice(&self.to_ne_bytes());
    }

    fn decode(buf: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(buf);
        f32::from_ne_bytes(raw)
    }
}

impl Record for i32 {
    const SIZE: usize = 4;

    fn encode(&self, buf: &mut [u8]) {
        buf.copy_from_slice(&self.to_ne_bytes());
    }

    fn decode(buf: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(buf);
        i32::from_ne_bytes(raw)
    }
}

/// Errors that can occur on a channel.
#[derive(Debug, Error)]
pub enum LinkError {
    /// `mkfifo` failed for a reason other than "already exists".
    #[error("failed to create FIFO {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: Errno,
    },

    /// The path exists but is not a FIFO.
    #[error("{path:?} exists and is not a FIFO")]
    NotAFifo { path: PathBuf },

    /// Opening either end failed.
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Read or write failed.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record arrived truncated.
    #[error("short read on {path:?}: {got} of {expected} bytes")]
    ShortRead {
        path: PathBuf,
        expected: usize,
        got: usize,
    },

    /// A record could not be written completely, even after one retry.
    #[error("short write on {path:?}: {written} of {expected} bytes")]
    ShortWrite {
        path: PathBuf,
        expected: usize,
        written: usize,
    },
}

/// Create the FIFO at `path` unless it already exists.
pub fn ensure_fifo(path: &Path) -> Result<(), LinkError> {
    match mkfifo(path, Mode::from_bits_truncate(0o666)) {
        Ok(()) => {
            debug!("Created FIFO {}", path.display());
            Ok(())
        }
        Err(Errno::EEXIST) => {
            let meta = std::fs::metadata(path).map_err(|source| LinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
            if meta.file_type().is_fifo() {
                Ok(())
            } else {
                Err(LinkError::NotAFifo {
                    path: path.to_path_buf(),
                })
            }
        }
        Err(source) => Err(LinkError::Create {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Toggle `O_NONBLOCK` on an open descriptor.
fn set_nonblocking<Fd: AsFd>(fd: Fd, enabled: bool) -> nix::Result<()> {
    let fd = fd.as_fd();
    let mut flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    flags.set(OFlag::O_NONBLOCK, enabled);
    fcntl(fd, FcntlArg::F_SETFL(flags))?;
    Ok(())
}

/// Receiving end of a channel.
#[derive(Debug)]
pub struct LinkReader<T: Record> {
    path: PathBuf,
    file: File,
    _record: PhantomData<T>,
}

impl<T: Record> LinkReader<T> {
    /// Open without waiting for a writer. Used for steady-state polling.
    pub fn open_nonblocking(path: &Path) -> Result<Self, LinkError> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(OFlag::O_NONBLOCK.bits())
            .open(path)
            .map_err(|source| LinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_file(path, file))
    }

    /// Open and block until a writer connects. Used during setup only.
    pub fn open_blocking(path: &Path) -> Result<Self, LinkError> {
        let file = File::open(path).map_err(|source| LinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_file(path, file))
    }

    fn from_file(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            file,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Newest complete record available, or `None` if nothing is ready.
    ///
    /// An absent writer and an empty pipe are both "not ready". A truncated
    /// record is fatal.
    pub fn try_read(&mut self) -> Result<Option<T>, LinkError> {
        let mut newest = None;
        let mut buf = [0u8; MAX_RECORD];
        let record = &mut buf[..T::SIZE];

        loop {
            match self.file.read(record) {
                Ok(0) => break,
                Ok(n) if n == T::SIZE => newest = Some(T::decode(record)),
                Ok(got) => {
                    return Err(LinkError::ShortRead {
                        path: self.path.clone(),
                        expected: T::SIZE,
                        got,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(LinkError::Io {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }

        Ok(newest)
    }

    /// Block until one record arrives.
    pub fn recv(&mut self) -> Result<T, LinkError> {
        let mut buf = [0u8; MAX_RECORD];
        let record = &mut buf[..T::SIZE];
        let mut filled = 0;

        while filled < T::SIZE {
            match self.file.read(&mut record[filled..]) {
                Ok(0) => {
                    return Err(LinkError::ShortRead {
                        path: self.path.clone(),
                        expected: T::SIZE,
                        got: filled,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(LinkError::Io {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }

        Ok(T::decode(record))
    }
}

/// Sending end of a channel.
#[derive(Debug)]
pub struct LinkWriter<T: Record> {
    path: PathBuf,
    file: File,
    _record: PhantomData<T>,
}

impl<T: Record> LinkWriter<T> {
    /// Open, waiting for the reader to connect, then switch to
    /// non-blocking writes.
    pub fn open(path: &Path) -> Result<Self, LinkError> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| LinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        set_nonblocking(&file, true).map_err(|errno| LinkError::Open {
            path: path.to_path_buf(),
            source: io::Error::from(errno),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            _record: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort send. Returns `false` when the pipe is full and the
    /// record was dropped.
    ///
    /// A partial write is retried once with the remaining bytes before it
    /// is reported as [`LinkError::ShortWrite`].
    pub fn try_send(&mut self, value: &T) -> Result<bool, LinkError> {
        let mut buf = [0u8; MAX_RECORD];
        let record = &mut buf[..T::SIZE];
        value.encode(record);

        let written = match self.write_once(record)? {
            None => {
                trace!("{} full, record dropped", self.path.display());
                return Ok(false);
            }
            Some(n) => n,
        };
        if written == T::SIZE {
            return Ok(true);
        }

        let retried = self.write_once(&record[written..])?.unwrap_or(0);
        if written + retried == T::SIZE {
            Ok(true)
        } else {
            Err(LinkError::ShortWrite {
                path: self.path.clone(),
                expected: T::SIZE,
                written: written + retried,
            })
        }
    }

    fn write_once(&mut self, bytes: &[u8]) -> Result<Option<usize>, LinkError> {
        loop {
            match self.file.write(bytes) {
                Ok(n) => return Ok(Some(n)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(LinkError::Io {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }
    }
}

/// Motor → console estimated-position stream.
pub type PositionReader = LinkReader<f32>;
/// Motor side of the position stream.
pub type PositionWriter = LinkWriter<f32>;
/// Issuer → motor command stream, raw codes.
pub type CommandReader = LinkReader<i32>;
/// Issuer side of the command stream.
pub type CommandWriter = LinkWriter<i32>;
/// Issuer → console pid handoff.
pub type PidReader = LinkReader<i32>;
