//! Non-blocking operator input.
//!
//! Readiness is checked with a zero-timeout `poll(2)` and a byte is read
//! only when one is waiting. The descriptor itself stays blocking: stdin
//! usually shares its open file description with stdout on a terminal.

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::termios::{
    LocalFlags, SetArg, SpecialCharacterIndices, Termios, tcgetattr, tcsetattr,
};
use nix::unistd::isatty;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, OwnedFd};
use tracing::{debug, warn};

/// Source of single-byte operator keystrokes.
pub trait KeySource {
    /// Next key if one is ready. Never blocks.
    fn try_key(&mut self) -> io::Result<Option<u8>>;
}

/// Keyboard on an input descriptor, switched to unbuffered, non-echoing
/// reads when it is a terminal.
///
/// The terminal mode is restored on drop.
pub struct TerminalKeyboard {
    input: File,
    saved: Option<Termios>,
}

impl TerminalKeyboard {
    /// Keyboard on a duplicate of stdin.
    pub fn stdin() -> io::Result<Self> {
        Self::new(io::stdin().as_fd().try_clone_to_owned()?)
    }

    pub fn new(fd: OwnedFd) -> io::Result<Self> {
        let input = File::from(fd);

        let saved = if isatty(&input).map_err(io::Error::from)? {
            let saved = tcgetattr(&input).map_err(io::Error::from)?;
            let mut raw = saved.clone();
            raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
            raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
            raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
            tcsetattr(&input, SetArg::TCSANOW, &raw).map_err(io::Error::from)?;
            Some(saved)
        } else {
            debug!("keyboard input is not a terminal, reading it as-is");
            None
        };

        Ok(Self { input, saved })
    }

    fn ready(&self) -> io::Result<bool> {
        let mut fds = [PollFd::new(self.input.as_fd(), PollFlags::POLLIN)];
        loop {
            match poll(&mut fds, PollTimeout::ZERO) {
                Ok(0) => return Ok(false),
                Ok(_) => {
                    let revents = fds[0].revents().unwrap_or(PollFlags::empty());
                    return Ok(revents.contains(PollFlags::POLLIN));
                }
                Err(nix::errno::Errno::EINTR) => continue,
                Err(errno) => return Err(io::Error::from(errno)),
            }
        }
    }
}

impl KeySource for TerminalKeyboard {
    fn try_key(&mut self) -> io::Result<Option<u8>> {
        if !self.ready()? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(1) => return Ok(Some(byte[0])),
                Ok(_) => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for TerminalKeyboard {
    fn drop(&mut self) {
        if let Some(saved) = &self.saved {
            if let Err(e) = tcsetattr(&self.input, SetArg::TCSANOW, saved) {
                warn!("failed to restore terminal mode: {e}");
            }
        }
    }
}

/// Pre-recorded keystrokes, one per poll. `None` entries are idle polls.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    script: VecDeque<Option<u8>>,
}

impl ScriptedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a keystroke.
    pub fn press(&mut self, key: u8) -> &mut Self {
        self.script.push_back(Some(key));
        self
    }

    /// Queue `n` polls with no key.
    pub fn idle(&mut self, n: usize) -> &mut Self {
        self.script.extend(std::iter::repeat_n(None, n));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl KeySource for ScriptedKeys {
    fn try_key(&mut self) -> io::Result<Option<u8>> {
        Ok(self.script.pop_front().flatten())
    }
}
