//! Round-robin upstream selection.

use crate::error::GateError;
use parking_lot::Mutex;
use std::fmt;

/// An SMTP server that admitted sessions are relayed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Upstream {
    pub host: String,
    pub port: u16,
}

impl Upstream {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Hands out upstreams in strict rotation.
///
/// The list is fixed at construction. The cursor is the only mutable state
/// and is advanced under a lock, so concurrent callers always observe a
/// contiguous rotation: no upstream is skipped or handed out twice in a row
/// out of turn.
pub struct UpstreamSelector {
    upstreams: Box<[Upstream]>,
    cursor: Mutex<usize>,
}

impl UpstreamSelector {
    /// Fails with [`GateError::NoUpstreamsConfigured`] on an empty list.
    pub fn new(upstreams: Vec<Upstream>) -> Result<Self, GateError> {
        if upstreams.is_empty() {
            return Err(GateError::NoUpstreamsConfigured);
        }
        Ok(Self {
            upstreams: upstreams.into_boxed_slice(),
            cursor: Mutex::new(0),
        })
    }

    /// Return the upstream at the cursor and advance it, wrapping at the end.
    pub fn next(&self) -> &Upstream {
        let mut cursor = self.cursor.lock();
        let upstream = &self.upstreams[*cursor];
        *cursor = (*cursor + 1) % self.upstreams.len();
        upstream
    }

    pub fn upstreams(&self) -> &[Upstream] {
        &self.upstreams
    }
}
