//! In-process multi-partition collective over crossbeam channels.
//!
//! [`LocalCluster::new`] returns one [`LocalRank`] per partition; each is
//! moved onto its own thread. A reduction broadcasts the local slice to
//! every peer and sums what the peers send back. Every message carries the
//! sender's call number, so a peer that skipped or repeated a call is
//! reported as [`CollectiveError::CallMismatch`].
//!
//! A peer can be at most one call ahead (it cannot finish call `n + 1`
//! without this partition's contribution), so early messages are stashed
//! until the matching call.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::error::CollectiveError;
use crate::Collective;

/// One partition's contribution to a call.
#[derive(Debug)]
struct Message {
    from: usize,
    call: u64,
    values: Vec<i32>,
}

/// Factory for a set of connected [`LocalRank`]s.
pub struct LocalCluster;

impl LocalCluster {
    /// Default time a rank waits for its peers before giving up.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create `size` connected ranks with the default timeout.
    pub fn new(size: usize) -> Vec<LocalRank> {
        Self::with_timeout(size, Self::DEFAULT_TIMEOUT)
    }

    /// Create `size` connected ranks that wait at most `timeout` per call.
    pub fn with_timeout(size: usize, timeout: Duration) -> Vec<LocalRank> {
        let (senders, inboxes): (Vec<Sender<Message>>, Vec<Receiver<Message>>) =
            (0..size).map(|_| unbounded()).unzip();
        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalRank {
                rank,
                size,
                peers: senders
                    .iter()
                    .enumerate()
                    .filter(|&(peer, _)| peer != rank)
                    .map(|(peer, tx)| (peer, tx.clone()))
                    .collect(),
                inbox,
                stash: Vec::new(),
                calls: 0,
                timeout,
            })
            .collect()
    }
}

/// One partition of a [`LocalCluster`].
///
/// Holds senders to every other rank but not to itself, so its inbox
/// disconnects once all peers are dropped.
pub struct LocalRank {
    rank: usize,
    size: usize,
    peers: Vec<(usize, Sender<Message>)>,
    inbox: Receiver<Message>,
    stash: Vec<Message>,
    calls: u64,
    timeout: Duration,
}

impl LocalRank {
    /// Number of collective calls completed or in progress.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    fn accept(&self, msg: &Message, call: u64, totals: &mut [i32]) -> Result<(), CollectiveError> {
        if msg.values.len() != totals.len() {
            return Err(CollectiveError::LengthMismatch {
                rank: self.rank,
                peer: msg.from,
                expected: totals.len(),
                found: msg.values.len(),
            });
        }
        debug_assert_eq!(msg.call, call);
        for (t, v) in totals.iter_mut().zip(&msg.values) {
            *t += v;
        }
        Ok(())
    }
}

impl Collective for LocalRank {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce_sum(&mut self, values: &mut [i32]) -> Result<(), CollectiveError> {
        let call = self.calls;
        self.calls += 1;

        for (_, tx) in &self.peers {
            tx.send(Message {
                from: self.rank,
                call,
                values: values.to_vec(),
            })
            .map_err(|_| CollectiveError::Disconnected {
                rank: self.rank,
                call,
            })?;
        }

        let mut totals = values.to_vec();
        let mut pending = self.peers.len();

        let (ready, later): (Vec<Message>, Vec<Message>) =
            std::mem::take(&mut self.stash).into_iter().partition(|m| m.call == call);
        self.stash = later;
        for msg in &ready {
            self.accept(msg, call, &mut totals)?;
            pending -= 1;
        }

        while pending > 0 {
            let msg = match self.inbox.recv_timeout(self.timeout) {
                Ok(msg) => msg,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(CollectiveError::Timeout {
                        rank: self.rank,
                        call,
                        waited: self.timeout,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CollectiveError::Disconnected {
                        rank: self.rank,
                        call,
                    })
                }
            };
            if msg.call == call {
                self.accept(&msg, call, &mut totals)?;
                pending -= 1;
            } else if msg.call == call + 1 {
                self.stash.push(msg);
            } else {
                return Err(CollectiveError::CallMismatch {
                    rank: self.rank,
                    peer: msg.from,
                    expected: call,
                    found: msg.call,
                });
            }
        }

        values.copy_from_slice(&totals);
        Ok(())
    }
}
