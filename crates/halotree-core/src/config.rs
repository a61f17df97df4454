//! Read configuration and validation.
//!
//! [`ReadConfig`] carries the run parameters the tree reader needs: which
//! snapshots to read, how far the matcher searched, and which optional
//! passes are enabled. Loading these from disk or a command line is the
//! caller's business; [`validate()`](ReadConfig::validate) checks the
//! structural invariants before any file is opened.

use thiserror::Error;

/// Errors detected during [`ReadConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The read step is zero or negative.
    #[error("read_step must be at least 1, got {step}")]
    InvalidStep {
        /// The configured step.
        step: i32,
    },
    /// The first snapshot to read is negative.
    #[error("read_start must be non-negative, got {start}")]
    NegativeStart {
        /// The configured start.
        start: i32,
    },
    /// The read range is empty.
    #[error("read_stop {stop} is before read_start {start}")]
    EmptyRange {
        /// The configured start.
        start: i32,
        /// The configured stop.
        stop: i32,
    },
    /// `read_stop` is not reachable from `read_start` in whole steps.
    #[error("read_stop {stop} is not on the step grid of read_start {start} (step {step})")]
    OffGrid {
        /// The configured start.
        start: i32,
        /// The configured stop.
        stop: i32,
        /// The configured step.
        step: i32,
    },
    /// The search distance is zero or negative.
    #[error("n_search must be at least 1, got {n_search}")]
    InvalidSearch {
        /// The configured search distance.
        n_search: i32,
    },
    /// A pass that consumes extended pointers was enabled without them.
    #[error("{pass} requires extended pointers to be read")]
    RequiresExtendedPointers {
        /// The pass that was enabled.
        pass: &'static str,
    },
}

/// Run parameters for one tree read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadConfig {
    /// Oldest snapshot number to read.
    pub read_start: i32,
    /// Most recent snapshot number to read (processed first).
    pub read_stop: i32,
    /// Snapshot number stride between consecutive reads.
    pub read_step: i32,
    /// How many snapshot steps the matcher searched for bridges and
    /// back-matches.
    pub n_search: i32,
    /// Read the bridge and back-match pointer files.
    pub extended_pointers: bool,
    /// Redirect descendants of halos matched to a bridge onto their
    /// forematch. Requires `extended_pointers`.
    pub fix_bridges: bool,
    /// Classify fragmented halos. Requires `extended_pointers`.
    pub compute_fragmented: bool,
}

impl ReadConfig {
    /// Create a configuration for `read_start..=read_stop` with the
    /// optional passes disabled.
    pub fn new(read_start: i32, read_stop: i32, read_step: i32, n_search: i32) -> Self {
        Self {
            read_start,
            read_stop,
            read_step,
            n_search,
            extended_pointers: false,
            fix_bridges: false,
            compute_fragmented: false,
        }
    }

    /// Enable pointer reading together with bridge fixing and
    /// fragmentation classification.
    pub fn with_all_passes(mut self) -> Self {
        self.extended_pointers = true;
        self.fix_bridges = true;
        self.compute_fragmented = true;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_step < 1 {
            return Err(ConfigError::InvalidStep {
                step: self.read_step,
            });
        }
        if self.read_start < 0 {
            return Err(ConfigError::NegativeStart {
                start: self.read_start,
            });
        }
        if self.read_stop < self.read_start {
            return Err(ConfigError::EmptyRange {
                start: self.read_start,
                stop: self.read_stop,
            });
        }
        if (self.read_stop - self.read_start) % self.read_step != 0 {
            return Err(ConfigError::OffGrid {
                start: self.read_start,
                stop: self.read_stop,
                step: self.read_step,
            });
        }
        if self.n_search < 1 {
            return Err(ConfigError::InvalidSearch {
                n_search: self.n_search,
            });
        }
        if !self.extended_pointers {
            if self.fix_bridges {
                return Err(ConfigError::RequiresExtendedPointers {
                    pass: "fix_bridges",
                });
            }
            if self.compute_fragmented {
                return Err(ConfigError::RequiresExtendedPointers {
                    pass: "compute_fragmented",
                });
            }
        }
        Ok(())
    }

    /// Number of snapshots read. Only meaningful for a valid config.
    pub fn n_snaps(&self) -> i32 {
        (self.read_stop - self.read_start) / self.read_step + 1
    }

    /// Snapshot number of a file index.
    pub fn snapshot_of(&self, i_file: i32) -> i32 {
        self.read_start + i_file * self.read_step
    }

    /// File index of the root snapshot (the first one processed).
    pub fn root_file(&self) -> i32 {
        self.n_snaps() - 1
    }
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self::new(0, 0, 1, 1)
    }
}
