//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::{HyperbolicState, MidstState};
use crate::debug::Debug;
use crate::packet::lsa::LsaType;

// File name of the durable sequence number store.
pub const SEQ_FILE_NAME: &str = "nlsrSeqNo.txt";

// Safety margin added on startup to dominate increments lost to a crash
// before the last flush.
const RECOVERY_BUMP: u64 = 10;

// Per-LSA-type monotonic sequence numbers with durable recovery.
#[derive(Debug)]
pub struct SequencingManager {
    file_path: PathBuf,
    name_seq: u64,
    adj_seq: u64,
    cor_seq: u64,
    midst_seq: u64,
}

// ===== impl SequencingManager =====

impl SequencingManager {
    pub fn new(seq_file_dir: &Path) -> SequencingManager {
        SequencingManager {
            file_path: seq_file_dir.join(SEQ_FILE_NAME),
            name_seq: 0,
            adj_seq: 0,
            cor_seq: 0,
            midst_seq: 0,
        }
    }

    pub fn seq(&self, lsa_type: LsaType) -> u64 {
        match lsa_type {
            LsaType::Name => self.name_seq,
            LsaType::Adjacency => self.adj_seq,
            LsaType::Coordinate => self.cor_seq,
            LsaType::Midst => self.midst_seq,
        }
    }

    pub fn set(&mut self, lsa_type: LsaType, seq_no: u64) {
        match lsa_type {
            LsaType::Name => self.name_seq = seq_no,
            LsaType::Adjacency => self.adj_seq = seq_no,
            LsaType::Coordinate => self.cor_seq = seq_no,
            LsaType::Midst => self.midst_seq = seq_no,
        }
    }

    pub fn increment(&mut self, lsa_type: LsaType) -> u64 {
        let seq_no = self.seq(lsa_type) + 1;
        self.set(lsa_type, seq_no);
        seq_no
    }

    // Restores the counters from the sequence file and applies the
    // mode-dependent recovery bumps. Counters of routing modes that are no
    // longer configured are cleared with a warning.
    //
    // A missing file leaves all counters at zero, without bumps.
    pub fn initiate(
        &mut self,
        hyperbolic_state: HyperbolicState,
        midst_state: MidstState,
    ) {
        if self.read_from_file().is_err() {
            return;
        }

        if midst_state == MidstState::Off {
            self.name_seq += RECOVERY_BUMP;
        }

        if hyperbolic_state != HyperbolicState::Off
            && midst_state == MidstState::On
        {
            warn!(
                "hyperbolic routing and MIDST should not be enabled at the \
                 same time"
            );
        }

        if hyperbolic_state != HyperbolicState::On {
            if self.cor_seq != 0 {
                warn!(
                    "this router was previously configured for hyperbolic \
                     routing without clearing the sequence number file"
                );
                self.cor_seq = 0;
            }
            if self.midst_seq != 0 {
                warn!(
                    "this router was previously configured for MIDST without \
                     clearing the sequence number file"
                );
                self.midst_seq = 0;
            }
            self.adj_seq += RECOVERY_BUMP;
        }

        if hyperbolic_state != HyperbolicState::Off {
            if self.adj_seq != 0 {
                warn!(
                    "this router was previously configured for link-state \
                     routing without clearing the sequence number file"
                );
                self.adj_seq = 0;
            }
            if self.midst_seq != 0 {
                warn!(
                    "this router was previously configured for MIDST without \
                     clearing the sequence number file"
                );
                self.midst_seq = 0;
            }
            self.cor_seq += RECOVERY_BUMP;
        }

        if midst_state == MidstState::On {
            if self.cor_seq != 0 {
                warn!(
                    "this router was previously configured for hyperbolic \
                     routing without clearing the sequence number file"
                );
                self.cor_seq = 0;
            }
            if self.name_seq != 0 {
                warn!(
                    "this router was previously configured for link-state \
                     routing without clearing the sequence number file"
                );
                self.name_seq = 0;
            }
            self.midst_seq += RECOVERY_BUMP;
        }

        Debug::SeqNoRestore(
            self.name_seq,
            self.adj_seq,
            self.cor_seq,
            self.midst_seq,
        )
        .log();
    }

    // Reads the four counters from the sequence file. The keys are for
    // human consumption only; values are read positionally.
    pub fn read_from_file(&mut self) -> io::Result<()> {
        let contents = fs::read_to_string(&self.file_path)?;
        let mut values = contents
            .split_whitespace()
            .skip(1)
            .step_by(2)
            .map(|token| token.parse::<u64>());

        let mut next = || {
            values
                .next()
                .transpose()
                .map_err(|error| {
                    io::Error::new(io::ErrorKind::InvalidData, error)
                })?
                .ok_or_else(|| {
                    io::Error::from(io::ErrorKind::UnexpectedEof)
                })
        };
        self.name_seq = next()?;
        self.adj_seq = next()?;
        self.cor_seq = next()?;
        self.midst_seq = next()?;
        Ok(())
    }

    // Persists the counters atomically (write to a temporary file, then
    // rename over the old one).
    pub fn write_to_file(&self) -> io::Result<()> {
        let tmp_path = self.file_path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        write!(
            file,
            "NameLsaSeq {}\nAdjLsaSeq {}\nCorLsaSeq {}\nMidstLsaSeq {}",
            self.name_seq, self.adj_seq, self.cor_seq, self.midst_seq
        )?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.file_path)
    }
}
