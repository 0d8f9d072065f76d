//! Tests for store handles: modes, reads and writes, recovery, compaction

mod basic_tests;
mod recovery_tests;
