//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use origin_ledger::{Ledger, LedgerConfig};
use origin_ledger_client::PollPolicy;
use origin_ledger_core::{Address, AddressPrefix, Direction, ExtendedKey, Keypair};
use origin_ledger_requests::{BatchBuilder, IssueGgo, PublishMeasurement};

use crate::ledger::MemoryLedger;

/// Sector used by fixture measurements.
pub const SECTOR: &str = "DK1";
pub const TECH_TYPE: &str = "T010101";
pub const FUEL_TYPE: &str = "F01010101";

/// Start of the fixture hour `hour` on 2020-01-01.
pub fn begin(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .single()
        .expect("fixed date is valid")
        + chrono::Duration::hours(i64::from(hour))
}

/// End of the fixture hour `hour`.
pub fn end(hour: u32) -> DateTime<Utc> {
    begin(hour + 1)
}

/// A participant with a deterministic key tree.
///
/// Layout: `m/0'` is the batch signing account, `m/1'/i` are meters and
/// `m/2'/i` are certificate keys received from trades.
#[derive(Debug, Clone)]
pub struct TestParty {
    pub master: ExtendedKey,
}

impl TestParty {
    /// Create a party from seed bytes.
    pub fn new(seed: &[u8]) -> Self {
        Self {
            master: ExtendedKey::from_entropy(seed).expect("fixture seed yields a valid key"),
        }
    }

    /// Create a party with a random key tree.
    pub fn random() -> Self {
        Self {
            master: ExtendedKey::generate(),
        }
    }

    fn child(&self, branch: u32, index: u32) -> ExtendedKey {
        self.master
            .derive_hardened(branch)
            .and_then(|k| k.derive(index))
            .expect("fixture indices are in range")
    }

    /// Key signing this party's batches.
    pub fn account(&self) -> Keypair {
        self.master
            .derive_hardened(0)
            .and_then(|k| k.keypair())
            .expect("account key is private")
    }

    /// Key of meter `index`.
    pub fn meter(&self, index: u32) -> ExtendedKey {
        self.child(1, index)
    }

    /// Key for a received certificate.
    pub fn ggo_key(&self, index: u32) -> ExtendedKey {
        self.child(2, index)
    }

    pub fn measurement_address(&self, meter: u32) -> Address {
        self.meter(meter).address(AddressPrefix::Measurement)
    }

    /// Address of the certificate issued against meter `index`.
    pub fn issued_ggo_address(&self, meter: u32) -> Address {
        self.meter(meter).address(AddressPrefix::Ggo)
    }

    pub fn ggo_address(&self, index: u32) -> Address {
        self.ggo_key(index).address(AddressPrefix::Ggo)
    }

    /// An empty batch signed by the account key.
    pub fn batch(&self) -> BatchBuilder {
        BatchBuilder::new(self.account())
    }

    /// Publish `amount` on meter `meter` for fixture hour 0.
    pub fn publish(&self, meter: u32, amount: u64, direction: Direction) -> PublishMeasurement {
        PublishMeasurement::new(self.meter(meter), amount, begin(0), end(0), SECTOR, direction)
    }

    /// Issue a certificate against meter `meter`.
    pub fn issue(&self, meter: u32) -> IssueGgo {
        IssueGgo::new(self.meter(meter), TECH_TYPE, FUEL_TYPE)
    }
}

/// Create several parties with distinct deterministic seeds.
pub fn parties(count: usize) -> Vec<TestParty> {
    (0..count)
        .map(|i| TestParty::new(format!("origin ledger party {}", i).as_bytes()))
        .collect()
}

/// A polling policy that settles within milliseconds.
pub fn fast_poll() -> PollPolicy {
    PollPolicy::fixed(Duration::from_millis(1), 20)
}

/// A fresh in-memory ledger and a facade connected to it.
pub fn memory_ledger() -> (Arc<MemoryLedger>, Ledger<Arc<MemoryLedger>>) {
    let memory = Arc::new(MemoryLedger::new());
    let config = LedgerConfig::new(memory.base_url()).with_poll(fast_poll());
    let ledger = Ledger::new(Arc::clone(&memory), config);
    (memory, ledger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_keys_are_distinct() {
        let party = TestParty::new(b"fixture tests");
        assert_ne!(party.meter(0).public_key(), party.meter(1).public_key());
        assert_ne!(party.meter(0).public_key(), party.ggo_key(0).public_key());
        assert_ne!(party.issued_ggo_address(0), party.ggo_address(0));
    }

    #[test]
    fn test_parties_are_deterministic() {
        let a = parties(3);
        let b = parties(3);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.master.public_key(), y.master.public_key());
        }
        assert_ne!(a[0].master.public_key(), a[1].master.public_key());
    }

    #[test]
    fn test_fixture_hours() {
        assert_eq!(end(0) - begin(0), chrono::Duration::hours(1));
        assert_eq!(begin(1), end(0));
    }
}
