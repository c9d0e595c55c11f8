/// Tag attached to every ledger transaction created by the bridge
pub const BRIDGE_TAG: &str = "bpfs";

/// Default namespace of the account mapping tag stored in ledger account notes
pub const DEFAULT_MAPPING_NAMESPACE: &str = "fbs";

/// Minor units per major unit for the two-decimal amount convention
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Ledger status that is known to accompany a created transaction
pub const DEFAULT_TOLERATED_STATUS: u16 = 422;

/// Default capacity of the intake queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 2;

/// Default cap on concurrently running submissions
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;
