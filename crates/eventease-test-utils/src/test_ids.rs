//! Fixed test IDs and credentials for deterministic tests.

/// Signing secret the test server is configured with.
pub const TEST_JWT_SECRET: &str = "eventease-test-secret-do-not-use-in-production";

/// A different secret, for tokens that must fail signature checks.
pub const TEST_WRONG_JWT_SECRET: &str = "some-other-secret-that-the-server-never-saw";

/// Lowest bcrypt cost, keeps registration fast in tests.
pub const TEST_BCRYPT_COST: &str = "4";

pub const TEST_PASSWORD: &str = "correct-horse-battery";

// User IDs for hand-crafted tokens
pub const TEST_USER_ALICE: &str = "00000000-0000-0000-0000-000000000064";
pub const TEST_USER_BOB: &str = "00000000-0000-0000-0000-000000000065";
pub const TEST_USER_CHARLIE: &str = "00000000-0000-0000-0000-000000000066";

pub const TEST_EVENT_MISSING: &str = "00000000-0000-0000-0000-0000000003e7";
