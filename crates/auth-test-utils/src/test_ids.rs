//! Fixed test identifiers for deterministic tests

// Tenant
pub const TEST_DOMAIN: &str = "casting.test.auth0.com";
pub const TEST_ISSUER: &str = "https://casting.test.auth0.com/";
pub const TEST_AUDIENCE: &str = "casting";

// Signing Key IDs
pub const TEST_KEY_ID_1: &str = "K1";
pub const TEST_KEY_ID_2: &str = "K2";

// Subjects
pub const TEST_USER_ALICE: &str = "auth0|alice";
pub const TEST_USER_BOB: &str = "auth0|bob";
