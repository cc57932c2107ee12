#![allow(dead_code)]

pub mod mocks;

use std::collections::HashMap;
use storefront::utils::config::Config;

pub const TEST_JWT_SECRET: &str = "test_jwt_secret_key_for_testing_only";

/// Configuration for tests: in-memory database, development mode.
pub fn test_config(overrides: &[(&'static str, &'static str)]) -> Config {
    let mut vars: HashMap<&'static str, &'static str> = HashMap::from([
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("DATABASE_URL", ":memory:"),
        ("CLOUDINARY_CLOUD_NAME", "demo"),
        ("CLOUDINARY_API_KEY", "key"),
        ("CLOUDINARY_API_SECRET", "secret"),
        ("PUBLIC_DIR", "tests/fixtures/public"),
    ]);
    vars.extend(overrides.iter().copied());

    Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
        .expect("test config should load")
}
