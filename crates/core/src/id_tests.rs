// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn new_ids_carry_prefix_and_are_unique() {
    let a = TestId::new();
    let b = TestId::new();
    assert!(a.as_str().starts_with("tst-"));
    assert_eq!(a.suffix().len(), 19);
    assert_ne!(a, b);
}

#[test]
fn hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(TestId::from_string("tst-k"), 42);
    assert_eq!(map.get("tst-k"), Some(&42));
}

#[yare::parameterized(
    truncates   = { "tst-abcdefghijklmnop", 8, "abcdefgh" },
    shorter     = { "tst-abc",              8, "abc" },
    exact       = { "tst-abcdefgh",         8, "abcdefgh" },
    no_prefix   = { "abcdefghij",           4, "abcd" },
)]
fn short_uses_suffix(id: &str, n: usize, expected: &str) {
    assert_eq!(TestId::from_string(id).short(n), expected);
}

#[test]
fn serde_is_transparent() {
    let id = TestId::from_string("tst-xyz");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tst-xyz\"");
    let parsed: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn free_short_truncates() {
    assert_eq!(short("abcdef", 3), "abc");
    assert_eq!(short("ab", 3), "ab");
}
