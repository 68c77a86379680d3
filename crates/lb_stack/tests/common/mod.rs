#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use lb_stack::{BalanceCheck, StackConfig, ValueStack};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A stack that panics on any unbalanced scope.
pub fn fresh() -> ValueStack<'static> {
    ValueStack::with_config(StackConfig::default().with_balance(BalanceCheck::Panic)).unwrap()
}

pub fn strict() -> ValueStack<'static> {
    ValueStack::with_config(
        StackConfig::default()
            .with_balance(BalanceCheck::Panic)
            .strict(),
    )
    .unwrap()
}

pub fn write_script(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, source.trim_start()).unwrap();
    path
}
