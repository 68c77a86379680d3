#![allow(dead_code)]

use std::path::PathBuf;

use lb_stack::{BalanceCheck, StackConfig, ValueStack};
use lb_table::{Schema, TableFunction, TableRecord};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn stack_with(config: StackConfig) -> ValueStack<'static> {
    let mut stack = ValueStack::with_config(config.with_balance(BalanceCheck::Panic)).unwrap();
    stack.run_script(fixture_path("player.lua")).unwrap();
    assert_eq!(stack.size(), 0);
    stack
}

/// A stack with `player.lua` loaded.
pub fn loaded() -> ValueStack<'static> {
    stack_with(StackConfig::default())
}

pub fn loaded_strict() -> ValueStack<'static> {
    stack_with(StackConfig::default().strict())
}

#[derive(Debug, Default)]
pub struct Player {
    pub name: String,
    pub level: i64,
    pub speed: f64,
    pub alive: bool,
    pub score: i64,
    pub fun: TableFunction<2, 2>,
    pub title: String,
}

impl TableRecord for Player {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .optional("Name", |p| &mut p.name)
            .optional("Level", |p| &mut p.level)
            .optional("Speed", |p| &mut p.speed)
            .optional("Alive", |p| &mut p.alive)
            .optional("Score", |p| &mut p.score)
            .required("Fun", |p| &mut p.fun)
            .optional("Title", |p| &mut p.title);
    }
}
