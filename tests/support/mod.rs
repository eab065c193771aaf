//! Shared helpers for chunked-read integration tests
//!
//! `ScriptedSource` wraps an in-memory table and:
//! - records every count and range call with its exact arguments
//! - fails the count, or answers it without a number
//! - fails range calls at chosen offsets
//! - inserts or deletes rows right after a chosen range call, like a
//!   concurrent writer would

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde_json::{json, Value};

use largetable::query::{FilterSet, OrderBy, RowRange};
use largetable::source::{InMemorySource, QuerySource, SourceError, SourceResult};

pub const TABLE: &str = "users";

/// One call observed by the scripted source
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Count {
        table: String,
        select: String,
        filters: FilterSet,
    },
    Range {
        table: String,
        select: String,
        filters: FilterSet,
        order: OrderBy,
        range: RowRange,
    },
}

/// How the count query should misbehave
#[derive(Debug, Clone)]
pub enum CountFailure {
    Error(SourceError),
    NoCount,
}

/// Write applied after a range call completes
#[derive(Debug, Clone)]
pub enum Mutation {
    Insert(Value),
    Delete(Value),
}

#[derive(Debug, Default)]
struct Script {
    count_failure: Option<CountFailure>,
    failing_offsets: HashSet<u64>,
    /// Range call index (0-based, across passes) -> writes to apply after it
    mutations: HashMap<usize, Vec<Mutation>>,
}

/// Recording, fault-injecting wrapper over an in-memory table
#[derive(Debug)]
pub struct ScriptedSource {
    inner: InMemorySource,
    calls: Mutex<Vec<Call>>,
    script: Mutex<Script>,
}

impl ScriptedSource {
    pub fn new(inner: InMemorySource) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(Script::default()),
        }
    }

    /// `n` user rows with ids 1..=n, inserted in reverse so the source has
    /// to sort them
    pub fn with_users(n: u64) -> Self {
        let inner = InMemorySource::new();
        inner.insert_many(TABLE, (1..=n).rev().map(user)).unwrap();
        Self::new(inner)
    }

    pub fn inner(&self) -> &InMemorySource {
        &self.inner
    }

    pub fn fail_count(&self, failure: CountFailure) {
        self.script.lock().unwrap().count_failure = Some(failure);
    }

    pub fn fail_chunk_at(&self, offset: u64) {
        self.script.lock().unwrap().failing_offsets.insert(offset);
    }

    pub fn after_range_call(&self, index: usize, mutation: Mutation) {
        self.script
            .lock()
            .unwrap()
            .mutations
            .entry(index)
            .or_default()
            .push(mutation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Count { .. }))
            .count()
    }

    pub fn ranges(&self) -> Vec<RowRange> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Range { range, .. } => Some(range),
                Call::Count { .. } => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls
            .iter()
            .filter(|c| matches!(c, Call::Range { .. }))
            .count()
    }

    fn apply_mutations(&self, range_index: usize) {
        let mutations = self
            .script
            .lock()
            .unwrap()
            .mutations
            .remove(&range_index)
            .unwrap_or_default();

        for mutation in mutations {
            match mutation {
                Mutation::Insert(row) => self.inner.insert(TABLE, row).unwrap(),
                Mutation::Delete(id) => {
                    self.inner.delete(TABLE, "id", &id).unwrap();
                }
            }
        }
    }
}

impl QuerySource for ScriptedSource {
    async fn count(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
    ) -> SourceResult<Option<u64>> {
        self.record(Call::Count {
            table: table.to_string(),
            select: select.to_string(),
            filters: filters.clone(),
        });

        let failure = self.script.lock().unwrap().count_failure.clone();
        match failure {
            Some(CountFailure::Error(err)) => Err(err),
            Some(CountFailure::NoCount) => Ok(None),
            None => self.inner.count(table, select, filters).await,
        }
    }

    async fn select_range(
        &self,
        table: &str,
        select: &str,
        filters: &FilterSet,
        order: &OrderBy,
        range: RowRange,
    ) -> SourceResult<Vec<Value>> {
        let range_calls = self.record(Call::Range {
            table: table.to_string(),
            select: select.to_string(),
            filters: filters.clone(),
            order: order.clone(),
            range,
        });
        let index = range_calls - 1;

        let fails = self.script.lock().unwrap().failing_offsets.contains(&range.start);
        let result = if fails {
            Err(SourceError::backend("canceling statement due to statement timeout"))
        } else {
            self.inner
                .select_range(table, select, filters, order, range)
                .await
        };

        self.apply_mutations(index);
        result
    }
}

/// User row with a numeric id; every third user belongs to company `c1`
pub fn user(id: u64) -> Value {
    let company = if id % 3 == 0 { "c1" } else { "c2" };
    let role = match id % 4 {
        0 => "admin",
        1 => "editor",
        _ => "viewer",
    };
    json!({
        "id": id,
        "company_id": company,
        "role": role,
        "email": format!("user{}@example.com", id),
    })
}

/// Ids of JSON rows, in order
pub fn ids(rows: &[Value]) -> Vec<u64> {
    rows.iter().map(|r| r["id"].as_u64().unwrap()).collect()
}
