//! Typed filter predicates for message queries.
//!
//! Callers compose a `MessageFilter` from typed predicates; the store
//! translates it into a SQL `WHERE` clause with bound parameters. Values
//! never reach the SQL text itself, so caller-supplied strings cannot
//! inject query fragments, and the query shape stays independent of the
//! storage engine's query language.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

/// A single conjunct of a message query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `from_msisdn = value`
    SenderEq(String),

    /// `received_at >= value`
    ReceivedSince(DateTime<Utc>),

    /// `text LIKE %value%`
    BodyContains(String),
}

/// A conjunction of zero or more predicates.
///
/// An empty filter matches every message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    predicates: Vec<Predicate>,
}

impl MessageFilter {
    pub fn new() -> Self {
        MessageFilter::default()
    }

    pub fn sender_eq(mut self, sender: impl Into<String>) -> Self {
        self.predicates.push(Predicate::SenderEq(sender.into()));
        self
    }

    pub fn received_since(mut self, since: DateTime<Utc>) -> Self {
        self.predicates.push(Predicate::ReceivedSince(since));
        self
    }

    pub fn body_contains(mut self, needle: impl Into<String>) -> Self {
        self.predicates.push(Predicate::BodyContains(needle.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Appends this filter's `WHERE` clause (if any) to a query under
    /// construction, binding every value as a parameter.
    pub(crate) fn apply(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let mut sep = " WHERE ";
        for predicate in &self.predicates {
            qb.push(sep);
            sep = " AND ";
            match predicate {
                Predicate::SenderEq(sender) => {
                    qb.push("from_msisdn = ");
                    qb.push_bind(sender.clone());
                }
                Predicate::ReceivedSince(since) => {
                    qb.push("received_at >= ");
                    qb.push_bind(*since);
                }
                Predicate::BodyContains(needle) => {
                    qb.push("text LIKE ");
                    qb.push_bind(format!("%{}%", needle));
                }
            }
        }
    }
}
