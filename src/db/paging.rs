//! Cursor pagination clauses for the listing queries.
//!
//! A [`Page`] appends its cursor comparison, ordering and limit to a
//! `sqlx::QueryBuilder`. Every value is bound as a parameter; only column
//! expressions chosen by the caller are pushed as SQL text.

use sqlx::{Encode, Postgres, QueryBuilder, Type};

use crate::models::ListQuery;

/// Whether the cursor row itself belongs to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Inclusive,
    Exclusive,
}

/// Cursor, direction and size of one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<C> {
    pub since: Option<C>,
    pub desc: bool,
    /// 0 means unbounded
    pub limit: u32,
}

impl<C> Default for Page<C> {
    fn default() -> Self {
        Self {
            since: None,
            desc: false,
            limit: 0,
        }
    }
}

impl<C> From<ListQuery<C>> for Page<C> {
    fn from(query: ListQuery<C>) -> Self {
        Self {
            since: query.since,
            desc: query.desc,
            limit: query.limit,
        }
    }
}

impl<C> Page<C> {
    /// Comparison operator selecting rows at or beyond the cursor
    pub fn comparison(&self, bound: Bound) -> &'static str {
        match (self.desc, bound) {
            (false, Bound::Inclusive) => ">=",
            (false, Bound::Exclusive) => ">",
            (true, Bound::Inclusive) => "<=",
            (true, Bound::Exclusive) => "<",
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.desc {
            "DESC"
        } else {
            "ASC"
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.limit > 0
    }

    /// Append ` ORDER BY k1 <dir>, k2 <dir>, ...`
    pub fn push_order<'args>(&self, qb: &mut QueryBuilder<'args, Postgres>, keys: &[&str]) {
        qb.push(" ORDER BY ");
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*key).push(" ").push(self.direction());
        }
    }

    /// Append ` LIMIT $n` when the page is bounded
    pub fn push_limit<'args>(&self, qb: &mut QueryBuilder<'args, Postgres>) {
        if self.is_bounded() {
            qb.push(" LIMIT ").push_bind(i64::from(self.limit));
        }
    }
}

impl<C: Clone> Page<C> {
    /// Append ` AND <lhs> <op> <rhs>` when a cursor is set; `rhs` pushes the
    /// right-hand side (typically a bind or a subquery over one).
    pub fn push_cursor<'args, F>(
        &self,
        qb: &mut QueryBuilder<'args, Postgres>,
        lhs: &str,
        bound: Bound,
        rhs: F,
    ) where
        F: FnOnce(&mut QueryBuilder<'args, Postgres>, C),
    {
        if let Some(since) = self.since.clone() {
            qb.push(" AND ")
                .push(lhs)
                .push(" ")
                .push(self.comparison(bound))
                .push(" ");
            rhs(qb, since);
        }
    }

    /// Append ` AND <column> <op> $n` when a cursor is set
    pub fn push_since<'args>(
        &self,
        qb: &mut QueryBuilder<'args, Postgres>,
        column: &str,
        bound: Bound,
    ) where
        C: 'args + Encode<'args, Postgres> + Type<Postgres>,
    {
        self.push_cursor(qb, column, bound, |qb, since| {
            qb.push_bind(since);
        });
    }
}
