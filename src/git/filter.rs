//! Author filtering for history and diff views.
//!
//! One tagged value, one predicate: callers never branch on the mode, they ask
//! `admits` (single author) or `admits_any` (every author of a file).
//! Emails compare case-insensitively.

use std::collections::HashSet;

use crate::models::AuthorInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorFilter {
    /// Everyone except these emails.
    Exclude(HashSet<String>),
    /// Only these emails.
    Include(HashSet<String>),
}

fn normalize<I, S>(emails: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    emails
        .into_iter()
        .map(|e| e.as_ref().trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

impl AuthorFilter {
    pub fn exclude<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AuthorFilter::Exclude(normalize(emails))
    }

    pub fn include<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AuthorFilter::Include(normalize(emails))
    }

    /// Build a filter from comma-separated query values. `include` wins when
    /// both are present; empty lists mean no filter.
    pub fn from_query(exclude: Option<&str>, include: Option<&str>) -> Option<Self> {
        let include = Self::include(include.unwrap_or("").split(','));
        if matches!(&include, AuthorFilter::Include(set) if !set.is_empty()) {
            return Some(include);
        }
        let exclude = Self::exclude(exclude.unwrap_or("").split(','));
        (!exclude.is_noop()).then_some(exclude)
    }

    /// An exclusion of nobody filters nothing.
    pub fn is_noop(&self) -> bool {
        matches!(self, AuthorFilter::Exclude(set) if set.is_empty())
    }

    pub fn admits(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        match self {
            AuthorFilter::Exclude(set) => !set.contains(&email),
            AuthorFilter::Include(set) => set.contains(&email),
        }
    }

    /// True when at least one of `emails` passes. An empty author list never
    /// passes: Exclude covers it vacuously, Include has nobody to keep.
    pub fn admits_any<'a, I>(&self, emails: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        emails.into_iter().any(|email| self.admits(email))
    }

    /// The equivalent exclusion list against a known roster, the form the
    /// HTTP boundary transmits.
    pub fn to_exclusion(&self, roster: &[AuthorInfo]) -> HashSet<String> {
        match self {
            AuthorFilter::Exclude(set) => set.clone(),
            AuthorFilter::Include(_) => roster
                .iter()
                .filter(|a| !self.admits(&a.email))
                .map(|a| a.email.trim().to_lowercase())
                .collect(),
        }
    }
}

/// Sorted exclusion list for a response; empty without a filter.
pub(crate) fn exclusion_list(filter: Option<&AuthorFilter>, roster: &[AuthorInfo]) -> Vec<String> {
    let mut excluded: Vec<String> = filter
        .map(|f| f.to_exclusion(roster).into_iter().collect())
        .unwrap_or_default();
    excluded.sort();
    excluded
}
