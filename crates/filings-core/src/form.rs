//! Periodic report form types.
//!
//! This module defines [`FormType`], the closed vocabulary of periodic forms the
//! pipeline requests, and [`FilingFormSet`], the subset a company actually files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// A periodic report form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormType {
    /// Annual report of a domestic issuer (10-K).
    AnnualDomestic,
    /// Quarterly report of a domestic issuer (10-Q).
    QuarterlyDomestic,
    /// Annual report of a foreign private issuer (20-F).
    AnnualForeignPrimary,
    /// Annual report of a Canadian issuer under MJDS (40-F).
    AnnualForeignSecondary,
}

impl FormType {
    /// All recognised forms, in the order they are reported.
    pub const ALL: [Self; 4] = [
        Self::AnnualDomestic,
        Self::QuarterlyDomestic,
        Self::AnnualForeignPrimary,
        Self::AnnualForeignSecondary,
    ];

    /// Returns the registry's form code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AnnualDomestic => "10-K",
            Self::QuarterlyDomestic => "10-Q",
            Self::AnnualForeignPrimary => "20-F",
            Self::AnnualForeignSecondary => "40-F",
        }
    }

    /// Parses an exact form code. Amendments and other forms return `None`.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "10-K" => Some(Self::AnnualDomestic),
            "10-Q" => Some(Self::QuarterlyDomestic),
            "20-F" => Some(Self::AnnualForeignPrimary),
            "40-F" => Some(Self::AnnualForeignSecondary),
            _ => None,
        }
    }

    /// Returns true for the annual forms.
    #[must_use]
    pub const fn is_annual(&self) -> bool {
        !matches!(self, Self::QuarterlyDomestic)
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FormType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(&s.to_uppercase())
            .ok_or_else(|| DataError::InvalidParameter(format!("unsupported form type: {s}")))
    }
}

/// The set of periodic forms requested for one company.
///
/// Derived once per run from the filing history (or from a caller hint) and
/// never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingFormSet(BTreeSet<FormType>);

impl FilingFormSet {
    /// Forms requested when neither discovery nor the caller supplies any.
    pub const DEFAULT: [FormType; 3] = [
        FormType::AnnualDomestic,
        FormType::QuarterlyDomestic,
        FormType::AnnualForeignPrimary,
    ];

    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Creates the default set.
    #[must_use]
    pub fn default_forms() -> Self {
        Self::DEFAULT.into_iter().collect()
    }

    /// Returns true if the set holds no forms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of forms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the form is part of the set.
    #[must_use]
    pub fn contains(&self, form: FormType) -> bool {
        self.0.contains(&form)
    }

    /// Iterates the forms in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = FormType> + '_ {
        self.0.iter().copied()
    }

    /// Returns the forms present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.0.intersection(&other.0).copied().collect()
    }

    /// Picks the forms to request given a discovered set and a caller hint.
    ///
    /// Discovered forms narrowed to the hint win; when that leaves nothing the
    /// discovered forms are used as-is. With nothing discovered the hint is used,
    /// and with no hint either the [`DEFAULT`](Self::DEFAULT) forms.
    #[must_use]
    pub fn select(discovered: &Self, hint: &Self) -> Self {
        if discovered.is_empty() {
            if hint.is_empty() {
                return Self::default_forms();
            }
            return hint.clone();
        }
        if hint.is_empty() {
            return discovered.clone();
        }
        let narrowed = discovered.intersection(hint);
        if narrowed.is_empty() {
            discovered.clone()
        } else {
            narrowed
        }
    }

    /// Renders the set as comma-separated form codes.
    #[must_use]
    pub fn codes(&self) -> String {
        self.iter().map(|f| f.code()).collect::<Vec<_>>().join(", ")
    }
}

impl FromIterator<FormType> for FilingFormSet {
    fn from_iter<I: IntoIterator<Item = FormType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FilingFormSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.codes())
    }
}
