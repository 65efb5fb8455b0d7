//! XBRL instance and presentation linkbase parsing.
//!
//! The instance supplies contexts, units and numeric facts; the presentation
//! linkbase says which concepts appear on which statement. Only facts whose
//! context carries no dimensions are kept, so segment breakdowns never mix
//! with consolidated totals.

use filings_core::{DataError, Period, Result, StatementKind};
use roxmltree::{Document, Node};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::trace;

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Role URI fragments that mark supporting (non-primary) presentation roles.
const SKIPPED_ROLE_MARKERS: &[&str] = &["PARENTHETICAL", "DETAIL", "TABLES", "POLICIES", "NARRATIVE"];

/// A numeric fact of an XBRL instance.
#[derive(Debug, Clone, PartialEq)]
pub struct XbrlFact {
    /// Concept local name (e.g. "Assets").
    pub concept: String,
    /// Context period.
    pub period: Period,
    /// Reported value.
    pub value: f64,
    /// Unit (e.g. "USD", "shares", "USD/shares").
    pub unit: String,
}

/// Facts and document metadata of one XBRL instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XbrlInstance {
    /// Numeric facts in non-dimensional contexts.
    pub facts: Vec<XbrlFact>,
    /// `dei:DocumentFiscalYearFocus`, when reported.
    pub fiscal_year: Option<i32>,
    /// `dei:DocumentFiscalPeriodFocus`, when reported.
    pub fiscal_period: Option<String>,
}

/// Concepts presented on each primary statement.
pub type StatementConcepts = BTreeMap<StatementKind, BTreeSet<String>>;

fn local_name<'a>(node: &Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.descendants()
        .find(|n| n.is_element() && local_name(n) == name)
        .and_then(|n| n.text())
        .map(str::trim)
}

fn strip_prefix(measure: &str) -> &str {
    measure.rsplit(':').next().unwrap_or(measure).trim()
}

fn parse_context(node: Node<'_, '_>) -> Option<Result<Period>> {
    let dimensional = node.descendants().any(|n| {
        n.is_element()
            && matches!(local_name(&n), "segment" | "scenario")
            && n.children().any(|c| c.is_element())
    });
    if dimensional {
        return None;
    }

    let period = node
        .children()
        .find(|n| n.is_element() && local_name(n) == "period")?;
    Some(match child_text(period, "instant") {
        Some(instant) => Period::parse(None, instant),
        None => match child_text(period, "endDate") {
            Some(end) => Period::parse(child_text(period, "startDate"), end),
            None => Err(DataError::Parse("context period has no dates".to_string())),
        },
    })
}

fn parse_unit(node: Node<'_, '_>) -> String {
    let measures = |parent: &str| {
        node.descendants()
            .filter(|n| n.is_element() && local_name(n) == parent)
            .flat_map(|p| p.descendants())
            .filter(|n| n.is_element() && local_name(n) == "measure")
            .filter_map(|n| n.text())
            .map(strip_prefix)
            .collect::<Vec<_>>()
            .join("*")
    };

    let numerator = measures("unitNumerator");
    if !numerator.is_empty() {
        return format!("{}/{}", numerator, measures("unitDenominator"));
    }

    node.children()
        .filter(|n| n.is_element() && local_name(n) == "measure")
        .filter_map(|n| n.text())
        .map(strip_prefix)
        .collect::<Vec<_>>()
        .join("*")
}

fn is_nil(node: &Node<'_, '_>) -> bool {
    node.attributes()
        .any(|a| a.name() == "nil" && a.value().trim() == "true")
}

/// Parses an XBRL instance document.
pub fn parse_instance(xml: &str) -> Result<XbrlInstance> {
    let doc = Document::parse(xml).map_err(|e| DataError::Parse(format!("XBRL instance: {}", e)))?;
    let root = doc.root_element();

    let mut contexts: HashMap<&str, Period> = HashMap::new();
    let mut units: HashMap<&str, String> = HashMap::new();

    for node in root.children().filter(Node::is_element) {
        match local_name(&node) {
            "context" => {
                let Some(id) = node.attribute("id") else {
                    continue;
                };
                match parse_context(node) {
                    Some(Ok(period)) => {
                        contexts.insert(id, period);
                    }
                    Some(Err(e)) => trace!(context = id, error = %e, "Skipping context"),
                    None => {}
                }
            }
            "unit" => {
                if let Some(id) = node.attribute("id") {
                    units.insert(id, parse_unit(node));
                }
            }
            _ => {}
        }
    }

    let mut instance = XbrlInstance::default();
    for node in root.children().filter(Node::is_element) {
        let name = local_name(&node);
        match name {
            "DocumentFiscalYearFocus" => {
                instance.fiscal_year = node.text().and_then(|t| t.trim().parse().ok());
                continue;
            }
            "DocumentFiscalPeriodFocus" => {
                instance.fiscal_period = node.text().map(|t| t.trim().to_string());
                continue;
            }
            _ => {}
        }

        let (Some(context_ref), Some(unit_ref)) = (node.attribute("contextRef"), node.attribute("unitRef"))
        else {
            continue;
        };
        if is_nil(&node) {
            continue;
        }
        let Some(period) = contexts.get(context_ref) else {
            continue;
        };
        let Some(value) = node.text().and_then(|t| t.trim().parse::<f64>().ok()) else {
            trace!(concept = name, "Skipping non-numeric fact");
            continue;
        };

        instance.facts.push(XbrlFact {
            concept: name.to_string(),
            period: *period,
            value,
            unit: units
                .get(unit_ref)
                .cloned()
                .unwrap_or_else(|| unit_ref.to_string()),
        });
    }

    Ok(instance)
}

/// Classifies a presentation role URI as a primary statement.
///
/// Supporting roles (parenthetical, details, tables, policies) return `None`.
#[must_use]
pub fn classify_role(role_uri: &str) -> Option<StatementKind> {
    let name = role_uri.rsplit('/').next().unwrap_or(role_uri).to_uppercase();
    if SKIPPED_ROLE_MARKERS.iter().any(|m| name.contains(m)) {
        return None;
    }

    let is_statement = name.contains("STATEMENT");
    if name.contains("CASHFLOW") && is_statement {
        Some(StatementKind::CashFlow)
    } else if name.contains("BALANCESHEET")
        || name.contains("FINANCIALPOSITION")
        || name.contains("FINANCIALCONDITION")
    {
        Some(StatementKind::BalanceSheet)
    } else if is_statement
        && (name.contains("OPERATIONS") || name.contains("INCOME") || name.contains("EARNINGS"))
    {
        Some(StatementKind::IncomeStatement)
    } else {
        None
    }
}

/// Concept local name of a locator href (`x.xsd#us-gaap_Assets` -> `Assets`).
fn locator_concept(href: &str) -> Option<&str> {
    let fragment = href.rsplit_once('#')?.1;
    let concept = fragment.split_once('_').map_or(fragment, |(_, c)| c);
    (!concept.is_empty()).then_some(concept)
}

/// Parses a presentation linkbase into the concepts of each primary statement.
pub fn parse_presentation(xml: &str) -> Result<StatementConcepts> {
    let doc = Document::parse(xml)
        .map_err(|e| DataError::Parse(format!("presentation linkbase: {}", e)))?;

    let mut concepts = StatementConcepts::new();
    for link in doc
        .descendants()
        .filter(|n| n.is_element() && local_name(n) == "presentationLink")
    {
        let Some(role) = link.attribute((XLINK_NS, "role")) else {
            continue;
        };
        let Some(kind) = classify_role(role) else {
            trace!(role, "Skipping presentation role");
            continue;
        };

        let entry = concepts.entry(kind).or_default();
        for loc in link
            .children()
            .filter(|n| n.is_element() && local_name(n) == "loc")
        {
            if let Some(concept) = loc.attribute((XLINK_NS, "href")).and_then(locator_concept) {
                entry.insert(concept.to_string());
            }
        }
    }

    Ok(concepts)
}

/// Picks the instance and presentation documents from an archive folder listing.
///
/// Returns `(instance, presentation)`; either may be missing.
#[must_use]
pub fn locate_documents<'a>(names: impl IntoIterator<Item = &'a str>) -> (Option<&'a str>, Option<&'a str>) {
    const LINKBASE_SUFFIXES: &[&str] = &["_cal.xml", "_def.xml", "_lab.xml", "_pre.xml", "_ref.xml"];

    let mut inline_instance = None;
    let mut plain_instance = None;
    let mut presentation = None;

    for name in names {
        let lower = name.to_lowercase();
        if lower.ends_with("_pre.xml") {
            presentation.get_or_insert(name);
        } else if lower.ends_with("_htm.xml") {
            inline_instance.get_or_insert(name);
        } else if lower.ends_with(".xml")
            && !LINKBASE_SUFFIXES.iter().any(|s| lower.ends_with(s))
            && lower != "filingsummary.xml"
        {
            plain_instance.get_or_insert(name);
        }
    }

    (inline_instance.or(plain_instance), presentation)
}
