// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

//! Reverse projection of quads through an RML mapping.
//!
//! The mapping's row map describes the rows: every subject it could
//! have generated becomes one record, and every field its templates and
//! references consume becomes one column. Values are recovered by inverting
//! templates against the generated IRIs and by reading literal values back
//! out of the objects.

use crate::{
    error::Result,
    mapping::{Mapping, ObjectMap, ObjectSpec, RefObjectMap, TermSource, TermType, TriplesMap},
    template::Inversion,
    vocab,
};
use log::{debug, info};
use oxrdf::{NamedNode, NamedOrBlankNode, Quad, Term};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Columns and rows ready for CSV serialization. Every row has one cell per
/// column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Ordered column names, de-duplicated case-insensitively. Spaces in field
/// names become underscores.
#[derive(Debug, Default)]
struct Columns {
    names: Vec<String>,
}

impl Columns {
    fn add(&mut self, field: &str) {
        if self.index_of(field).is_none() {
            self.names.push(normalize(field));
        }
    }

    fn index_of(&self, field: &str) -> Option<usize> {
        let field = normalize(field);
        self.names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(&field))
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

fn normalize(field: &str) -> String {
    field.replace(' ', "_")
}

/// Recover the source table described by `mapping` from `quads`.
pub fn project(quads: &[Quad], mapping: &Mapping) -> Result<Table> {
    let timer = std::time::Instant::now();
    let projector = Projector::new(quads, mapping);

    let mut records: Vec<Vec<String>> = Vec::new();
    let mut rows_by_subject: HashMap<&NamedOrBlankNode, usize> = HashMap::new();
    let mut skipped = 0usize;

    for quad in quads {
        let specs = projector.by_predicate.get(&quad.predicate);
        if specs.is_none() && !projector.is_class_assertion(quad) {
            continue;
        }

        let row = match rows_by_subject.get(&quad.subject) {
            Some(row) => *row,
            None => {
                let Some(record) = projector.open_record(&quad.subject) else {
                    skipped += 1;
                    continue;
                };
                records.push(record);
                rows_by_subject.insert(&quad.subject, records.len() - 1);
                records.len() - 1
            }
        };

        for spec in specs.into_iter().flatten() {
            projector.apply(spec, &quad.object, &mut records[row]);
        }
    }

    if skipped > 0 {
        debug!("skipped {skipped} quads whose subject does not fit the subject map");
    }
    info!(
        "projected {} rows over {} columns in {:?}",
        records.len(),
        projector.columns.len(),
        timer.elapsed()
    );

    Ok(Table {
        columns: projector.columns.names,
        rows: records,
    })
}

struct Projector<'a> {
    mapping: &'a Mapping,
    row_map: &'a TriplesMap,
    columns: Columns,
    by_predicate: HashMap<&'a NamedNode, Vec<&'a ObjectSpec>>,
    by_subject: HashMap<&'a NamedOrBlankNode, Vec<&'a Quad>>,
}

impl<'a> Projector<'a> {
    fn new(quads: &'a [Quad], mapping: &'a Mapping) -> Self {
        let row_map = mapping.row_map();

        let mut columns = Columns::default();
        for field in source_fields(&row_map.subject_map.source) {
            columns.add(field);
        }
        let mut by_predicate: HashMap<&NamedNode, Vec<&ObjectSpec>> = HashMap::new();
        for pom in &row_map.predicate_object_maps {
            for spec in &pom.objects {
                match spec {
                    ObjectSpec::Map(om) => {
                        for field in object_map_fields(om) {
                            columns.add(field);
                        }
                    }
                    ObjectSpec::Ref(r) => {
                        for jc in &r.join_conditions {
                            columns.add(&jc.child);
                        }
                    }
                }
            }
            for predicate in &pom.predicates {
                by_predicate
                    .entry(predicate)
                    .or_default()
                    .extend(pom.objects.iter());
            }
        }
        debug!("columns: {:?}", columns.names);

        let mut by_subject: HashMap<&NamedOrBlankNode, Vec<&Quad>> = HashMap::new();
        if row_map.subject_map.term_type == TermType::BlankNode {
            for quad in quads {
                by_subject.entry(&quad.subject).or_default().push(quad);
            }
        }

        Self {
            mapping,
            row_map,
            columns,
            by_predicate,
            by_subject,
        }
    }

    fn is_class_assertion(&self, quad: &Quad) -> bool {
        quad.predicate.as_str() == vocab::RDF_TYPE
            && match &quad.object {
                Term::NamedNode(class) => self.row_map.subject_map.classes.contains(class),
                _ => false,
            }
    }

    /// A fresh record with the subject's own fields filled in, or `None` when
    /// the subject cannot have been generated by the row map.
    fn open_record(&self, subject: &NamedOrBlankNode) -> Option<Vec<String>> {
        let subject_map = &self.row_map.subject_map;
        let mut record = vec![String::new(); self.columns.len()];

        match subject {
            NamedOrBlankNode::NamedNode(iri) if subject_map.term_type == TermType::Iri => {
                match &subject_map.source {
                    TermSource::Template(template) => {
                        for (field, value) in template.invert(iri.as_str(), Inversion::Iri)? {
                            self.set(&mut record, field, value);
                        }
                    }
                    TermSource::Reference(field) => {
                        self.set(&mut record, field, iri.as_str().to_string())
                    }
                    TermSource::Constant(Term::NamedNode(constant)) if constant == iri => {}
                    TermSource::Constant(_) => return None,
                }
            }
            NamedOrBlankNode::BlankNode(_) if subject_map.term_type == TermType::BlankNode => {
                // labels are not stable, so fields come from the node's own properties
                let properties = self.by_subject.get(subject).map(Vec::as_slice).unwrap_or_default();
                for field in source_fields(&subject_map.source) {
                    let found = properties.iter().rev().find(|q| {
                        local_name(q.predicate.as_str()).eq_ignore_ascii_case(field)
                    });
                    if let Some(quad) = found {
                        self.set(&mut record, field, object_text(&quad.object));
                    }
                }
            }
            _ => return None,
        }
        Some(record)
    }

    fn apply(&self, spec: &ObjectSpec, object: &Term, record: &mut [String]) {
        match spec {
            ObjectSpec::Map(om) => self.apply_object_map(om, object, record),
            ObjectSpec::Ref(r) => self.apply_join(r, object, record),
        }
    }

    fn apply_object_map(&self, om: &ObjectMap, object: &Term, record: &mut [String]) {
        let literal = match object {
            Term::Literal(literal) => Some(literal),
            _ => None,
        };
        if let Some(tag) = &om.language {
            if !literal
                .and_then(|l| l.language())
                .is_some_and(|l| l.eq_ignore_ascii_case(tag))
            {
                return;
            }
        }
        if let Some(datatype) = &om.datatype {
            if !literal.is_some_and(|l| l.datatype() == datatype.as_ref()) {
                return;
            }
        }

        match &om.source {
            TermSource::Reference(field) => self.set(record, field, object_text(object)),
            TermSource::Template(template) => {
                let (generated, mode) = match object {
                    Term::NamedNode(iri) if om.term_type() == TermType::Iri => {
                        (iri.as_str(), Inversion::Iri)
                    }
                    Term::NamedNode(iri) => (iri.as_str(), Inversion::Literal),
                    Term::BlankNode(b) => (b.as_str(), Inversion::Literal),
                    Term::Literal(l) => (l.value(), Inversion::Literal),
                    #[allow(unreachable_patterns)]
                    _ => return,
                };
                match template.invert(generated, mode) {
                    Some(values) => {
                        for (field, value) in values {
                            self.set(record, field, value);
                        }
                    }
                    None => {
                        let text = object_text(object);
                        for (field, value) in template.placeholders().zip(text.split_whitespace())
                        {
                            self.set(record, field, value.to_string());
                        }
                    }
                }
            }
            TermSource::Constant(_) => {}
        }

        let Some(literal) = literal else {
            return;
        };
        if let (Some(field), Some(tag)) = (&om.language_reference, literal.language()) {
            self.set(record, field, tag.to_string());
        }
        match &om.datatype_source {
            Some(TermSource::Reference(field)) => {
                self.set(record, field, literal.datatype().as_str().to_string())
            }
            Some(TermSource::Template(template)) => {
                if let Some(values) = template.invert(literal.datatype().as_str(), Inversion::Iri)
                {
                    for (field, value) in values {
                        self.set(record, field, value);
                    }
                }
            }
            Some(TermSource::Constant(_)) | None => {}
        }
    }

    fn apply_join(&self, r: &RefObjectMap, object: &Term, record: &mut [String]) {
        let Term::NamedNode(iri) = object else {
            return;
        };
        let Some(parent) = self.mapping.get(&r.parent_triples_map) else {
            return;
        };
        let parent_values: Vec<(&str, String)> = match &parent.subject_map.source {
            TermSource::Template(template) => {
                template.invert(iri.as_str(), Inversion::Iri).unwrap_or_default()
            }
            TermSource::Reference(field) => vec![(field.as_str(), iri.as_str().to_string())],
            TermSource::Constant(_) => Vec::new(),
        };
        for jc in &r.join_conditions {
            if let Some((_, value)) = parent_values
                .iter()
                .find(|(field, _)| normalize(field).eq_ignore_ascii_case(&normalize(&jc.parent)))
            {
                self.set(record, &jc.child, value.clone());
            }
        }
    }

    fn set(&self, record: &mut [String], field: &str, value: String) {
        match self.columns.index_of(field) {
            Some(i) => record[i] = value,
            None => debug!("no column for field {field}"),
        }
    }
}

fn source_fields(source: &TermSource) -> Vec<&str> {
    match source {
        TermSource::Template(template) => template.placeholders().collect(),
        TermSource::Reference(field) => vec![field.as_str()],
        TermSource::Constant(_) => Vec::new(),
    }
}

fn object_map_fields(om: &ObjectMap) -> Vec<&str> {
    let mut fields = source_fields(&om.source);
    if let Some(field) = &om.language_reference {
        fields.push(field);
    }
    if let Some(source) = &om.datatype_source {
        fields.extend(source_fields(source));
    }
    fields
}

/// Text of an object as it would have appeared in the source: literal
/// values verbatim, IRIs as their decoded last path segment.
fn object_text(term: &Term) -> String {
    match term {
        Term::Literal(literal) => literal.value().to_string(),
        Term::NamedNode(iri) => last_path_segment(iri.as_str())
            .map(|segment| percent_decode_str(&segment).decode_utf8_lossy().into_owned())
            .unwrap_or_else(|| iri.as_str().to_string()),
        Term::BlankNode(b) => format!("blank_node_{}", b.as_str()),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}

fn last_path_segment(iri: &str) -> Option<String> {
    let url = url::Url::parse(iri).ok()?;
    // opaque paths (mailto:, urn:) have no segments but still a path
    let segment = match url.path_segments() {
        Some(segments) => segments.last()?,
        None => url.path().rsplit('/').next()?,
    };
    (!segment.is_empty()).then(|| segment.to_string())
}

fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}
