// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

//! RML vocabulary.
//!
//! Mappings found in the wild mix three namespaces: RML-Core
//! (`http://w3id.org/rml/`), W3C R2RML (`http://www.w3.org/ns/r2rml#`) and the
//! legacy RML namespace (`http://semweb.mmlab.be/ns/rml#`). A [`Term`] names a
//! local name and matches it under any of them.

/// RML-Core namespace
pub const RML_NS: &str = "http://w3id.org/rml/";
/// W3C R2RML namespace
pub const R2RML_NS: &str = "http://www.w3.org/ns/r2rml#";
/// Legacy RML namespace, used for `rml:reference` alongside `rr:` terms
pub const LEGACY_RML_NS: &str = "http://semweb.mmlab.be/ns/rml#";

const NAMESPACES: [&str; 3] = [RML_NS, R2RML_NS, LEGACY_RML_NS];

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// A vocabulary term identified by its local name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term(&'static str);

impl Term {
    /// True when `iri` is this term in one of the recognized namespaces.
    pub fn matches(&self, iri: &str) -> bool {
        NAMESPACES
            .iter()
            .any(|ns| iri.strip_prefix(ns) == Some(self.0))
    }
}

// triples maps
pub const SUBJECT_MAP: Term = Term("subjectMap");
pub const SUBJECT: Term = Term("subject");
pub const PREDICATE_OBJECT_MAP: Term = Term("predicateObjectMap");
pub const PREDICATE_MAP: Term = Term("predicateMap");
pub const PREDICATE: Term = Term("predicate");
pub const OBJECT_MAP: Term = Term("objectMap");
pub const OBJECT: Term = Term("object");
pub const GRAPH_MAP: Term = Term("graphMap");
pub const CLASS: Term = Term("class");

// term maps
pub const TEMPLATE: Term = Term("template");
pub const REFERENCE: Term = Term("reference");
/// `rr:column`, read as a reference
pub const COLUMN: Term = Term("column");
pub const CONSTANT: Term = Term("constant");
pub const TERM_TYPE: Term = Term("termType");
pub const LANGUAGE: Term = Term("language");
pub const LANGUAGE_MAP: Term = Term("languageMap");
pub const DATATYPE: Term = Term("datatype");
pub const DATATYPE_MAP: Term = Term("datatypeMap");

// reference object maps
pub const PARENT_TRIPLES_MAP: Term = Term("parentTriplesMap");
pub const JOIN_CONDITION: Term = Term("joinCondition");
pub const CHILD: Term = Term("child");
pub const PARENT: Term = Term("parent");

// term type values
pub const IRI: Term = Term("IRI");
pub const UNSAFE_IRI: Term = Term("UnsafeIRI");
pub const URI: Term = Term("URI");
pub const BLANK_NODE: Term = Term("BlankNode");
pub const LITERAL: Term = Term("Literal");
