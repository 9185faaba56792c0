// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

//! RML mapping model and its extraction from a parsed mapping graph.

use crate::{
    error::{Error, Result},
    template::Template,
    vocab,
};
use log::debug;
use oxrdf::{NamedNode, NamedOrBlankNode, Quad, Term};
use std::collections::HashMap;

/// Kind of RDF term a term map generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermType {
    #[default]
    Iri,
    BlankNode,
    Literal,
}

impl TermType {
    pub fn from_iri(iri: &str) -> Option<Self> {
        if vocab::IRI.matches(iri) || vocab::UNSAFE_IRI.matches(iri) || vocab::URI.matches(iri) {
            Some(TermType::Iri)
        } else if vocab::BLANK_NODE.matches(iri) {
            Some(TermType::BlankNode)
        } else if vocab::LITERAL.matches(iri) {
            Some(TermType::Literal)
        } else {
            None
        }
    }
}

/// Where a term map takes its value from.
#[derive(Debug, Clone, PartialEq)]
pub enum TermSource {
    Template(Template),
    /// A source field, `rml:reference` or `rr:column`
    Reference(String),
    Constant(Term),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectMap {
    pub source: TermSource,
    pub term_type: TermType,
    pub classes: Vec<NamedNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMap {
    pub source: TermSource,
    pub term_type: Option<TermType>,
    pub language: Option<String>,
    /// Field receiving the language tag, from `rml:languageMap`
    pub language_reference: Option<String>,
    pub datatype: Option<NamedNode>,
    pub datatype_source: Option<TermSource>,
}

impl ObjectMap {
    /// The declared term type, or the default the source implies.
    pub fn term_type(&self) -> TermType {
        if let Some(term_type) = self.term_type {
            return term_type;
        }
        let typed_literal = self.language.is_some()
            || self.language_reference.is_some()
            || self.datatype.is_some()
            || self.datatype_source.is_some();
        match &self.source {
            TermSource::Reference(_) => TermType::Literal,
            TermSource::Template(_) if typed_literal => TermType::Literal,
            TermSource::Template(_) => TermType::Iri,
            TermSource::Constant(Term::Literal(_)) => TermType::Literal,
            TermSource::Constant(Term::BlankNode(_)) => TermType::BlankNode,
            TermSource::Constant(_) => TermType::Iri,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub child: String,
    pub parent: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefObjectMap {
    pub parent_triples_map: NamedOrBlankNode,
    pub join_conditions: Vec<JoinCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectSpec {
    Map(ObjectMap),
    Ref(RefObjectMap),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredicateObjectMap {
    pub predicates: Vec<NamedNode>,
    pub objects: Vec<ObjectSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriplesMap {
    pub id: NamedOrBlankNode,
    pub subject_map: SubjectMap,
    pub predicate_object_maps: Vec<PredicateObjectMap>,
}

impl TriplesMap {
    /// Ids of the triples maps this one joins to.
    pub fn parents(&self) -> impl Iterator<Item = &NamedOrBlankNode> {
        self.predicate_object_maps
            .iter()
            .flat_map(|p| &p.objects)
            .filter_map(|spec| match spec {
                ObjectSpec::Ref(r) => Some(&r.parent_triples_map),
                ObjectSpec::Map(_) => None,
            })
    }
}

/// Triples maps in document order. Never empty.
#[derive(Debug, Clone)]
pub struct Mapping {
    triples_maps: Vec<TriplesMap>,
    /// Index of the row map
    row: usize,
}

impl Mapping {
    pub fn from_quads(quads: &[Quad]) -> Result<Self> {
        let triples_maps = MappingExtractor::new(quads).extract_all()?;
        if triples_maps.is_empty() {
            return Err(Error::Mapping(
                "no subject template found in the RML mapping".to_string(),
            ));
        }

        for tm in &triples_maps {
            for parent in tm.parents() {
                if !triples_maps.iter().any(|t| &t.id == parent) {
                    return Err(Error::Mapping(format!(
                        "unknown parent triples map {parent} referenced from {}",
                        tm.id
                    )));
                }
            }
        }

        let row = triples_maps
            .iter()
            .position(|tm| {
                !triples_maps
                    .iter()
                    .any(|other| other.id != tm.id && other.parents().any(|p| p == &tm.id))
            })
            .unwrap_or(0);
        if row > 0 {
            debug!(
                "{} is joined to by another map, using {} for rows",
                triples_maps[0].id, triples_maps[row].id
            );
        }

        debug!("extracted {} triples maps", triples_maps.len());
        Ok(Self { triples_maps, row })
    }

    /// The triples map whose subjects become rows: the first one that no other
    /// map joins to, or the first one overall when every map is a parent.
    pub fn row_map(&self) -> &TriplesMap {
        &self.triples_maps[self.row]
    }

    pub fn get(&self, id: &NamedOrBlankNode) -> Option<&TriplesMap> {
        self.triples_maps.iter().find(|tm| &tm.id == id)
    }

    pub fn triples_maps(&self) -> &[TriplesMap] {
        &self.triples_maps
    }
}

struct MappingExtractor<'a> {
    by_subject: HashMap<NamedOrBlankNode, Vec<&'a Quad>>,
    /// Subjects in first-seen order
    subjects: Vec<&'a NamedOrBlankNode>,
}

impl<'a> MappingExtractor<'a> {
    fn new(quads: &'a [Quad]) -> Self {
        let mut by_subject: HashMap<NamedOrBlankNode, Vec<&Quad>> = HashMap::new();
        let mut subjects = Vec::new();
        for quad in quads {
            let entry = by_subject.entry(quad.subject.clone()).or_default();
            if entry.is_empty() {
                subjects.push(&quad.subject);
            }
            entry.push(quad);
        }
        Self {
            by_subject,
            subjects,
        }
    }

    fn extract_all(&self) -> Result<Vec<TriplesMap>> {
        self.subjects
            .iter()
            .filter(|s| {
                self.object(s, vocab::SUBJECT_MAP).is_some()
                    || self.object(s, vocab::SUBJECT).is_some()
            })
            .map(|s| self.extract_triples_map(s))
            .collect()
    }

    fn extract_triples_map(&self, id: &NamedOrBlankNode) -> Result<TriplesMap> {
        let subject_map = self.extract_subject_map(id)?;
        let predicate_object_maps = self
            .objects(id, vocab::PREDICATE_OBJECT_MAP)
            .map(|pom| {
                let node = as_node(pom).ok_or_else(|| {
                    Error::Mapping(format!("predicate-object map of {id} is a literal"))
                })?;
                self.extract_predicate_object_map(id, &node)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TriplesMap {
            id: id.clone(),
            subject_map,
            predicate_object_maps,
        })
    }

    fn extract_subject_map(&self, tm: &NamedOrBlankNode) -> Result<SubjectMap> {
        if let Some(constant) = self.object(tm, vocab::SUBJECT) {
            if let Term::Literal(_) = constant {
                return Err(Error::Mapping(format!(
                    "constant subject of {tm} is a literal"
                )));
            }
            return Ok(SubjectMap {
                source: TermSource::Constant(constant.clone()),
                term_type: TermType::Iri,
                classes: Vec::new(),
            });
        }

        let node = self
            .object(tm, vocab::SUBJECT_MAP)
            .and_then(as_node)
            .ok_or_else(|| Error::Mapping(format!("subject map of {tm} is not a node")))?;

        let source = self.term_source(&node)?.ok_or_else(|| {
            Error::Mapping(format!(
                "no subject template found in the RML mapping for {tm}"
            ))
        })?;

        let term_type = match self.term_type(&node)? {
            Some(term_type) => Some(term_type),
            None => match self.object(&node, vocab::GRAPH_MAP).and_then(as_node) {
                Some(graph_map) => self.term_type(&graph_map)?,
                None => None,
            },
        }
        .unwrap_or_default();

        if term_type == TermType::Literal {
            return Err(Error::Mapping(format!(
                "subject term type of {tm} is Literal, which is not allowed"
            )));
        }

        let classes = self
            .objects(&node, vocab::CLASS)
            .filter_map(|c| match c {
                Term::NamedNode(n) => Some(n.clone()),
                _ => None,
            })
            .collect();

        Ok(SubjectMap {
            source,
            term_type,
            classes,
        })
    }

    fn extract_predicate_object_map(
        &self,
        tm: &NamedOrBlankNode,
        node: &NamedOrBlankNode,
    ) -> Result<PredicateObjectMap> {
        let mut predicates: Vec<NamedNode> = self
            .objects(node, vocab::PREDICATE)
            .filter_map(|p| match p {
                Term::NamedNode(n) => Some(n.clone()),
                _ => None,
            })
            .collect();
        for predicate_map in self.objects(node, vocab::PREDICATE_MAP).filter_map(as_node) {
            match self.object(&predicate_map, vocab::CONSTANT) {
                Some(Term::NamedNode(n)) => predicates.push(n.clone()),
                _ => {
                    return Err(Error::Mapping(format!(
                        "only constant predicate maps are supported (in {tm})"
                    )));
                }
            }
        }
        if predicates.is_empty() {
            return Err(Error::Mapping(format!(
                "predicate-object map without predicate in {tm}"
            )));
        }

        let mut objects: Vec<ObjectSpec> = self
            .objects(node, vocab::OBJECT)
            .map(|constant| {
                ObjectSpec::Map(ObjectMap {
                    source: TermSource::Constant(constant.clone()),
                    term_type: None,
                    language: None,
                    language_reference: None,
                    datatype: None,
                    datatype_source: None,
                })
            })
            .collect();
        for object_map in self.objects(node, vocab::OBJECT_MAP) {
            let object_node = as_node(object_map).ok_or_else(|| {
                Error::Mapping(format!("object map in {tm} is a literal"))
            })?;
            objects.push(self.extract_object_spec(tm, &object_node)?);
        }

        Ok(PredicateObjectMap {
            predicates,
            objects,
        })
    }

    fn extract_object_spec(
        &self,
        tm: &NamedOrBlankNode,
        node: &NamedOrBlankNode,
    ) -> Result<ObjectSpec> {
        if let Some(parent) = self.object(node, vocab::PARENT_TRIPLES_MAP) {
            let parent_triples_map = as_node(parent).ok_or_else(|| {
                Error::Mapping(format!("parent triples map in {tm} is a literal"))
            })?;
            let join_conditions = self
                .objects(node, vocab::JOIN_CONDITION)
                .filter_map(as_node)
                .map(|jc| {
                    let child = self.string(&jc, vocab::CHILD);
                    let parent = self.string(&jc, vocab::PARENT);
                    match (child, parent) {
                        (Some(child), Some(parent)) => Ok(JoinCondition {
                            child: child.to_string(),
                            parent: parent.to_string(),
                        }),
                        _ => Err(Error::Mapping(format!(
                            "join condition in {tm} needs both child and parent"
                        ))),
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(ObjectSpec::Ref(RefObjectMap {
                parent_triples_map,
                join_conditions,
            }));
        }

        let source = self.term_source(node)?.ok_or_else(|| {
            Error::Mapping(format!(
                "object map in {tm} has no template, reference or constant"
            ))
        })?;

        let mut language = self.string(node, vocab::LANGUAGE).map(str::to_string);
        let mut language_reference = None;
        if let Some(language_map) = self.object(node, vocab::LANGUAGE_MAP).and_then(as_node) {
            match self.term_source(&language_map)? {
                Some(TermSource::Reference(field)) => language_reference = Some(field),
                Some(TermSource::Constant(Term::Literal(tag))) => {
                    language = Some(tag.value().to_string())
                }
                _ => {
                    return Err(Error::Mapping(format!(
                        "unsupported language map in {tm}"
                    )));
                }
            }
        }

        let mut datatype = match self.object(node, vocab::DATATYPE) {
            Some(Term::NamedNode(n)) => Some(n.clone()),
            _ => None,
        };
        let mut datatype_source = None;
        if let Some(datatype_map) = self.object(node, vocab::DATATYPE_MAP).and_then(as_node) {
            match self.term_source(&datatype_map)? {
                Some(TermSource::Constant(Term::NamedNode(n))) => datatype = Some(n),
                other => datatype_source = other,
            }
        }

        Ok(ObjectSpec::Map(ObjectMap {
            source,
            term_type: self.term_type(node)?,
            language,
            language_reference,
            datatype,
            datatype_source,
        }))
    }

    fn term_source(&self, node: &NamedOrBlankNode) -> Result<Option<TermSource>> {
        if let Some(template) = self.string(node, vocab::TEMPLATE) {
            return Ok(Some(TermSource::Template(Template::parse(template)?)));
        }
        if let Some(field) = self
            .string(node, vocab::REFERENCE)
            .or_else(|| self.string(node, vocab::COLUMN))
        {
            return Ok(Some(TermSource::Reference(field.to_string())));
        }
        Ok(self
            .object(node, vocab::CONSTANT)
            .map(|c| TermSource::Constant(c.clone())))
    }

    fn term_type(&self, node: &NamedOrBlankNode) -> Result<Option<TermType>> {
        match self.object(node, vocab::TERM_TYPE) {
            Some(Term::NamedNode(iri)) => TermType::from_iri(iri.as_str())
                .map(Some)
                .ok_or_else(|| Error::Mapping(format!("unknown term type {iri}"))),
            Some(other) => Err(Error::Mapping(format!("unknown term type {other}"))),
            None => Ok(None),
        }
    }

    fn objects(
        &self,
        node: &NamedOrBlankNode,
        property: vocab::Term,
    ) -> impl Iterator<Item = &'a Term> + '_ {
        self.by_subject
            .get(node)
            .into_iter()
            .flatten()
            .filter(move |q| property.matches(q.predicate.as_str()))
            .map(|q| &q.object)
    }

    fn object(&self, node: &NamedOrBlankNode, property: vocab::Term) -> Option<&'a Term> {
        self.objects(node, property).next()
    }

    /// Lexical value of a literal (or IRI) object.
    fn string(&self, node: &NamedOrBlankNode, property: vocab::Term) -> Option<&'a str> {
        match self.object(node, property)? {
            Term::Literal(l) => Some(l.value()),
            Term::NamedNode(n) => Some(n.as_str()),
            _ => None,
        }
    }
}

fn as_node(term: &Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(n) => Some(n.clone().into()),
        Term::BlankNode(b) => Some(b.clone().into()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdfio::{RdfFormat, RdfParser};

    fn parse(ttl: &str) -> Result<Mapping> {
        let quads = RdfParser::from_format(RdfFormat::Turtle)
            .for_slice(ttl.as_bytes())
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        Mapping::from_quads(&quads)
    }

    const PEOPLE: &str = r#"
        @prefix rml: <http://w3id.org/rml/> .
        @prefix foaf: <http://xmlns.com/foaf/0.1/> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

        <http://ex.com/map#Person> a rml:TriplesMap ;
            rml:subjectMap [
                rml:template "http://ex.com/person/{ID}" ;
                rml:class foaf:Person
            ] ;
            rml:predicateObjectMap [
                rml:predicate foaf:name ;
                rml:objectMap [ rml:reference "Name" ; rml:language "en" ]
            ] , [
                rml:predicate foaf:age ;
                rml:objectMap [ rml:reference "Age" ; rml:datatype xsd:integer ]
            ] .
    "#;

    #[test]
    fn extracts_subject_and_objects() {
        let mapping = parse(PEOPLE).unwrap();
        let tm = mapping.row_map();
        assert_eq!(tm.id.to_string(), "<http://ex.com/map#Person>");

        let subject = &tm.subject_map;
        assert_eq!(subject.term_type, TermType::Iri);
        assert_eq!(subject.classes.len(), 1);
        match &subject.source {
            TermSource::Template(t) => assert_eq!(t.as_str(), "http://ex.com/person/{ID}"),
            other => panic!("unexpected subject source {other:?}"),
        }

        assert_eq!(tm.predicate_object_maps.len(), 2);
        let name = &tm.predicate_object_maps[0];
        assert_eq!(name.predicates[0].as_str(), "http://xmlns.com/foaf/0.1/name");
        let ObjectSpec::Map(om) = &name.objects[0] else {
            panic!("expected an object map")
        };
        assert_eq!(om.source, TermSource::Reference("Name".to_string()));
        assert_eq!(om.language.as_deref(), Some("en"));
        assert_eq!(om.term_type(), TermType::Literal);
    }

    #[test]
    fn reads_r2rml_vocabulary() {
        let mapping = parse(
            r#"
            @prefix rr: <http://www.w3.org/ns/r2rml#> .
            <http://ex.com/map#Dept> rr:subjectMap [ rr:template "http://ex.com/dept/{DEPTNO}" ] ;
                rr:predicateObjectMap [
                    rr:predicate <http://ex.com/name> ;
                    rr:objectMap [ rr:column "DNAME" ]
                ] .
            "#,
        )
        .unwrap();
        let pom = &mapping.row_map().predicate_object_maps[0];
        assert_eq!(
            pom.objects[0],
            ObjectSpec::Map(ObjectMap {
                source: TermSource::Reference("DNAME".to_string()),
                term_type: None,
                language: None,
                language_reference: None,
                datatype: None,
                datatype_source: None,
            })
        );
    }

    #[test]
    fn missing_subject_template_is_rejected() {
        let err = parse(
            r#"
            @prefix rml: <http://w3id.org/rml/> .
            <http://ex.com/map#M> rml:subjectMap [ rml:class <http://ex.com/C> ] .
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no subject template"));
    }

    #[test]
    fn empty_mapping_is_rejected() {
        let err = parse("<http://ex.com/a> <http://ex.com/b> <http://ex.com/c> .").unwrap_err();
        assert!(matches!(err, Error::Mapping(_)));
    }

    #[test]
    fn literal_subject_is_rejected() {
        let err = parse(
            r#"
            @prefix rml: <http://w3id.org/rml/> .
            <http://ex.com/map#M> rml:subjectMap [
                rml:template "{ID}" ;
                rml:termType rml:Literal
            ] .
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Literal"));
    }

    #[test]
    fn term_type_falls_back_to_graph_map() {
        let mapping = parse(
            r#"
            @prefix rml: <http://w3id.org/rml/> .
            <http://ex.com/map#M> rml:subjectMap [
                rml:template "{ID}" ;
                rml:graphMap [ rml:termType rml:BlankNode ]
            ] .
            "#,
        )
        .unwrap();
        assert_eq!(mapping.row_map().subject_map.term_type, TermType::BlankNode);
    }

    #[test]
    fn resolves_parent_triples_maps() {
        let mapping = parse(
            r#"
            @prefix rml: <http://w3id.org/rml/> .
            <http://ex.com/map#Emp> rml:subjectMap [ rml:template "http://ex.com/emp/{EMPNO}" ] ;
                rml:predicateObjectMap [
                    rml:predicate <http://ex.com/dept> ;
                    rml:objectMap [
                        rml:parentTriplesMap <http://ex.com/map#Dept> ;
                        rml:joinCondition [ rml:child "DEPTNO" ; rml:parent "ID" ]
                    ]
                ] .
            <http://ex.com/map#Dept> rml:subjectMap [ rml:template "http://ex.com/dept/{ID}" ] .
            "#,
        )
        .unwrap();
        assert_eq!(mapping.triples_maps().len(), 2);
        let ObjectSpec::Ref(r) = &mapping.row_map().predicate_object_maps[0].objects[0] else {
            panic!("expected a reference object map")
        };
        assert!(mapping.get(&r.parent_triples_map).is_some());
        assert_eq!(
            r.join_conditions,
            vec![JoinCondition {
                child: "DEPTNO".to_string(),
                parent: "ID".to_string()
            }]
        );
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let err = parse(
            r#"
            @prefix rml: <http://w3id.org/rml/> .
            <http://ex.com/map#Emp> rml:subjectMap [ rml:template "{EMPNO}" ] ;
                rml:predicateObjectMap [
                    rml:predicate <http://ex.com/dept> ;
                    rml:objectMap [ rml:parentTriplesMap <http://ex.com/map#Nowhere> ]
                ] .
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown parent"));
    }

    #[test]
    fn row_map_skips_join_parents() {
        let mapping = parse(
            r#"
            @prefix rml: <http://w3id.org/rml/> .
            <http://ex.com/map#Dept> rml:subjectMap [ rml:template "http://ex.com/dept/{D}" ] .
            <http://ex.com/map#Emp> rml:subjectMap [ rml:template "http://ex.com/emp/{E}" ] ;
                rml:predicateObjectMap [
                    rml:predicate <http://ex.com/dept> ;
                    rml:objectMap [
                        rml:parentTriplesMap <http://ex.com/map#Dept> ;
                        rml:joinCondition [ rml:child "D" ; rml:parent "D" ]
                    ]
                ] .
            "#,
        )
        .unwrap();
        assert_eq!(mapping.triples_maps()[0].id.to_string(), "<http://ex.com/map#Dept>");
        assert_eq!(mapping.row_map().id.to_string(), "<http://ex.com/map#Emp>");
    }

    #[test]
    fn datatype_map_constant_is_a_fixed_datatype() {
        let mapping = parse(
            r#"
            @prefix rml: <http://w3id.org/rml/> .
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
            <http://ex.com/map#M> rml:subjectMap [ rml:template "http://ex.com/m/{ID}" ] ;
                rml:predicateObjectMap [
                    rml:predicate <http://ex.com/value> ;
                    rml:objectMap [ rml:reference "V" ; rml:datatypeMap [ rml:constant xsd:integer ] ]
                ] .
            "#,
        )
        .unwrap();
        let ObjectSpec::Map(om) = &mapping.row_map().predicate_object_maps[0].objects[0] else {
            panic!("expected an object map")
        };
        assert_eq!(
            om.datatype.as_ref().map(NamedNode::as_str),
            Some("http://www.w3.org/2001/XMLSchema#integer")
        );
        assert_eq!(om.datatype_source, None);
    }

    #[test]
    fn predicate_object_map_needs_a_predicate() {
        let err = parse(
            r#"
            @prefix rml: <http://w3id.org/rml/> .
            <http://ex.com/map#M> rml:subjectMap [ rml:template "{ID}" ] ;
                rml:predicateObjectMap [ rml:objectMap [ rml:reference "Name" ] ] .
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Mapping(_)));
        assert!(err.to_string().contains("without predicate"));
    }

    #[test]
    fn computed_predicate_maps_are_rejected() {
        let err = parse(
            r#"
            @prefix rml: <http://w3id.org/rml/> .
            <http://ex.com/map#M> rml:subjectMap [ rml:template "{ID}" ] ;
                rml:predicateObjectMap [
                    rml:predicateMap [ rml:template "http://ex.com/{P}" ] ;
                    rml:objectMap [ rml:reference "Name" ]
                ] .
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("only constant predicate maps"));
    }
}
