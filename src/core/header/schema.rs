//! Document validation before signing
//!
//! [`StructuralValidator`] enforces the parts of the authority's XSDs that
//! the engine itself produces: root element and version, the
//! `infoTributaria` sequence and field formats, and consistency between the
//! access key and the header fields it encodes. It does not load
//! `DocumentVersion::schema_path`; full XSD evaluation is left to another
//! [`SchemaValidator`] installed with `LifecycleOrchestrator::with_validator`.

use crate::domain::{AccessKey, DocumentVersion, EdiError, Result};
use roxmltree::{Document, Node};

/// Validates a complete document against its version descriptor
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, xml: &str, version: &DocumentVersion) -> Result<()>;
}

/// Field of the `infoTributaria` sequence
struct Field {
    name: &'static str,
    required: bool,
    check: fn(&str) -> bool,
}

fn all_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn non_empty(value: &str) -> bool {
    !value.trim().is_empty() && value.chars().count() <= 300
}

fn environment(value: &str) -> bool {
    value == "1" || value == "2"
}

fn emission_kind(value: &str) -> bool {
    value == "1"
}

fn tax_id(value: &str) -> bool {
    all_digits(value, 13)
}

fn access_key(value: &str) -> bool {
    AccessKey::new(value).is_ok()
}

fn document_code(value: &str) -> bool {
    all_digits(value, 2)
}

fn three_digits(value: &str) -> bool {
    all_digits(value, 3)
}

fn sequential(value: &str) -> bool {
    all_digits(value, 9)
}

const INFO_TRIBUTARIA: &[Field] = &[
    Field { name: "ambiente", required: true, check: environment },
    Field { name: "tipoEmision", required: true, check: emission_kind },
    Field { name: "razonSocial", required: true, check: non_empty },
    Field { name: "nombreComercial", required: false, check: non_empty },
    Field { name: "ruc", required: true, check: tax_id },
    Field { name: "claveAcceso", required: true, check: access_key },
    Field { name: "codDoc", required: true, check: document_code },
    Field { name: "estab", required: true, check: three_digits },
    Field { name: "ptoEmi", required: true, check: three_digits },
    Field { name: "secuencial", required: true, check: sequential },
    Field { name: "dirMatriz", required: true, check: non_empty },
    Field { name: "regimenMicroempresas", required: false, check: non_empty },
    Field { name: "agenteRetencion", required: false, check: non_empty },
];

/// Structural validation backed by roxmltree
#[derive(Debug, Default, Clone)]
pub struct StructuralValidator;

impl StructuralValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for StructuralValidator {
    fn validate(&self, xml: &str, version: &DocumentVersion) -> Result<()> {
        let doc = Document::parse(xml)
            .map_err(|e| EdiError::Validation(format!("Document is not well-formed: {e}")))?;
        let root = doc.root_element();
        let mut problems = Vec::new();

        if root.tag_name().name() != version.root_element {
            problems.push(format!(
                "root element is '{}', expected '{}'",
                root.tag_name().name(),
                version.root_element
            ));
        }
        if root.attribute("version") != Some(version.version.as_str()) {
            problems.push(format!(
                "root version is {:?}, expected '{}'",
                root.attribute("version"),
                version.version
            ));
        }
        if root.attribute("id") != Some("comprobante") {
            problems.push("root id attribute must be 'comprobante'".to_string());
        }

        let mut children = root.children().filter(Node::is_element);
        match children.next() {
            Some(info) if info.tag_name().name() == "infoTributaria" => {
                check_info_tributaria(info, &mut problems);
            }
            _ => problems.push("first element must be infoTributaria".to_string()),
        }
        if children.next().is_none() {
            problems.push("document body is missing".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(EdiError::Validation(problems.join("; ")))
        }
    }
}

fn check_info_tributaria(info: Node<'_, '_>, problems: &mut Vec<String>) {
    let elements: Vec<Node<'_, '_>> = info.children().filter(Node::is_element).collect();
    let mut index = 0;

    for field in INFO_TRIBUTARIA {
        match elements.get(index) {
            Some(node) if node.tag_name().name() == field.name => {
                let value = node.text().unwrap_or_default().trim();
                if !(field.check)(value) {
                    problems.push(format!("infoTributaria/{} has invalid value '{value}'", field.name));
                }
                index += 1;
            }
            _ if field.required => {
                problems.push(format!("infoTributaria/{} is missing or out of order", field.name));
            }
            _ => {}
        }
    }
    for extra in &elements[index.min(elements.len())..] {
        problems.push(format!(
            "unexpected element infoTributaria/{}",
            extra.tag_name().name()
        ));
    }

    check_key_consistency(info, problems);
}

/// The key must encode the same values the header declares
fn check_key_consistency(info: Node<'_, '_>, problems: &mut Vec<String>) {
    let key = child_text(info, "claveAcceso");
    if AccessKey::new(key).is_err() {
        return;
    }

    let segments = [
        ("codDoc", &key[8..10]),
        ("ruc", &key[10..23]),
        ("ambiente", &key[23..24]),
        ("estab", &key[24..27]),
        ("ptoEmi", &key[27..30]),
        ("secuencial", &key[30..39]),
    ];
    for (name, expected) in segments {
        if child_text(info, name) != expected {
            problems.push(format!(
                "infoTributaria/{name} does not match the access key ({expected})"
            ));
        }
    }
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> &'a str {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(str::trim)
        .unwrap_or_default()
}
