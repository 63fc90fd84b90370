use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::Value;
use serde_yaml::Value as Document;
use shared::{Error, Result};
use std::path::Path;
use tracing::{debug, warn};

const JSON_MEDIA_TYPE: &str = "application/json";

/// One documented POST operation and the example body it advertises.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationExample {
    pub path: String,
    pub template: Value,
}

/// Read-only set of operation examples, shared by all event workers.
#[derive(Debug, Clone)]
pub struct Catalog {
    examples: Vec<OperationExample>,
}

impl Catalog {
    /// Load the description at `path`, extract its examples and refuse an empty result.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let document = load(path)?;
        Self::from_examples(extract(&document))
    }

    pub fn from_examples(examples: Vec<OperationExample>) -> Result<Self> {
        if examples.is_empty() {
            return Err(Error::NoExamples);
        }
        Ok(Self { examples })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationExample> {
        self.examples.iter()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.examples.iter().map(|e| e.path.as_str()).collect()
    }

    /// Uniform pick over all examples.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &OperationExample {
        // Non-empty is guaranteed by construction
        self.examples
            .choose(rng)
            .unwrap_or_else(|| &self.examples[0])
    }
}

/// Read and parse an API description. YAML and JSON are both accepted.
pub fn load(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&raw)
}

pub fn parse(raw: &str) -> Result<Document> {
    serde_yaml::from_str(raw).map_err(|e| Error::Parse(e.to_string()))
}

/// Collect `(path, example)` for every POST operation whose JSON request body carries an
/// `example`. Operations without one are skipped; nothing is synthesized.
pub fn extract(document: &Document) -> Vec<OperationExample> {
    let mut examples = Vec::new();

    let Some(paths) = document.get("paths").and_then(Document::as_mapping) else {
        return examples;
    };

    for (path, methods) in paths {
        let (Some(path), Some(methods)) = (path.as_str(), methods.as_mapping()) else {
            continue;
        };

        for (method, operation) in methods {
            let is_post = method
                .as_str()
                .is_some_and(|m| m.eq_ignore_ascii_case("post"));
            if !is_post {
                continue;
            }

            let example = operation
                .get("requestBody")
                .and_then(|body| body.get("content"))
                .and_then(|content| content.get(JSON_MEDIA_TYPE))
                .and_then(|media| media.get("example"));

            let Some(example) = example.filter(|e| !is_blank(e)) else {
                debug!("POST {path} has no usable JSON example, skipping");
                continue;
            };

            match serde_json::to_value(example) {
                Ok(template) => examples.push(OperationExample {
                    path: path.to_string(),
                    template,
                }),
                Err(e) => warn!("POST {path} example is not representable as JSON: {e}"),
            }
        }
    }

    examples
}

/// Null, `false`, zero and empty strings or containers count as "no example".
fn is_blank(example: &Document) -> bool {
    match example {
        Document::Null => true,
        Document::Bool(b) => !b,
        Document::Number(n) => n.as_f64() == Some(0.0),
        Document::String(s) => s.is_empty(),
        Document::Sequence(items) => items.is_empty(),
        Document::Mapping(fields) => fields.is_empty(),
        Document::Tagged(tagged) => is_blank(&tagged.value),
    }
}
