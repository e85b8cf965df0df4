use serde::Deserialize;
use xavyo_delta::value::descend;
use xavyo_delta::{DeltaSetTriple, ItemPath, Value};

use crate::config::ExpressionConfig;
use crate::context::EvaluationContext;
use crate::error::{ExpressionError, Result};

#[derive(Debug, Deserialize)]
struct PathBody {
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathRoot {
    /// `$name/...`: a source or variable called `name`.
    Named(String),
    /// Relative path, resolved against the first source.
    DefaultSource,
}

/// Resolves a path against a variable or source.
///
/// An unknown root is an evaluation error; a missing intermediate item
/// yields no values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEvaluator {
    root: PathRoot,
    path: ItemPath,
}

impl PathEvaluator {
    pub fn compile(config: &ExpressionConfig) -> Result<Self> {
        let body: PathBody = config.parse_body()?;
        Self::parse(&body.path)
    }

    /// Parse `$variable/a/b` or a relative `a/b`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match raw.strip_prefix('$') {
            Some(rest) => {
                let (name, remainder) = rest.split_once('/').unwrap_or((rest, ""));
                if name.is_empty() {
                    return Err(ExpressionError::schema(format!(
                        "path '{raw}' has an empty variable name"
                    )));
                }
                Ok(Self {
                    root: PathRoot::Named(name.to_string()),
                    path: remainder.parse()?,
                })
            }
            None => Ok(Self {
                root: PathRoot::DefaultSource,
                path: raw.parse()?,
            }),
        }
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<DeltaSetTriple<Value>> {
        match &self.root {
            PathRoot::Named(name) => {
                if let Some(source) = ctx.source(name) {
                    return Ok(descend_triple(ctx.source_triple(source), &self.path));
                }
                match ctx.variables.get(name) {
                    Some(variable) => Ok(DeltaSetTriple::zero_only(variable.resolve(&self.path))),
                    None => Err(ExpressionError::evaluation(format!(
                        "unresolved variable '${name}' in {}",
                        ctx.description
                    ))),
                }
            }
            PathRoot::DefaultSource => match ctx.sources.first() {
                Some(source) => Ok(descend_triple(ctx.source_triple(source), &self.path)),
                None => Err(ExpressionError::evaluation(format!(
                    "relative path '{}' in {} has no source to resolve against",
                    self.path, ctx.description
                ))),
            },
        }
    }
}

fn descend_triple(triple: DeltaSetTriple<Value>, path: &ItemPath) -> DeltaSetTriple<Value> {
    if path.is_empty() {
        return triple;
    }
    let (zero, plus, minus) = triple.into_parts();
    DeltaSetTriple::new(
        descend(&zero, path.segments()),
        descend(&plus, path.segments()),
        descend(&minus, path.segments()),
    )
}
