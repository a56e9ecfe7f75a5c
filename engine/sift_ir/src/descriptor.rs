//! Host-authored calling-convention descriptors.
//!
//! The capability surface is auditable data: every registered function
//! carries an explicit [`FunctionDescriptor`] describing which parameters
//! accept keyword-style invocation and which are implied (resolved from the
//! evaluation namespace instead of being passed by the expression author).
//! Nothing is inferred from the callable itself.

use crate::Value;
use std::fmt;

/// A single parameter of a registered function, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    /// Can only be filled positionally; never a keyword-argument target.
    pub positional_only: bool,
    /// Can only be filled by keyword (or implied resolution).
    pub keyword_only: bool,
    /// Resolved silently from the evaluation namespace; invisible to the
    /// expression author. Implies `keyword_only` and no default.
    pub implied: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A plain positional-or-keyword parameter with no default.
    pub fn new(name: impl Into<String>) -> Self {
        ParamSpec {
            name: name.into(),
            positional_only: false,
            keyword_only: false,
            implied: false,
            default: None,
        }
    }

    /// A positional-only parameter (never a keyword target).
    pub fn positional_only(name: impl Into<String>) -> Self {
        ParamSpec {
            positional_only: true,
            ..ParamSpec::new(name)
        }
    }

    /// A keyword-only parameter.
    pub fn keyword_only(name: impl Into<String>) -> Self {
        ParamSpec {
            keyword_only: true,
            ..ParamSpec::new(name)
        }
    }

    /// An implied parameter: keyword-only, no default, filled from the
    /// evaluation namespace at call time.
    pub fn implied(name: impl Into<String>) -> Self {
        ParamSpec {
            keyword_only: true,
            implied: true,
            ..ParamSpec::new(name)
        }
    }

    /// Attach a default value.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Calling-convention descriptor for a registered function.
///
/// Immutable once constructed; construction validates the invariants below
/// so that every descriptor in a registry is well-formed by the time an
/// expression can reference it.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FunctionDescriptor {
    params: Vec<ParamSpec>,
    /// Accepts arbitrary extra positional arguments after the declared
    /// parameters (the shape of `max`, `range`, and friends).
    variadic: bool,
}

/// Descriptor construction failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptorError {
    /// Two parameters share a name.
    DuplicateParam(String),
    /// A parameter is both positional-only and keyword-only.
    ContradictoryKinds(String),
    /// An implied parameter carries a default or is not keyword-only.
    MalformedImplied(String),
    /// A positional-only parameter appears after a non-positional-only one.
    PositionalOnlyAfterNamed(String),
    /// A no-default positional parameter follows a defaulted one.
    NonDefaultAfterDefault(String),
    /// Some but not all no-default keyword-only parameters are implied.
    PartiallyImplied(String),
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::DuplicateParam(name) => {
                write!(f, "duplicate parameter '{name}'")
            }
            DescriptorError::ContradictoryKinds(name) => {
                write!(f, "parameter '{name}' is both positional-only and keyword-only")
            }
            DescriptorError::MalformedImplied(name) => {
                write!(
                    f,
                    "implied parameter '{name}' must be keyword-only and have no default"
                )
            }
            DescriptorError::PositionalOnlyAfterNamed(name) => {
                write!(
                    f,
                    "positional-only parameter '{name}' must precede all named parameters"
                )
            }
            DescriptorError::NonDefaultAfterDefault(name) => {
                write!(
                    f,
                    "parameter '{name}' without a default follows a defaulted parameter"
                )
            }
            DescriptorError::PartiallyImplied(name) => {
                write!(
                    f,
                    "keyword-only parameter '{name}' has no default while other such \
                     parameters are implied; implied parameters are all-or-nothing"
                )
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

impl FunctionDescriptor {
    /// A descriptor for a function taking no arguments.
    pub fn nullary() -> Self {
        FunctionDescriptor {
            params: Vec::new(),
            variadic: false,
        }
    }

    /// A descriptor taking any number of positional arguments.
    pub fn variadic() -> Self {
        FunctionDescriptor {
            params: Vec::new(),
            variadic: true,
        }
    }

    /// Positional-only parameters with no defaults — the shape of the
    /// default builtins, whose calling convention exposes no names.
    ///
    /// Infallible: distinct positional-only no-default parameters satisfy
    /// every descriptor invariant by construction.
    pub fn positional(names: &[&str]) -> Self {
        FunctionDescriptor {
            params: names
                .iter()
                .map(|&name| ParamSpec::positional_only(name))
                .collect(),
            variadic: false,
        }
    }

    /// Build a descriptor from an ordered parameter list.
    pub fn new(params: Vec<ParamSpec>) -> Result<Self, DescriptorError> {
        let mut seen_named = false;
        let mut seen_default = false;
        for (i, p) in params.iter().enumerate() {
            if params[..i].iter().any(|q| q.name == p.name) {
                return Err(DescriptorError::DuplicateParam(p.name.clone()));
            }
            if p.positional_only && p.keyword_only {
                return Err(DescriptorError::ContradictoryKinds(p.name.clone()));
            }
            if p.implied && (!p.keyword_only || p.default.is_some()) {
                return Err(DescriptorError::MalformedImplied(p.name.clone()));
            }
            if p.positional_only {
                if seen_named {
                    return Err(DescriptorError::PositionalOnlyAfterNamed(p.name.clone()));
                }
            } else {
                seen_named = true;
            }
            if !p.keyword_only {
                if p.default.is_some() {
                    seen_default = true;
                } else if seen_default {
                    return Err(DescriptorError::NonDefaultAfterDefault(p.name.clone()));
                }
            }
        }
        // Implied parameters are all-or-nothing across the no-default
        // keyword-only set: a mixed descriptor would make the author's view
        // of the call surface ambiguous.
        let any_implied = params.iter().any(|p| p.implied);
        if any_implied {
            if let Some(p) = params
                .iter()
                .find(|p| p.keyword_only && p.default.is_none() && !p.implied)
            {
                return Err(DescriptorError::PartiallyImplied(p.name.clone()));
            }
        }
        Ok(FunctionDescriptor {
            params,
            variadic: false,
        })
    }

    /// Ordered parameter list.
    #[inline]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Whether extra positional arguments are accepted.
    #[inline]
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Names eligible for keyword-style invocation, in declaration order.
    ///
    /// Excludes positional-only and implied parameters, and names starting
    /// with `_` (an underscore in a parameter name marks it as not part of
    /// the expression-facing surface).
    pub fn named_parameter_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| !p.positional_only && !p.implied && !p.name.starts_with('_'))
            .map(|p| p.name.as_str())
    }

    /// Names of implied parameters.
    pub fn implied_parameter_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.implied)
            .map(|p| p.name.as_str())
    }

    /// Whether any parameter is implied.
    pub fn has_implied(&self) -> bool {
        self.params.iter().any(|p| p.implied)
    }
}
