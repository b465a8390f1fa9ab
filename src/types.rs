//! Semantic types and structural identity.
//!
//! Types form a tree; named types are references resolved through
//! [`crate::program::Program::underlying`], which keeps recursive
//! definitions finite. Identity follows the host type checker: unnamed
//! types compare structurally, named types compare by identity of their
//! declaration plus type arguments.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            Self::Bool
                | Self::String
                | Self::UnsafePointer
                | Self::UntypedBool
                | Self::UntypedString
                | Self::UntypedNil
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedRef {
    /// Import path of the declaring package; empty for universe types
    /// such as `error`.
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub args: Vec<Type>,
}

impl NamedRef {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn key(&self) -> (String, String) {
        (self.package.clone(), self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub signature: FunctionSignature,
}

/// Structural fingerprint of a function type: ordered parameter and result
/// types. Parameter names are never part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSignature {
    #[serde(default)]
    pub params: Vec<Type>,
    #[serde(default)]
    pub results: Vec<Type>,
    #[serde(default)]
    pub variadic: bool,
}

impl FunctionSignature {
    pub fn new(params: Vec<Type>, results: Vec<Type>) -> Self {
        Self {
            params,
            results,
            variadic: false,
        }
    }

    pub fn identical(&self, other: &FunctionSignature) -> bool {
        self.variadic == other.variadic
            && all_identical(&self.params, &other.params)
            && all_identical(&self.results, &other.results)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Basic {
        basic: BasicKind,
    },
    Named(NamedRef),
    Pointer {
        elem: Box<Type>,
    },
    Slice {
        elem: Box<Type>,
    },
    Array {
        len: u64,
        elem: Box<Type>,
    },
    Map {
        key: Box<Type>,
        value: Box<Type>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<Type>,
    },
    Signature(FunctionSignature),
    Struct {
        #[serde(default)]
        fields: Vec<StructField>,
    },
    Interface {
        #[serde(default)]
        methods: Vec<Method>,
        /// Embedded interfaces and type-set terms, already flattened into
        /// `methods` by the provider where possible.
        #[serde(default)]
        embedded: Vec<Type>,
    },
    TypeParam {
        name: String,
        index: u32,
    },
    Tuple {
        #[serde(default)]
        elems: Vec<Type>,
    },
}

impl Type {
    pub fn basic(basic: BasicKind) -> Self {
        Type::Basic { basic }
    }

    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        Type::Named(NamedRef::new(package, name))
    }

    pub fn pointer(elem: Type) -> Self {
        Type::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn error() -> Self {
        Type::named("", "error")
    }

    pub fn empty_interface() -> Self {
        Type::Interface {
            methods: Vec::new(),
            embedded: Vec::new(),
        }
    }

    pub fn untyped_nil() -> Self {
        Type::basic(BasicKind::UntypedNil)
    }

    pub fn as_signature(&self) -> Option<&FunctionSignature> {
        match self {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&NamedRef> {
        match self {
            Type::Named(named) => Some(named),
            _ => None,
        }
    }

    /// Structural identity of two types.
    pub fn identical(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Basic { basic: a }, Type::Basic { basic: b }) => a == b,
            (Type::Named(a), Type::Named(b)) => {
                a.package == b.package && a.name == b.name && all_identical(&a.args, &b.args)
            }
            (Type::Pointer { elem: a }, Type::Pointer { elem: b })
            | (Type::Slice { elem: a }, Type::Slice { elem: b }) => a.identical(b),
            (
                Type::Array {
                    len: la,
                    elem: ea,
                },
                Type::Array {
                    len: lb,
                    elem: eb,
                },
            ) => la == lb && ea.identical(eb),
            (
                Type::Map {
                    key: ka,
                    value: va,
                },
                Type::Map {
                    key: kb,
                    value: vb,
                },
            ) => ka.identical(kb) && va.identical(vb),
            (Type::Chan { dir: da, elem: ea }, Type::Chan { dir: db, elem: eb }) => {
                da == db && ea.identical(eb)
            }
            (Type::Signature(a), Type::Signature(b)) => a.identical(b),
            (Type::Struct { fields: a }, Type::Struct { fields: b }) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| {
                        x.name == y.name
                            && x.embedded == y.embedded
                            && x.tag == y.tag
                            && x.ty.identical(&y.ty)
                    })
            }
            (
                Type::Interface {
                    methods: ma,
                    embedded: ea,
                },
                Type::Interface {
                    methods: mb,
                    embedded: eb,
                },
            ) => same_method_set(ma, mb) && same_type_set(ea, eb),
            (
                Type::TypeParam {
                    name: na,
                    index: ia,
                },
                Type::TypeParam {
                    name: nb,
                    index: ib,
                },
            ) => na == nb && ia == ib,
            (Type::Tuple { elems: a }, Type::Tuple { elems: b }) => all_identical(a, b),
            _ => false,
        }
    }
}

fn all_identical(a: &[Type], b: &[Type]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
}

fn same_method_set(a: &[Method], b: &[Method]) -> bool {
    let covers = |x: &[Method], y: &[Method]| {
        x.iter().all(|m| {
            y.iter()
                .any(|n| n.name == m.name && n.signature.identical(&m.signature))
        })
    };
    a.len() == b.len() && covers(a, b) && covers(b, a)
}

fn same_type_set(a: &[Type], b: &[Type]) -> bool {
    let covers = |x: &[Type], y: &[Type]| x.iter().all(|t| y.iter().any(|u| u.identical(t)));
    a.len() == b.len() && covers(a, b) && covers(b, a)
}
