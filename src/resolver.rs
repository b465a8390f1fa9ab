//! Definition resolution for descriptor-convention sites.
//!
//! A descriptor site whose value names a function is followed to that
//! function's declaration, so the function is blanked once where it is
//! defined however many descriptors reference it. Everything else (function
//! literals, variables of function type, call results, and all
//! operation-convention sites) is blanked where it is used.
//!
//! The lookup runs against a [`DefinitionIndex`] built once over the whole
//! program, since a reference in one file may resolve to a declaration in
//! any other.

use crate::ast::{Decl, ExprKind, NodeId};
use crate::errors::{Error, Result};
use crate::matchers::{Convention, FileKey, MatchSite};
use crate::program::{ObjectId, ObjectKind, Program};
use std::collections::{BTreeMap, HashMap};

/// A function declaration's position in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclLocation {
    pub file: FileKey,
    pub decl: usize,
}

/// Read-only map from function objects to their declarations.
#[derive(Debug, Default)]
pub struct DefinitionIndex {
    by_object: HashMap<ObjectId, DeclLocation>,
}

impl DefinitionIndex {
    pub fn build(program: &Program) -> Self {
        let mut by_object = HashMap::new();
        for (pkg_idx, pkg) in program.packages.iter().enumerate() {
            for (file_idx, file) in pkg.files.iter().enumerate() {
                for (decl_idx, decl) in file.decls.iter().enumerate() {
                    let Decl::Func(func) = decl else {
                        continue;
                    };
                    if let Some(object) = pkg.info.defs.get(&func.name.id) {
                        let location = DeclLocation {
                            file: FileKey {
                                package: pkg_idx,
                                file: file_idx,
                            },
                            decl: decl_idx,
                        };
                        by_object.insert(*object, location);
                    }
                }
            }
        }
        Self { by_object }
    }

    pub fn get(&self, object: ObjectId) -> Option<DeclLocation> {
        self.by_object.get(&object).copied()
    }

    pub fn len(&self) -> usize {
        self.by_object.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_object.is_empty()
    }
}

/// A function declaration reached through one or more references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSite {
    pub location: DeclLocation,
    pub object: ObjectId,
    pub name: String,
    /// How many match sites resolved here.
    pub references: usize,
}

/// A matched value to blank in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseSite {
    pub file: FileKey,
    pub value: NodeId,
    pub convention: Convention,
}

/// Outcome of resolving every match site of a run.
#[derive(Debug, Default)]
pub struct Resolution {
    pub use_sites: Vec<UseSite>,
    /// Keyed by location, so each definition appears once.
    pub definitions: BTreeMap<DeclLocation, DefinitionSite>,
}

pub fn resolve(
    program: &Program,
    index: &DefinitionIndex,
    sites: &[MatchSite<'_>],
) -> Result<Resolution> {
    let mut resolution = Resolution::default();

    for site in sites {
        let target = match site.convention {
            Convention::Operation => None,
            Convention::Descriptor => resolve_definition(program, index, site)?,
        };

        match target {
            Some((location, object, name)) => {
                resolution
                    .definitions
                    .entry(location)
                    .and_modify(|def| def.references += 1)
                    .or_insert_with(|| DefinitionSite {
                        location,
                        object,
                        name,
                        references: 1,
                    });
            }
            None => resolution.use_sites.push(UseSite {
                file: site.file,
                value: site.value_id(),
                convention: site.convention,
            }),
        }
    }

    for def in resolution.definitions.values().filter(|d| d.references > 1) {
        log::debug!("`{}` is shared by {} lifecycle references", def.name, def.references);
    }
    Ok(resolution)
}

/// Declaration a descriptor site's value refers to, or `None` when the
/// value has no separate definition and is blanked where it stands.
fn resolve_definition(
    program: &Program,
    index: &DefinitionIndex,
    site: &MatchSite<'_>,
) -> Result<Option<(DeclLocation, ObjectId, String)>> {
    let name = match &site.value.kind {
        ExprKind::Ident { name } => name.clone(),
        ExprKind::Selector { sel, .. } => sel.name.clone(),
        _ => return Ok(None),
    };
    let pkg = &program.packages[site.file.package];
    let file = &pkg.files[site.file.file].path;

    let object_id = program
        .referenced_id(pkg, site.value)
        .ok_or_else(|| Error::resolution(&name, file, "reference has no binding"))?;
    let object = program
        .object(object_id)
        .ok_or_else(|| Error::resolution(&name, file, "binding names an unknown object"))?;

    if object.kind != ObjectKind::Func {
        log::debug!(
            "`{}` in {} is a {:?}, blanking at use site",
            name,
            site.decl,
            object.kind
        );
        return Ok(None);
    }

    let location = index.get(object_id).ok_or_else(|| {
        Error::resolution(
            &name,
            file,
            format!("function declared in {} is not part of the loaded program", object.package),
        )
    })?;
    Ok(Some((location, object_id, object.name.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{descriptor_signature, ProgramBuilder};
    use crate::types::Type;

    #[test]
    fn test_index_maps_declared_functions() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo.go");
        let create = b.declare_lifecycle_func(pkg, file, "fooCreate");
        let program = b.build();

        let index = DefinitionIndex::build(&program);
        let location = index.get(create).unwrap();
        assert_eq!(location.file, FileKey { package: pkg, file });
        assert_eq!(location.decl, 0);
    }

    #[test]
    fn test_shared_definition_is_recorded_once() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "shared.go");
        let create = b.declare_lifecycle_func(pkg, file, "sharedCreate");
        let first = b.reference(pkg, create);
        let second = b.reference(pkg, create);
        b.descriptor_resource(pkg, file, "resourceA", vec![("Create", first)]);
        b.descriptor_resource(pkg, file, "resourceB", vec![("Create", second)]);
        let program = b.build();

        let sites = crate::testkit::match_all(&program);
        assert_eq!(sites.len(), 2);
        let resolution = resolve(&program, &DefinitionIndex::build(&program), &sites).unwrap();
        assert!(resolution.use_sites.is_empty());
        assert_eq!(resolution.definitions.len(), 1);
        let def = resolution.definitions.values().next().unwrap();
        assert_eq!(def.name, "sharedCreate");
        assert_eq!(def.references, 2);
    }

    #[test]
    fn test_function_variable_is_blanked_at_use_site() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo.go");
        let var = b.declare_object(pkg, "createFn", ObjectKind::Var, Type::Signature(descriptor_signature()));
        let value = b.reference(pkg, var);
        b.descriptor_resource(pkg, file, "resourceFoo", vec![("Create", value)]);
        let program = b.build();

        let sites = crate::testkit::match_all(&program);
        let resolution = resolve(&program, &DefinitionIndex::build(&program), &sites).unwrap();
        assert_eq!(resolution.use_sites.len(), 1);
        assert!(resolution.definitions.is_empty());
    }

    #[test]
    fn test_function_outside_program_is_resolution_error() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo.go");
        let external = b.declare_object(
            pkg,
            "vendoredCreate",
            ObjectKind::Func,
            Type::Signature(descriptor_signature()),
        );
        let value = b.reference(pkg, external);
        b.descriptor_resource(pkg, file, "resourceFoo", vec![("Create", value)]);
        let program = b.build();

        let sites = crate::testkit::match_all(&program);
        let err = resolve(&program, &DefinitionIndex::build(&program), &sites).unwrap_err();
        assert!(err.to_string().starts_with("[resolve] cannot resolve `vendoredCreate`"));
    }
}
