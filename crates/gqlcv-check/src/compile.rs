//! Schema-wide constraint compilation.
//!
//! Walks the type graph once, computing the intrinsic [`ConstraintMap`] of
//! every named type into an arena indexed by [`TypeId`], then indexes the
//! arguments of every output field. Named-type constraints are referenced
//! from the arena (`inherits`) rather than copied, so a cyclic input type
//! compiles to a finite, self-referencing map.

use std::collections::HashMap;

use indexmap::IndexMap;

use gqlcv_core::{CoreError, FieldKey, SchemaGraph, TypeId, TypeKind};

use crate::catalog::{DirectiveCatalog, DirectiveLocation};
use crate::constraint::ConstraintMap;
use crate::diagnostics::SchemaDirectiveError;
use crate::extract::{Element, ElementType, Extractor};
use crate::options::CompileOptions;

/// Arena slot for one named type.
#[derive(Debug)]
enum Slot {
    Pending,
    /// On the current compilation path. Re-entering it returns at once;
    /// the caller still records an `inherits` reference to the slot.
    InProgress,
    Compiled(ConstraintMap),
}

/// The compiled, immutable constraint plan for one schema.
#[derive(Debug, Clone, Default)]
pub struct CompiledIndex {
    types: Vec<ConstraintMap>,
    arguments: HashMap<FieldKey, IndexMap<String, ConstraintMap>>,
}

impl CompiledIndex {
    /// Intrinsic constraints of a named type. Unconstrained types have an
    /// empty map.
    pub fn type_constraints(&self, id: TypeId) -> Option<&ConstraintMap> {
        self.types.get(id.index())
    }

    pub fn argument_constraints(&self, field: &FieldKey, argument: &str) -> Option<&ConstraintMap> {
        self.arguments.get(field)?.get(argument)
    }

    /// Constrained arguments of a field, in declaration order.
    pub fn field_arguments(&self, field: &FieldKey) -> Option<&IndexMap<String, ConstraintMap>> {
        self.arguments.get(field)
    }

    /// Fields with at least one constrained argument.
    pub fn fields(&self) -> impl Iterator<Item = &FieldKey> {
        self.arguments.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

/// Compiles every constraint directive in `schema`.
///
/// Fails on the first misapplied directive; there is no partially
/// compiled index.
pub fn compile_constraints(
    schema: &SchemaGraph,
    catalog: &DirectiveCatalog,
    options: &CompileOptions,
) -> Result<CompiledIndex, SchemaDirectiveError> {
    schema.ensure_defined()?;

    let mut compiler = Compiler {
        schema,
        extractor: Extractor::new(catalog, schema, options),
        slots: (0..schema.len()).map(|_| Slot::Pending).collect(),
    };
    for (id, _) in schema.iter() {
        compiler.compile_type(id)?;
    }
    let arguments = compiler.index_arguments()?;
    let index = compiler.finish(arguments);

    tracing::info!(
        types = index.types.iter().filter(|m| !m.is_empty()).count(),
        fields = index.arguments.len(),
        arguments = index.arguments.values().map(IndexMap::len).sum::<usize>(),
        "compiled schema constraints"
    );
    Ok(index)
}

struct Compiler<'a> {
    schema: &'a SchemaGraph,
    extractor: Extractor<'a>,
    slots: Vec<Slot>,
}

impl<'a> Compiler<'a> {
    fn compile_type(&mut self, id: TypeId) -> Result<(), SchemaDirectiveError> {
        match self.slots.get(id.index()) {
            Some(Slot::Pending) => {}
            Some(_) => return Ok(()),
            None => return Err(CoreError::TypeNotFound { id }.into()),
        }
        self.slots[id.index()] = Slot::InProgress;

        let schema = self.schema;
        let ty = schema.get(id).ok_or(CoreError::TypeNotFound { id })?;
        let map = if ty.is_introspection() {
            ConstraintMap::new()
        } else {
            match &ty.kind {
                TypeKind::Scalar(_) => self.extractor.extract(&Element {
                    coordinate: ty.name.clone(),
                    location: DirectiveLocation::Scalar,
                    directives: &ty.directives,
                    ty: ElementType::ScalarDefinition(id),
                })?,
                TypeKind::InputObject(def) => {
                    let mut map = ConstraintMap::new();
                    for (name, field) in &def.fields {
                        let mut local = self.extractor.extract(&Element {
                            coordinate: format!("{}.{}", ty.name, name),
                            location: DirectiveLocation::InputFieldDefinition,
                            directives: &field.directives,
                            ty: ElementType::Declared(&field.ty),
                        })?;
                        let named = field.ty.named_type();
                        self.compile_type(named)?;
                        local.inherit(named);
                        map.add_property(name.clone(), local);
                    }
                    map
                }
                TypeKind::Object(def) => {
                    // Output field directives are checked but never enforced.
                    for (name, field) in &def.fields {
                        self.extractor.extract(&Element {
                            coordinate: format!("{}.{}", ty.name, name),
                            location: DirectiveLocation::FieldDefinition,
                            directives: &field.directives,
                            ty: ElementType::Declared(&field.ty),
                        })?;
                    }
                    ConstraintMap::new()
                }
                TypeKind::Enum(_) | TypeKind::Placeholder => ConstraintMap::new(),
            }
        };

        tracing::debug!(
            type_name = %ty.name,
            directives = map.directives().count(),
            properties = map.properties().count(),
            "compiled type constraints"
        );
        self.slots[id.index()] = Slot::Compiled(map);
        Ok(())
    }

    fn index_arguments(
        &mut self,
    ) -> Result<HashMap<FieldKey, IndexMap<String, ConstraintMap>>, SchemaDirectiveError> {
        let schema = self.schema;
        let mut index = HashMap::new();
        for (_, ty) in schema.iter() {
            let TypeKind::Object(def) = &ty.kind else {
                continue;
            };
            if ty.is_introspection() {
                continue;
            }
            for (field_name, field) in &def.fields {
                let mut arguments = IndexMap::with_capacity(field.arguments.len());
                for (arg_name, arg) in &field.arguments {
                    let mut map = self.extractor.extract(&Element {
                        coordinate: format!("{}.{}({}:)", ty.name, field_name, arg_name),
                        location: DirectiveLocation::ArgumentDefinition,
                        directives: &arg.directives,
                        ty: ElementType::Declared(&arg.ty),
                    })?;
                    let named = arg.ty.named_type();
                    self.compile_type(named)?;
                    map.inherit(named);
                    tracing::debug!(
                        owner = %ty.name,
                        field = %field_name,
                        argument = %arg_name,
                        "indexed argument constraints"
                    );
                    arguments.insert(arg_name.clone(), map);
                }
                index.insert(FieldKey::new(ty.name.as_str(), field_name.as_str()), arguments);
            }
        }
        Ok(index)
    }

    /// Freezes the arena and drops every reference that cannot lead to a
    /// constraint, so unconstrained arguments cost nothing at request time.
    fn finish(
        self,
        mut arguments: HashMap<FieldKey, IndexMap<String, ConstraintMap>>,
    ) -> CompiledIndex {
        let mut types: Vec<ConstraintMap> = self
            .slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Compiled(map) => map,
                Slot::Pending | Slot::InProgress => ConstraintMap::new(),
            })
            .collect();

        let constrained = constrained_types(&types);
        let is_empty_type = |id: TypeId| !constrained.get(id.index()).copied().unwrap_or(false);

        for map in &mut types {
            map.prune(&is_empty_type);
        }
        for field in arguments.values_mut() {
            for map in field.values_mut() {
                map.prune(&is_empty_type);
            }
            field.retain(|_, map| !map.is_empty());
        }
        arguments.retain(|_, field| !field.is_empty());

        CompiledIndex { types, arguments }
    }
}

/// Which types can reach at least one directive, directly or through
/// properties and inherited types. Iterates to a fixed point so cycles
/// without directives stay unconstrained.
fn constrained_types(types: &[ConstraintMap]) -> Vec<bool> {
    let mut constrained = vec![false; types.len()];
    loop {
        let mut changed = false;
        for (i, map) in types.iter().enumerate() {
            if !constrained[i] && reaches_directive(map, &constrained) {
                constrained[i] = true;
                changed = true;
            }
        }
        if !changed {
            return constrained;
        }
    }
}

fn reaches_directive(map: &ConstraintMap, constrained: &[bool]) -> bool {
    map.directives().next().is_some()
        || map
            .inherits()
            .iter()
            .any(|id| constrained.get(id.index()).copied().unwrap_or(false))
        || map.properties().any(|(_, p)| reaches_directive(p, constrained))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintName, ConstraintValue, DirectiveKey};
    use gqlcv_core::{
        DirectiveNode, EnumDef, FieldDef, InputObjectDef, InputValueDef, NamedType, ObjectDef,
        TypeRef,
    };

    fn compile(schema: &SchemaGraph) -> Result<CompiledIndex, SchemaDirectiveError> {
        let catalog = DirectiveCatalog::standard().unwrap();
        compile_constraints(schema, &catalog, &CompileOptions::default())
    }

    fn query(schema: &mut SchemaGraph, field: FieldDef) {
        schema
            .register_named(NamedType::new(
                "Query",
                TypeKind::Object(ObjectDef::new().field("f", field)),
            ))
            .unwrap();
    }

    #[test]
    fn compiled_index_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledIndex>();
    }

    #[test]
    fn scalar_constraints_are_intrinsic() {
        let mut schema = SchemaGraph::new();
        let port = schema
            .register_scalar(
                "Port",
                vec![DirectiveNode::new("numberValue").arg("min", 1).arg("max", 65535)],
            )
            .unwrap();
        query(
            &mut schema,
            FieldDef::new(TypeRef::named(TypeId::STRING))
                .argument("port", InputValueDef::new(TypeRef::named(port))),
        );

        let index = compile(&schema).unwrap();
        let port_map = index.type_constraints(port).unwrap();
        assert_eq!(port_map.sets(DirectiveKey::NumberValue).len(), 1);

        let arg = index
            .argument_constraints(&FieldKey::new("Query", "f"), "port")
            .unwrap();
        assert_eq!(arg.inherits(), &[port]);
        assert!(!arg.has_directive(DirectiveKey::NumberValue));
    }

    #[test]
    fn unconstrained_arguments_are_not_indexed() {
        let mut schema = SchemaGraph::new();
        query(
            &mut schema,
            FieldDef::new(TypeRef::named(TypeId::STRING))
                .argument("plain", InputValueDef::new(TypeRef::named(TypeId::INT))),
        );
        let index = compile(&schema).unwrap();
        assert!(index.is_empty());
        assert!(index.field_arguments(&FieldKey::new("Query", "f")).is_none());
    }

    #[test]
    fn input_object_properties_mirror_fields() {
        let mut schema = SchemaGraph::new();
        let filter = schema
            .register_named(NamedType::new(
                "Filter",
                TypeKind::InputObject(
                    InputObjectDef::new()
                        .field(
                            "title",
                            InputValueDef::new(TypeRef::named(TypeId::STRING))
                                .directive(DirectiveNode::new("stringValue").arg("maxLength", 10)),
                        )
                        .field("page", InputValueDef::new(TypeRef::named(TypeId::INT))),
                ),
            ))
            .unwrap();
        query(
            &mut schema,
            FieldDef::new(TypeRef::named(TypeId::STRING))
                .argument("filter", InputValueDef::new(TypeRef::named(filter))),
        );

        let index = compile(&schema).unwrap();
        let map = index.type_constraints(filter).unwrap();
        let title = map.property("title").unwrap();
        assert_eq!(
            title.sets(DirectiveKey::StringValue)[0].get(ConstraintName::MaxLength),
            Some(&ConstraintValue::Int(10))
        );
        assert!(map.property("page").is_none());
    }

    #[test]
    fn cyclic_input_types_terminate() {
        let mut schema = SchemaGraph::new();
        let node = schema.declare("Node").unwrap();
        schema
            .define(
                node,
                TypeKind::InputObject(
                    InputObjectDef::new()
                        .field(
                            "name",
                            InputValueDef::new(TypeRef::named(TypeId::STRING))
                                .directive(DirectiveNode::new("stringValue").arg("minLength", 1)),
                        )
                        .field("next", InputValueDef::new(TypeRef::named(node))),
                ),
                Vec::new(),
            )
            .unwrap();
        query(
            &mut schema,
            FieldDef::new(TypeRef::named(TypeId::STRING))
                .argument("node", InputValueDef::new(TypeRef::named(node))),
        );

        let index = compile(&schema).unwrap();
        let map = index.type_constraints(node).unwrap();
        assert_eq!(map.property("next").unwrap().inherits(), &[node]);
    }

    #[test]
    fn cycle_without_directives_is_pruned() {
        let mut schema = SchemaGraph::new();
        let node = schema.declare("Node").unwrap();
        schema
            .define(
                node,
                TypeKind::InputObject(
                    InputObjectDef::new().field("next", InputValueDef::new(TypeRef::named(node))),
                ),
                Vec::new(),
            )
            .unwrap();
        query(
            &mut schema,
            FieldDef::new(TypeRef::named(TypeId::STRING))
                .argument("node", InputValueDef::new(TypeRef::named(node))),
        );

        let index = compile(&schema).unwrap();
        assert!(index.type_constraints(node).unwrap().is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn errors_name_the_argument_coordinate() {
        let mut schema = SchemaGraph::new();
        query(
            &mut schema,
            FieldDef::new(TypeRef::named(TypeId::STRING)).argument(
                "limit",
                InputValueDef::new(TypeRef::named(TypeId::BOOLEAN))
                    .directive(DirectiveNode::new("numberValue").arg("max", 5)),
            ),
        );
        let err = compile(&schema).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"Query.f(limit:): @numberValue can't be applied to type 'Boolean', expected a numeric scalar"
        );
    }

    #[test]
    fn enum_typed_input_field_rejects_value_directives() {
        let mut schema = SchemaGraph::new();
        let order = schema
            .register_named(NamedType::new(
                "Order",
                TypeKind::Enum(EnumDef {
                    values: vec!["ASC".into(), "DESC".into()],
                }),
            ))
            .unwrap();
        schema
            .register_named(NamedType::new(
                "Sort",
                TypeKind::InputObject(InputObjectDef::new().field(
                    "order",
                    InputValueDef::new(TypeRef::named(order))
                        .directive(DirectiveNode::new("stringValue").arg("oneOf", vec!["ASC"])),
                )),
            ))
            .unwrap();
        let err = compile(&schema).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"Sort.order: @stringValue can't be applied to type 'Order', expected a string scalar"
        );
    }

    #[test]
    fn output_field_directives_are_checked() {
        let mut schema = SchemaGraph::new();
        query(
            &mut schema,
            FieldDef::new(TypeRef::named(TypeId::INT))
                .directive(DirectiveNode::new("list").arg("maxItems", 2)),
        );
        assert!(matches!(
            compile(&schema),
            Err(SchemaDirectiveError::NonListType { .. })
        ));
    }

    #[test]
    fn undefined_placeholder_is_fatal() {
        let mut schema = SchemaGraph::new();
        schema.declare("Later").unwrap();
        assert!(matches!(
            compile(&schema),
            Err(SchemaDirectiveError::Core(CoreError::UndefinedType { .. }))
        ));
    }

    #[test]
    fn introspection_types_are_skipped() {
        let mut schema = SchemaGraph::new();
        schema
            .register_named(NamedType::new(
                "__Type",
                TypeKind::Object(ObjectDef::new().field(
                    "fields",
                    FieldDef::new(TypeRef::named(TypeId::STRING)).argument(
                        "includeDeprecated",
                        InputValueDef::new(TypeRef::named(TypeId::BOOLEAN))
                            .directive(DirectiveNode::new("numberValue")),
                    ),
                )),
            ))
            .unwrap();
        assert!(compile(&schema).unwrap().is_empty());
    }
}
