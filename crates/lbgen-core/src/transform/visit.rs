//! Mutable traversal over every schema-bearing node of a [`Document`].
//!
//! Implementors override the hooks they care about; the `walk_*` functions
//! drive the recursion and can be called from an override to keep descending.

use serde_json::Value;

use crate::parse::Extensions;
use crate::parse::components::Components;
use crate::parse::content::{
    MediaType, Parameter, ParameterOrRef, RequestBodyOrRef, Response, ResponseOrRef,
};
use crate::parse::operation::{Operation, PathItem};
use crate::parse::schema::{AdditionalProperties, Reference, Schema, SchemaOrRef};
use crate::parse::spec::Document;

pub trait VisitMut {
    /// Called for every `$ref` string, typed or found inside raw values.
    fn visit_ref(&mut self, _ref_path: &mut String) {}

    fn visit_schema(&mut self, schema: &mut Schema) {
        walk_schema(self, schema);
    }

    fn visit_value(&mut self, value: &mut Value) {
        walk_value(self, value);
    }
}

pub fn walk_document<V: VisitMut + ?Sized>(v: &mut V, document: &mut Document) {
    for item in document.paths.values_mut() {
        walk_path_item(v, item);
    }
    if let Some(ref mut components) = document.components {
        walk_components(v, components);
    }
    walk_extensions(v, &mut document.extensions);
}

pub fn walk_components<V: VisitMut + ?Sized>(v: &mut V, components: &mut Components) {
    for schema in components.schemas.values_mut() {
        walk_schema_or_ref(v, schema);
    }
    for response in components.responses.values_mut() {
        walk_response_or_ref(v, response);
    }
    for parameter in components.parameters.values_mut() {
        walk_parameter_or_ref(v, parameter);
    }
    for body in components.request_bodies.values_mut() {
        match body {
            RequestBodyOrRef::Ref(r) => walk_reference(v, r),
            RequestBodyOrRef::RequestBody(b) => {
                walk_content(v, &mut b.content);
                walk_extensions(v, &mut b.extensions);
            }
        }
    }
    walk_extensions(v, &mut components.extensions);
}

pub fn walk_path_item<V: VisitMut + ?Sized>(v: &mut V, item: &mut PathItem) {
    if let Some(ref mut r) = item.ref_path {
        v.visit_ref(r);
    }
    for op in item.operations.values_mut() {
        walk_operation(v, op);
    }
    for parameter in &mut item.parameters {
        walk_parameter_or_ref(v, parameter);
    }
    walk_extensions(v, &mut item.extensions);
}

pub fn walk_operation<V: VisitMut + ?Sized>(v: &mut V, op: &mut Operation) {
    for parameter in &mut op.parameters {
        walk_parameter_or_ref(v, parameter);
    }
    match op.request_body {
        Some(RequestBodyOrRef::Ref(ref mut r)) => walk_reference(v, r),
        Some(RequestBodyOrRef::RequestBody(ref mut b)) => {
            walk_content(v, &mut b.content);
            walk_extensions(v, &mut b.extensions);
        }
        None => {}
    }
    for response in op.responses.values_mut() {
        walk_response_or_ref(v, response);
    }
    walk_extensions(v, &mut op.extensions);
}

pub fn walk_schema_or_ref<V: VisitMut + ?Sized>(v: &mut V, schema: &mut SchemaOrRef) {
    match schema {
        SchemaOrRef::Ref(r) => walk_reference(v, r),
        SchemaOrRef::Schema(s) => v.visit_schema(s),
        SchemaOrRef::Bool(_) => {}
    }
}

pub fn walk_schema<V: VisitMut + ?Sized>(v: &mut V, schema: &mut Schema) {
    for prop in schema.properties.values_mut() {
        walk_schema_or_ref(v, prop);
    }
    if let Some(AdditionalProperties::Schema(ref mut s)) = schema.additional_properties {
        walk_schema_or_ref(v, s);
    }
    if let Some(ref mut items) = schema.items {
        walk_schema_or_ref(v, items);
    }
    for s in schema
        .all_of
        .iter_mut()
        .chain(schema.one_of.iter_mut())
        .chain(schema.any_of.iter_mut())
    {
        walk_schema_or_ref(v, s);
    }
    if let Some(ref mut not) = schema.not {
        walk_schema_or_ref(v, not);
    }
    walk_extensions(v, &mut schema.extensions);
}

/// Descend into a raw JSON value, reporting any `"$ref": "<string>"` pair.
pub fn walk_value<V: VisitMut + ?Sized>(v: &mut V, value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if key == "$ref"
                    && let Value::String(s) = inner
                {
                    v.visit_ref(s);
                    continue;
                }
                v.visit_value(inner);
            }
        }
        Value::Array(items) => {
            for inner in items {
                v.visit_value(inner);
            }
        }
        _ => {}
    }
}

fn walk_reference<V: VisitMut + ?Sized>(v: &mut V, reference: &mut Reference) {
    v.visit_ref(&mut reference.ref_path);
    walk_extensions(v, &mut reference.siblings);
}

fn walk_parameter_or_ref<V: VisitMut + ?Sized>(v: &mut V, parameter: &mut ParameterOrRef) {
    match parameter {
        ParameterOrRef::Ref(r) => walk_reference(v, r),
        ParameterOrRef::Parameter(p) => walk_parameter(v, p),
    }
}

fn walk_parameter<V: VisitMut + ?Sized>(v: &mut V, parameter: &mut Parameter) {
    if let Some(ref mut s) = parameter.schema {
        walk_schema_or_ref(v, s);
    }
    walk_content(v, &mut parameter.content);
    walk_extensions(v, &mut parameter.extensions);
}

fn walk_response_or_ref<V: VisitMut + ?Sized>(v: &mut V, response: &mut ResponseOrRef) {
    match response {
        ResponseOrRef::Ref(r) => walk_reference(v, r),
        ResponseOrRef::Response(r) => walk_response(v, r),
    }
}

fn walk_response<V: VisitMut + ?Sized>(v: &mut V, response: &mut Response) {
    walk_content(v, &mut response.content);
    walk_extensions(v, &mut response.extensions);
}

fn walk_content<V: VisitMut + ?Sized>(
    v: &mut V,
    content: &mut indexmap::IndexMap<String, MediaType>,
) {
    for media in content.values_mut() {
        if let Some(ref mut s) = media.schema {
            walk_schema_or_ref(v, s);
        }
        walk_extensions(v, &mut media.extensions);
    }
}

fn walk_extensions<V: VisitMut + ?Sized>(v: &mut V, extensions: &mut Extensions) {
    for value in extensions.values_mut() {
        v.visit_value(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[derive(Default)]
    struct RefCollector(Vec<String>);

    impl VisitMut for RefCollector {
        fn visit_ref(&mut self, ref_path: &mut String) {
            self.0.push(ref_path.clone());
        }
    }

    #[test]
    fn finds_refs_in_typed_and_raw_positions() {
        let yaml = r##"
openapi: 3.0.0
info: {title: T, version: "1"}
paths:
  /pets:
    get:
      parameters:
        - $ref: "#/components/parameters/Limit"
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: {$ref: "#/components/schemas/Pet"}
components:
  schemas:
    Pet:
      type: object
      properties:
        owner: {$ref: "#/components/schemas/Owner"}
      x-extra:
        nested: {$ref: "#/components/schemas/Tag"}
    Owner: {type: object}
    Tag: {type: object}
  parameters:
    Limit: {name: limit, in: query, schema: {type: integer}}
"##;
        let mut doc = parse::from_yaml(yaml).unwrap();
        let mut collector = RefCollector::default();
        walk_document(&mut collector, &mut doc);
        assert_eq!(
            collector.0,
            vec![
                "#/components/parameters/Limit",
                "#/components/schemas/Pet",
                "#/components/schemas/Owner",
                "#/components/schemas/Tag",
            ]
        );
    }
}
