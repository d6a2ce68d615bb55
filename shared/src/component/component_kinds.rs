use std::{any::TypeId, collections::HashMap};

use crate::component::{diff_mask::MAX_FIELDS, replicate::Replicate};

use super::error::ComponentError;

/// Process-stable identifier of a replicated component type
#[derive(Eq, Hash, Copy, Clone, PartialEq, Debug)]
pub struct ComponentKind(TypeId);

impl ComponentKind {
    pub fn of<C: Replicate + 'static>() -> Self {
        Self(TypeId::of::<C>())
    }
}

/// One replicated field in a component's flattened declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub type_name: &'static str,
}

impl FieldSchema {
    pub fn new(name: &'static str, type_name: &'static str) -> Self {
        Self { name, type_name }
    }
}

/// Flattened field list of a component's whole inheritance chain.
///
/// Built once at registration by walking segments base-to-derived, so that
/// base-segment fields occupy the low dirty-mask bits and derived segments
/// continue numbering where their base left off. The field at position *i*
/// owns dirty bit *i*.
#[derive(Debug, Clone)]
pub struct ComponentSchema {
    fields: Vec<FieldSchema>,
}

impl ComponentSchema {
    /// Flattens `segments` (ordered base-to-derived) into a single field
    /// list, rejecting chains that exceed the dirty-mask width.
    pub fn flatten(
        type_name: &'static str,
        segments: &[&[FieldSchema]],
    ) -> Result<Self, ComponentError> {
        let mut fields = Vec::new();
        for segment in segments {
            fields.extend_from_slice(segment);
        }
        if fields.len() > MAX_FIELDS {
            return Err(ComponentError::TooManyFields {
                type_name,
                count: fields.len(),
            });
        }
        Ok(Self { fields })
    }

    pub fn field_count(&self) -> u8 {
        self.fields.len() as u8
    }

    pub fn field(&self, index: u8) -> Option<&FieldSchema> {
        self.fields.get(index as usize)
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
}

struct ComponentData {
    net_id: u16,
    name: &'static str,
    schema: ComponentSchema,
    maker: Box<dyn Fn() -> Box<dyn Replicate>>,
}

/// Registry of every replicated component type in the protocol.
///
/// Maps each [`ComponentKind`] to a small wire id (registration order, so it
/// is identical on every peer that registers the same protocol), its
/// flattened schema, and a constructor used to instantiate incoming
/// components on the remote side.
pub struct ComponentKinds {
    kind_map: HashMap<ComponentKind, ComponentData>,
    net_id_map: HashMap<u16, ComponentKind>,
    current_net_id: u16,
}

impl ComponentKinds {
    pub fn new() -> Self {
        Self {
            kind_map: HashMap::new(),
            net_id_map: HashMap::new(),
            current_net_id: 0,
        }
    }

    pub fn add_component<C: Replicate + Default + 'static>(
        &mut self,
        name: &'static str,
        schema: ComponentSchema,
    ) -> Result<ComponentKind, ComponentError> {
        let kind = ComponentKind::of::<C>();
        if self.kind_map.contains_key(&kind) {
            return Err(ComponentError::DuplicateComponent { type_name: name });
        }

        let net_id = self.current_net_id;
        self.current_net_id += 1;

        self.kind_map.insert(
            kind,
            ComponentData {
                net_id,
                name,
                schema,
                maker: Box::new(|| Box::new(C::default())),
            },
        );
        self.net_id_map.insert(net_id, kind);

        Ok(kind)
    }

    pub fn kind_to_net_id(&self, kind: &ComponentKind) -> Result<u16, ComponentError> {
        self.kind_map
            .get(kind)
            .map(|data| data.net_id)
            .ok_or(ComponentError::UnknownKind)
    }

    pub fn net_id_to_kind(&self, net_id: u16) -> Result<ComponentKind, ComponentError> {
        self.net_id_map
            .get(&net_id)
            .copied()
            .ok_or(ComponentError::UnknownNetId { net_id })
    }

    pub fn kind_to_name(&self, kind: &ComponentKind) -> Result<&'static str, ComponentError> {
        self.kind_map
            .get(kind)
            .map(|data| data.name)
            .ok_or(ComponentError::UnknownKind)
    }

    pub fn schema(&self, kind: &ComponentKind) -> Result<&ComponentSchema, ComponentError> {
        self.kind_map
            .get(kind)
            .map(|data| &data.schema)
            .ok_or(ComponentError::UnknownKind)
    }

    /// Instantiates a default-valued component of the given kind, used by
    /// the remote side before reading full state into it
    pub fn make(&self, kind: &ComponentKind) -> Result<Box<dyn Replicate>, ComponentError> {
        self.kind_map
            .get(kind)
            .map(|data| (data.maker)())
            .ok_or(ComponentError::UnknownKind)
    }
}

impl Default for ComponentKinds {
    fn default() -> Self {
        Self::new()
    }
}
